//! Conversion between cell ordinals and per-axis coordinates.
//!
//! Axis 0 varies fastest. For axis lengths `L`, the weight of axis `i` is
//! `E[0] = 1`, `E[i] = L[0] * ... * L[i-1]` and
//! `ordinal = sum(coordinate[i] * E[i])`.
//!
//! ```rust
//! use xmla_executor::{coordinates_to_ordinal, ordinal_to_coordinates};
//!
//! let lengths = [3, 2];
//! let coords = ordinal_to_coordinates(4, &lengths).unwrap();
//! assert_eq!(coords, vec![1, 1]);
//! assert_eq!(coordinates_to_ordinal(&coords, &lengths).unwrap(), 4);
//! ```

use crate::error::{XmlaError, XmlaResult};

/// Number of cells in a hyper-rectangle with the given axis lengths.
///
/// Zero axes describe a single cell.
pub fn cell_count(axis_lengths: &[usize]) -> XmlaResult<usize> {
    axis_lengths.iter().try_fold(1usize, |acc, &len| {
        acc.checked_mul(len).ok_or_else(|| {
            XmlaError::InvalidCoordinate(format!("axis lengths {:?} overflow", axis_lengths))
        })
    })
}

/// Splits a cell ordinal into one coordinate per axis.
pub fn ordinal_to_coordinates(ordinal: usize, axis_lengths: &[usize]) -> XmlaResult<Vec<usize>> {
    let total = cell_count(axis_lengths)?;
    if ordinal >= total {
        return Err(XmlaError::InvalidCoordinate(format!(
            "ordinal {} out of range for {} cells",
            ordinal, total
        )));
    }

    let mut remainder = ordinal;
    let coordinates = axis_lengths
        .iter()
        .map(|&len| {
            let c = remainder % len;
            remainder /= len;
            c
        })
        .collect();
    Ok(coordinates)
}

/// Weighted sum of a coordinate vector; the inverse of
/// [`ordinal_to_coordinates`].
pub fn coordinates_to_ordinal(coordinates: &[usize], axis_lengths: &[usize]) -> XmlaResult<usize> {
    if coordinates.len() != axis_lengths.len() {
        return Err(XmlaError::InvalidCoordinate(format!(
            "expected {} coordinates, got {}",
            axis_lengths.len(),
            coordinates.len()
        )));
    }

    let mut ordinal = 0usize;
    let mut weight = 1usize;
    for (axis, (&c, &len)) in coordinates.iter().zip(axis_lengths).enumerate() {
        if c >= len {
            return Err(XmlaError::InvalidCoordinate(format!(
                "coordinate {} on axis {} out of range 0..{}",
                c, axis, len
            )));
        }
        ordinal += c * weight;
        weight = weight.saturating_mul(len);
    }
    Ok(ordinal)
}

// =============================================================================
// Enumeration
// =============================================================================

/// Which axis advances first when enumerating a [`CoordinateSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endianness {
    /// Axis 0 advances first; yields ordinals in ascending order.
    #[default]
    Little,
    /// The last axis advances first.
    Big,
}

/// A hyper-rectangle of coordinates.
///
/// Dimensions come straight from server metadata, so zero or negative
/// lengths are accepted and describe an empty space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateSpace {
    dimensions: Vec<usize>,
    empty: bool,
    order: Endianness,
}

impl CoordinateSpace {
    /// Creates a space over `dimensions`, enumerated in `order`.
    pub fn new(dimensions: &[i64], order: Endianness) -> Self {
        let empty = dimensions.iter().any(|&d| d <= 0);
        Self {
            dimensions: dimensions
                .iter()
                .map(|&d| usize::try_from(d).unwrap_or(0))
                .collect(),
            empty,
            order,
        }
    }

    /// Number of axes.
    pub fn arity(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of points; 0 when any dimension is non-positive.
    pub fn len(&self) -> usize {
        if self.empty {
            return 0;
        }
        self.dimensions
            .iter()
            .fold(1usize, |acc, &d| acc.saturating_mul(d))
    }

    /// Returns true if the space has no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh iterator over every point. Each call starts over.
    pub fn iter(&self) -> Coordinates<'_> {
        let next = if self.empty {
            None
        } else {
            Some(vec![0; self.dimensions.len()])
        };
        Coordinates {
            space: self,
            next,
            remaining: self.len(),
        }
    }
}

impl<'a> IntoIterator for &'a CoordinateSpace {
    type Item = Vec<usize>;
    type IntoIter = Coordinates<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the points of a [`CoordinateSpace`].
#[derive(Debug, Clone)]
pub struct Coordinates<'a> {
    space: &'a CoordinateSpace,
    next: Option<Vec<usize>>,
    remaining: usize,
}

impl Coordinates<'_> {
    fn advance(&self, current: &[usize]) -> Option<Vec<usize>> {
        let mut next = current.to_vec();
        let dims = &self.space.dimensions;
        let axes: Box<dyn Iterator<Item = usize>> = match self.space.order {
            Endianness::Little => Box::new(0..dims.len()),
            Endianness::Big => Box::new((0..dims.len()).rev()),
        };
        for axis in axes {
            next[axis] += 1;
            if next[axis] < dims[axis] {
                return Some(next);
            }
            next[axis] = 0;
        }
        // Carried past the last axis: enumeration is complete.
        None
    }
}

impl Iterator for Coordinates<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        self.next = self.advance(&current);
        self.remaining = self.remaining.saturating_sub(1);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.next.is_none() {
            (0, Some(0))
        } else {
            (self.remaining, Some(self.remaining))
        }
    }
}

/// Enumerates every point of the hyper-rectangle `dimensions`.
///
/// Collects eagerly; use [`CoordinateSpace::iter`] for lazy iteration.
pub fn enumerate(dimensions: &[i64], order: Endianness) -> Vec<Vec<usize>> {
    CoordinateSpace::new(dimensions, order).iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Bijection
    // =========================================================================

    #[test]
    fn test_axis_zero_is_fastest() {
        let lengths = [3, 2];
        assert_eq!(ordinal_to_coordinates(0, &lengths).unwrap(), vec![0, 0]);
        assert_eq!(ordinal_to_coordinates(1, &lengths).unwrap(), vec![1, 0]);
        assert_eq!(ordinal_to_coordinates(3, &lengths).unwrap(), vec![0, 1]);
        assert_eq!(ordinal_to_coordinates(5, &lengths).unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_coordinates_to_ordinal_weights() {
        let lengths = [4, 3, 2];
        assert_eq!(coordinates_to_ordinal(&[1, 2, 1], &lengths).unwrap(), 1 + 2 * 4 + 12);
    }

    #[test]
    fn test_zero_axes_single_cell() {
        assert_eq!(ordinal_to_coordinates(0, &[]).unwrap(), Vec::<usize>::new());
        assert_eq!(coordinates_to_ordinal(&[], &[]).unwrap(), 0);
        assert!(ordinal_to_coordinates(1, &[]).is_err());
    }

    #[test]
    fn test_ordinal_out_of_range() {
        let err = ordinal_to_coordinates(6, &[3, 2]).unwrap_err();
        assert!(matches!(err, XmlaError::InvalidCoordinate(_)));
    }

    #[test]
    fn test_coordinate_out_of_range() {
        let err = coordinates_to_ordinal(&[0, 2], &[3, 2]).unwrap_err();
        assert!(matches!(err, XmlaError::InvalidCoordinate(_)));
    }

    #[test]
    fn test_coordinate_arity_mismatch() {
        let err = coordinates_to_ordinal(&[0], &[3, 2]).unwrap_err();
        assert!(matches!(err, XmlaError::InvalidCoordinate(_)));
    }

    #[test]
    fn test_empty_axis_has_no_cells() {
        assert_eq!(cell_count(&[3, 0]).unwrap(), 0);
        assert!(ordinal_to_coordinates(0, &[3, 0]).is_err());
    }

    #[test]
    fn test_cell_count_overflow() {
        assert!(cell_count(&[usize::MAX, 2]).is_err());
    }

    // =========================================================================
    // Enumeration
    // =========================================================================

    #[test]
    fn test_enumerate_little_endian() {
        let points = enumerate(&[2, 2], Endianness::Little);
        assert_eq!(points, vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]);
    }

    #[test]
    fn test_enumerate_big_endian() {
        let points = enumerate(&[2, 2], Endianness::Big);
        assert_eq!(points, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn test_little_endian_matches_ordinals() {
        let lengths = [3usize, 4, 2];
        let space = CoordinateSpace::new(&[3, 4, 2], Endianness::Little);
        for (ordinal, coords) in space.iter().enumerate() {
            assert_eq!(coordinates_to_ordinal(&coords, &lengths).unwrap(), ordinal);
        }
        assert_eq!(space.len(), 24);
    }

    #[test]
    fn test_zero_axes_yield_one_empty_vector() {
        let points = enumerate(&[], Endianness::Little);
        assert_eq!(points, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_zero_or_negative_dimension_is_empty() {
        assert!(enumerate(&[3, 0, 2], Endianness::Little).is_empty());
        assert!(enumerate(&[-1], Endianness::Big).is_empty());
        let space = CoordinateSpace::new(&[4, -2], Endianness::Little);
        assert_eq!(space.len(), 0);
        assert!(space.is_empty());
    }

    #[test]
    fn test_space_is_restartable() {
        let space = CoordinateSpace::new(&[2, 3], Endianness::Little);
        let first: Vec<_> = space.iter().collect();
        let second: Vec<_> = (&space).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn test_size_hint_counts_down() {
        let space = CoordinateSpace::new(&[2, 2], Endianness::Big);
        let mut iter = space.iter();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        iter.next();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        iter.by_ref().for_each(drop);
        assert_eq!(iter.size_hint(), (0, Some(0)));
    }
}
