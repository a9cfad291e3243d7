//! Property tests: formatting an identifier and parsing it back yields the
//! same segments, quoting and key grouping.

use proptest::prelude::*;
use xmla_ident::{
    format_member_list, format_tuple_list, parse_identifier, parse_member_list, parse_tuple_list,
    Identifier, NameSegment, Segment, Tuple,
};

fn quoted_part() -> impl Strategy<Value = NameSegment> {
    "[ -~]{1,12}".prop_map(NameSegment::quoted)
}

fn unquoted_part() -> impl Strategy<Value = NameSegment> {
    "[A-Za-z0-9_][A-Za-z0-9_ ]{0,8}[A-Za-z0-9_]"
        .prop_map(|s| NameSegment::unquoted(s))
}

fn name_part() -> impl Strategy<Value = NameSegment> {
    prop_oneof![quoted_part(), unquoted_part()]
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        3 => name_part().prop_map(Segment::Name),
        1 => prop::collection::vec(name_part(), 1..4).prop_map(Segment::Key),
    ]
}

fn identifier() -> impl Strategy<Value = Identifier> {
    prop::collection::vec(segment(), 1..6).prop_map(Identifier::new)
}

proptest! {
    #[test]
    fn identifier_round_trip(id in identifier()) {
        let text = id.to_string();
        let parsed = parse_identifier(&text).unwrap();
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn unique_name_round_trip_quotes_everything(id in identifier()) {
        let parsed = parse_identifier(&id.unique_name()).unwrap();
        prop_assert_eq!(parsed.len(), id.len());
        for (a, b) in parsed.segments.iter().zip(id.segments.iter()) {
            prop_assert_eq!(a.label(), b.label());
            prop_assert_eq!(a.is_key(), b.is_key());
        }
    }

    #[test]
    fn member_list_round_trip(ids in prop::collection::vec(identifier(), 0..5)) {
        let parsed = parse_member_list(&format_member_list(&ids)).unwrap();
        prop_assert_eq!(parsed, ids);
    }

    #[test]
    fn tuple_list_round_trip(
        tuples in prop::collection::vec(
            prop::collection::vec(identifier(), 2..4).prop_map(Tuple::new),
            0..4,
        )
    ) {
        let parsed = parse_tuple_list(&format_tuple_list(&tuples)).unwrap();
        prop_assert_eq!(parsed, tuples);
    }
}

#[test]
fn example_identifier_round_trip() {
    let id = parse_identifier("[Time].1997.[Q3]").unwrap();
    assert_eq!(
        id.segments,
        vec![
            Segment::quoted("Time"),
            Segment::unquoted("1997"),
            Segment::quoted("Q3"),
        ]
    );
    assert_eq!(id.to_string(), "[Time].1997.[Q3]");
}

#[test]
fn example_compound_key_round_trip() {
    let text = "[Customers].[City].&[SF]&CA&USA.&[cust1234]";
    let id = parse_identifier(text).unwrap();
    assert_eq!(id.to_string(), text);
}
