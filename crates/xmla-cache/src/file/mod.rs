//! Flat-file response store.
//!
//! The input file is read once into an index when the backend opens; new
//! pairs are appended to the output file as encoded [`Record`] lines. A
//! backend without an output file is read-only.

pub mod record;

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::backend::CacheBackend;
use crate::config::FileSettings;
use crate::error::{CacheError, CacheResult};

pub use record::Record;

struct Output {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Record file backend.
///
/// # Example
///
/// ```ignore
/// use xmla_cache::{FileBackend, FileSettings};
///
/// let settings = FileSettings {
///     input: Some("capture.txt".into()),
///     output: Some("capture.txt".into()),
/// };
/// let backend = FileBackend::open(&settings, false)?;
/// ```
pub struct FileBackend {
    index: RwLock<HashMap<(String, Vec<u8>), Vec<u8>>>,
    output: Option<Mutex<Output>>,
}

impl FileBackend {
    /// Opens the backend.
    ///
    /// With `init`, the output file is truncated first. A missing input
    /// file is treated as empty.
    pub fn open(settings: &FileSettings, init: bool) -> CacheResult<Self> {
        let output = match &settings.output {
            Some(path) => Some(Mutex::new(open_output(path, init)?)),
            None => None,
        };

        let mut index = HashMap::new();
        if let Some(path) = &settings.input {
            load(path, &mut index)?;
        }

        Ok(Self {
            index: RwLock::new(index),
            output,
        })
    }

    /// Number of indexed pairs.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the backend has no output file.
    pub fn is_read_only(&self) -> bool {
        self.output.is_none()
    }
}

impl CacheBackend for FileBackend {
    fn lookup(&self, url: &str, key: &[u8]) -> CacheResult<Option<Vec<u8>>> {
        Ok(self
            .index
            .read()
            .get(&(url.to_string(), key.to_vec()))
            .cloned())
    }

    fn store(&self, url: &str, key: &[u8], response: &[u8]) -> CacheResult<()> {
        let output = self.output.as_ref().ok_or_else(|| {
            CacheError::Unsupported("file cache has no output file and cannot record".to_string())
        })?;

        let line = Record::new(url, key, response).encode();
        // The index is updated under the output lock so it agrees with file order.
        let mut output = output.lock();
        let Output { path, writer } = &mut *output;
        writeln!(writer, "{}", line).map_err(|e| CacheError::io_error(path.as_path(), e))?;
        self.index
            .write()
            .insert((url.to_string(), key.to_vec()), response.to_vec());
        Ok(())
    }

    fn flush(&self) -> CacheResult<()> {
        if let Some(output) = &self.output {
            let mut output = output.lock();
            let Output { path, writer } = &mut *output;
            writer
                .flush()
                .map_err(|e| CacheError::io_error(path.as_path(), e))?;
        }
        Ok(())
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Err(e) = CacheBackend::flush(self) {
            warn!(target: "xmla::cache", error = %e, "failed to flush cache file");
        }
    }
}

fn open_output(path: &Path, init: bool) -> CacheResult<Output> {
    let mut options = OpenOptions::new();
    if init {
        options.write(true).create(true).truncate(true);
    } else {
        options.append(true).create(true);
    }
    let file = options
        .open(path)
        .map_err(|e| CacheError::io_error(path, e))?;
    debug!(target: "xmla::cache", path = %path.display(), truncated = init, "cache output opened");
    Ok(Output {
        path: path.to_path_buf(),
        writer: BufWriter::new(file),
    })
}

fn load(path: &Path, index: &mut HashMap<(String, Vec<u8>), Vec<u8>>) -> CacheResult<()> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(target: "xmla::cache", path = %path.display(), "cache input missing, starting empty");
            return Ok(());
        }
        Err(e) => return Err(CacheError::io_error(path, e)),
    };

    let mut loaded = 0usize;
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| CacheError::io_error(path, e))?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let record = Record::decode(line)
            .map_err(|message| CacheError::format_error(path, number + 1, message))?;
        // Later records win.
        index.insert((record.url, record.key), record.response);
        loaded += 1;
    }
    debug!(target: "xmla::cache", path = %path.display(), records = loaded, "cache input loaded");
    Ok(())
}
