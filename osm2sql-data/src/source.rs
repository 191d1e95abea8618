//! Forward-only byte stream decoded on the fly from a bzip2 archive.
#![forbid(unsafe_code)]

use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader, Read},
};

use bzip2::read::MultiBzDecoder;
use camino::{Utf8Path, Utf8PathBuf};
use log::warn;
use thiserror::Error;

/// Buffer size between the decoder and the XML reader.
const DECODED_BUFFER_BYTES: usize = 64 * 1024;

/// Errors raised while opening an archive.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The input path does not name a regular file.
    #[error("input {path:?} does not exist or is not a file")]
    NotAFile { path: Utf8PathBuf },
    /// Opening or inspecting the input failed.
    #[error("failed to open input {path:?}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Decompressed view over a bzip2 archive.
///
/// Concatenated bzip2 streams (as written by parallel compressors) are
/// decoded back to back. Decoder failures surface as `io::Error`s from
/// `read`, which the walker reports as decompression errors.
pub struct DecompressionSource<R: Read> {
    inner: BufReader<MultiBzDecoder<R>>,
}

impl DecompressionSource<BufReader<File>> {
    /// Open the archive at `path`.
    pub fn open(path: &Utf8Path) -> Result<Self, SourceError> {
        let is_file = osm2sql_fs::is_regular_file(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if !is_file {
            return Err(SourceError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        if !is_bz2(path) {
            warn!("input {path} has no .bz2 extension; decoding it as bzip2 anyway");
        }
        let file = osm2sql_fs::open_file(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: Read> DecompressionSource<R> {
    /// Decode bzip2 data read from `compressed`.
    pub fn from_reader(compressed: R) -> Self {
        Self {
            inner: BufReader::with_capacity(DECODED_BUFFER_BYTES, MultiBzDecoder::new(compressed)),
        }
    }
}

impl<R: Read> fmt::Debug for DecompressionSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecompressionSource")
            .field("buffered", &self.inner.buffer().len())
            .finish_non_exhaustive()
    }
}

impl<R: Read> Read for DecompressionSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BufRead for DecompressionSource<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amount: usize) {
        self.inner.consume(amount);
    }
}

/// Whether `path` carries a `.bz2` extension, ignoring case.
pub fn is_bz2(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("bz2"))
}
