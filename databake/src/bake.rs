//! Reading, compressing and selecting the buffer to emit.
use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::Path,
};

use flate2::{Compression, write::ZlibEncoder};

//
// ==================== PUBLIC BUILDER API ====================
//

/// The zlib level used when none is given. This is the maximum effort level.
pub const DEFAULT_LEVEL: u32 = 9;

/// Largest compressed/original size ratio for which compression is kept.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Inputs larger than this are rejected unless the limit is raised.
pub const DEFAULT_MAX_INPUT_LEN: u64 = 64 * 1024 * 1024;

/// A builder for the baking policy.
///
/// Compression is off by default, so a plain `Config::new()` emits every file
/// verbatim as a `UTIL_FILE` entry.
///
/// # Example
/// ```no_run
/// let baked = databake::Config::new()
///     .compress(true)
///     .bake("assets/font.png", Some("font.png"))
///     .expect("Failed to bake asset");
/// print!("{baked}");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    compress: bool,
    level: u32,
    threshold: f64,
    max_input_len: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates a configuration with compression disabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            compress: false,
            level: DEFAULT_LEVEL,
            threshold: DEFAULT_THRESHOLD,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }

    /// Enables or disables the compression policy.
    ///
    /// When enabled, the zlib form of the input is emitted as a
    /// `UTIL_COMPRESSED_FILE` entry if it is small enough compared to the
    /// original, see [`Config::threshold`].
    #[must_use]
    pub const fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Sets the zlib compression level (0-9). Larger values are clamped to 9.
    #[must_use]
    pub fn level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Sets the largest compressed/original ratio that still counts as worth
    /// compressing. Defaults to [`DEFAULT_THRESHOLD`]. A negative or NaN
    /// ratio never compresses.
    #[must_use]
    pub const fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the maximum number of bytes read from an input file.
    #[must_use]
    pub const fn max_input_len(mut self, max_input_len: u64) -> Self {
        self.max_input_len = max_input_len;
        self
    }

    /// Reads `path` and produces the buffer to emit.
    ///
    /// The entry is registered under `name`, or under the path as given when
    /// `name` is `None` or empty.
    ///
    /// # Errors
    /// Returns an [`Error`] if the input cannot be read, is a directory, is
    /// larger than [`Config::max_input_len`], or fails to compress. Falling
    /// back to a path that is not valid UTF-8 gives [`Error::NonUtf8Path`].
    pub fn bake(&self, path: impl AsRef<Path>, name: Option<&str>) -> Result<Baked> {
        let path = path.as_ref();
        let name = match name {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => path
                .to_str()
                .ok_or_else(|| Error::NonUtf8Path(path.display().to_string()))?
                .to_owned(),
        };
        let content = read_input(path, self.max_input_len)?;
        self.bake_bytes(name, content)
    }

    /// Applies the compression policy to an in-memory buffer.
    ///
    /// # Errors
    /// Returns [`Error::Compress`] if the zlib encoder fails.
    pub fn bake_bytes(&self, name: impl Into<String>, content: Vec<u8>) -> Result<Baked> {
        let name = name.into();
        if !self.compress || content.is_empty() {
            return Ok(Baked::raw(name, content));
        }

        let packed = compress(&content, self.level).map_err(Error::Compress)?;
        let keep = self.should_compress(content.len(), packed.len());
        log::debug!(
            "{name}: {} bytes, zlib level {} gives {} bytes, {}",
            content.len(),
            self.level,
            packed.len(),
            if keep { "compressing" } else { "storing raw" }
        );

        Ok(if keep {
            Baked {
                name,
                compressed: true,
                data: packed,
            }
        } else {
            Baked::raw(name, content)
        })
    }

    /// Whether a buffer of `original_len` bytes that compresses to
    /// `compressed_len` bytes should be emitted compressed.
    #[must_use]
    pub fn should_compress(&self, original_len: usize, compressed_len: usize) -> bool {
        // Empty inputs have no meaningful ratio.
        self.compress
            && original_len > 0
            && (compressed_len as f64 / original_len as f64) <= self.threshold
    }
}

/// A file ready to be emitted. Its [`Display`](std::fmt::Display) output is the
/// complete code fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baked {
    pub(crate) name: String,
    pub(crate) compressed: bool,
    pub(crate) data: Vec<u8>,
}

impl Baked {
    const fn raw(name: String, data: Vec<u8>) -> Self {
        Self {
            name,
            compressed: false,
            data,
        }
    }

    /// The name the file is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`Baked::data`] holds a zlib stream.
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// The bytes that end up in the array.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Length of the emitted array, which is the compressed length when
    /// compressed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The runtime macro that registers this file.
    #[must_use]
    pub const fn macro_name(&self) -> &'static str {
        if self.compressed {
            "UTIL_COMPRESSED_FILE"
        } else {
            "UTIL_FILE"
        }
    }
}

/// A specialized `Result` type for baking operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur while baking a file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path '{0}' not found")]
    PathNotFound(String),
    #[error("Path '{0}' is a directory")]
    IsDirectory(String),
    #[error("Path '{0}' is not valid UTF-8; pass a name to register it under")]
    NonUtf8Path(String),
    #[error("Could not read '{path}'")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Path '{path}' is larger than the limit of {limit} bytes")]
    TooLarge { path: String, limit: u64 },
    #[error("Compression failed")]
    Compress(#[source] io::Error),
}

//
// ==================== INTERNALS ====================
//

/// Compresses `content` into a zlib stream, the format the runtime inflates.
///
/// # Errors
/// Propagates encoder errors.
pub fn compress(content: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(content)?;
    encoder.finish()
}

/// Reads a whole file, refusing anything longer than `limit` bytes.
///
/// Besides regular files this accepts anything that can be read to the end,
/// such as FIFOs and `/dev/stdin`.
///
/// # Errors
/// Returns an [`Error`] if `path` is missing, a directory, unreadable or too
/// large.
pub fn read_input(path: &Path, limit: u64) -> Result<Vec<u8>> {
    let io_error = |source: io::Error| Error::Io {
        path: path.display().to_string(),
        source,
    };

    let metadata = fs::metadata(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            Error::PathNotFound(path.display().to_string())
        } else {
            io_error(source)
        }
    })?;
    if metadata.is_dir() {
        return Err(Error::IsDirectory(path.display().to_string()));
    }
    let too_large = || Error::TooLarge {
        path: path.display().to_string(),
        limit,
    };
    // Only regular files report a meaningful length up front.
    let known_len = if metadata.is_file() { metadata.len() } else { 0 };
    if known_len > limit {
        return Err(too_large());
    }

    // Streams have no length and files may grow after the stat, so the read is bounded too.
    let file = File::open(path).map_err(io_error)?;
    let mut content = Vec::with_capacity(usize::try_from(known_len).unwrap_or(0));
    file.take(limit.saturating_add(1))
        .read_to_end(&mut content)
        .map_err(io_error)?;
    if content.len() as u64 > limit {
        return Err(too_large());
    }
    log::trace!("read {} bytes from {}", content.len(), path.display());

    Ok(content)
}
