//! Bake binary files into C++ source for the static file runtime.
//!
//! Each input file becomes a translation unit holding a byte array and one
//! registration macro, so the final executable carries the asset instead of
//! reading it from disk.
//!
//! ```text
//! #include <util/staticfile.hpp>
//!
//! static const unsigned char data[]{
//! 137,80,78,71,13,10,26,10,0,0,0,13,73,72,68,82,
//! ...
//! };
//!
//! UTIL_FILE("assets/tiles.png", 1234, data);
//! ```
//!
//! ## Compression
//!
//! With [`Config::compress`] enabled, the file is deflated into a zlib stream
//! at the configured level. If the stream is at most [`DEFAULT_THRESHOLD`]
//! times the original size, it is emitted instead of the raw bytes and
//! registered with `UTIL_COMPRESSED_FILE`, which makes the runtime inflate it
//! on startup. The length in the registration is always the length of the
//! emitted array.
//!
//! ## Usage
//!
//! ```no_run
//! let baked = databake::Config::new()
//!     .compress(true)
//!     .bake("assets/tiles.png", None)
//!     .expect("Failed to bake asset");
//! baked.write_to(std::io::stdout().lock()).expect("Failed to write fragment");
//! ```

mod bake;
pub mod emit;

pub use bake::{
    Baked, Config, DEFAULT_LEVEL, DEFAULT_MAX_INPUT_LEN, DEFAULT_THRESHOLD, Error, Result,
    compress, read_input,
};
