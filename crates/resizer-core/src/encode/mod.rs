//! Output encoding for exported crops.
//!
//! All operations are synchronous. Exports are written as PNG.

mod png;

pub use png::{encode_png, write_png, EncodeError};
