//! Resizer Core - batch fixed-aspect cropping
//!
//! This crate provides the model behind the resizer tool: crop viewport
//! geometry, export of a crop into a fixed-size PNG, crop tabs, the folder
//! session that steps through a directory of images, and the persisted
//! configuration.
//!
//! Nothing here touches a rendering surface. A presentation layer feeds in
//! container sizes and pointer events and reads back plain geometry values.

pub mod config;
pub mod decode;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod scan;
pub mod session;
pub mod tab;
pub mod viewport;

pub use config::{Config, ConfigError, ConfigStore};
pub use decode::{DecodeError, DecodedImage};
pub use export::{export_crop, ExportError, ExportOptions, ExportOutcome};
pub use geometry::{Point, Rect, Size};
pub use session::{ItemStatus, Session, SessionError};
pub use tab::{CropTab, PointerButton, TabSet};
pub use viewport::{Viewport, ViewportSettings, ViewportSnapshot};
