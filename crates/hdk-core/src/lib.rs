//! # hdk-core
//!
//! Core types shared by the Houdini image plugins and their host.
//!
//! - [`ImageSpec`] - Per-subimage description: resolution, channels, metadata
//! - [`AttrValue`] - Typed metadata value
//! - [`DataFormat`] - Runtime pixel data type
//!
//! ## Crate Structure
//!
//! ```text
//! hdk-core (this crate)
//!    ^
//!    |
//!    +-- hdk-io (pic/rat reader plugins)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod format;
pub mod spec;

pub use format::DataFormat;
pub use spec::{AttrValue, ImageSpec};
