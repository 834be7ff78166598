//! # hdk-io
//!
//! Houdini pic/rat reader plugins for a generic image I/O host.
//!
//! A pic or rat file holds any number of planes, each with its own data type,
//! component count and component names. The readers expose every plane as one
//! subimage with a fully described [`ImageSpec`] and serve its rows top-down.
//!
//! # Architecture
//!
//! - [`ImageInput`] - Host-facing reader trait
//! - [`HoudiniInput`] - pic/rat reader (scanline + tile handles, metadata)
//! - [`RatInput`] - Legacy scanline-only rat reader
//! - [`img`] - Contract of the underlying image library
//! - [`registry`] - Plugin lookup by name or extension
//! - [`memory`] - In-memory image library
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use hdk_io::img::{ImgDataType, ImgPlane};
//! use hdk_io::memory::{MemoryImage, MemoryLibrary};
//! use hdk_io::{HoudiniInput, ImageInput};
//!
//! let dir = std::env::temp_dir();
//! let path = dir.join("hdk_io_quick_start.pic");
//! std::fs::write(&path, b"").unwrap();
//!
//! let mut library = MemoryLibrary::new();
//! library.insert(
//!     &path,
//!     MemoryImage::new("PIC", 64, 32)
//!         .with_blank_plane(ImgPlane::new("C", ImgDataType::Float32, ["r", "g", "b"])),
//! );
//!
//! let mut input = HoudiniInput::new(Arc::new(library));
//! let spec = input.open(&path).unwrap();
//! assert_eq!(spec.channel_names, vec!["C.r", "C.g", "C.b"]);
//!
//! let mut row = vec![0u8; spec.bytes_per_row()];
//! input.read_native_scanline(0, 0, &mut row).unwrap();
//! # std::fs::remove_file(&path).ok();
//! ```
//!
//! # Dependencies
//!
//! - [`hdk-core`] - ImageSpec and pixel types
//! - [`glam`] - Matrix and vector option values
//! - [`half`] - Float16 planes in the memory library

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod traits;

pub mod houdini;
pub mod img;
pub mod memory;
pub mod metadata;
pub mod rat;
pub mod registry;

pub use error::{IoError, IoResult};
pub use houdini::HoudiniInput;
pub use rat::RatInput;
pub use traits::ImageInput;

pub use hdk_core::{AttrValue, DataFormat, ImageSpec};
