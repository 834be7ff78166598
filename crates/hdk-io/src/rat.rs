//! Legacy rat reader.
//!
//! The older plugin only registered the `rat` extension and never touched the
//! tile interface or file options. It shares plane derivation with
//! [`HoudiniInput`]; batch and tiled reads report
//! [`IoError::UnsupportedOperation`](crate::IoError::UnsupportedOperation).

use crate::houdini::{HoudiniInput, Variant};
use crate::img::ImgLibrary;
use crate::{ImageInput, IoResult};
use hdk_core::ImageSpec;
use std::path::Path;
use std::sync::Arc;

/// Scanline-only reader for `.rat` files.
#[derive(Debug)]
pub struct RatInput {
    inner: HoudiniInput,
}

impl RatInput {
    /// Creates a closed reader backed by `library`.
    pub fn new(library: Arc<dyn ImgLibrary>) -> Self {
        Self {
            inner: HoudiniInput::with_variant(library, Variant::LegacyRat),
        }
    }

    /// Number of subimages (planes) in the open file, 0 when closed.
    pub fn num_subimages(&self) -> usize {
        self.inner.num_subimages()
    }

    /// Returns and clears the message of the last failed operation.
    pub fn geterror(&mut self) -> Option<String> {
        self.inner.geterror()
    }
}

impl ImageInput for RatInput {
    fn format_name(&self) -> &'static str {
        self.inner.format_name()
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.inner.extensions()
    }

    fn check_file(&self, path: &Path) -> IoResult<()> {
        self.inner.check_file(path)
    }

    fn open(&mut self, path: &Path) -> IoResult<ImageSpec> {
        self.inner.open(path)
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn current_subimage(&self) -> Option<usize> {
        self.inner.current_subimage()
    }

    fn current_miplevel(&self) -> Option<usize> {
        self.inner.current_miplevel()
    }

    fn spec(&self) -> Option<&ImageSpec> {
        self.inner.spec()
    }

    fn seek_subimage(&mut self, subimage: usize, miplevel: usize) -> IoResult<ImageSpec> {
        self.inner.seek_subimage(subimage, miplevel)
    }

    fn read_native_scanline(&mut self, y: usize, z: usize, buf: &mut [u8]) -> IoResult<()> {
        self.inner.read_native_scanline(y, z, buf)
    }
}
