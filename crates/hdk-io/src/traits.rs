//! Host-facing reader interface.
//!
//! Every format plugin implements [`ImageInput`]. The host picks an
//! implementation by extension (see [`crate::registry`]), probes the file with
//! [`ImageInput::valid_file`], then opens it and pulls scanlines from whichever
//! subimage is selected.

use crate::{IoError, IoResult};
use hdk_core::ImageSpec;
use std::path::Path;

/// Trait for image format readers.
///
/// # Example
///
/// ```rust,ignore
/// use hdk_io::{HoudiniInput, ImageInput};
///
/// let mut input = HoudiniInput::new(library);
/// let spec = input.open("beauty.rat".as_ref())?;
/// let mut row = vec![0u8; spec.bytes_per_row()];
/// input.read_native_scanline(0, 0, &mut row)?;
/// ```
pub trait ImageInput {
    /// Human-readable format label.
    fn format_name(&self) -> &'static str;

    /// File extensions handled by this reader, without dots.
    fn extensions(&self) -> &'static [&'static str];

    /// Checks whether `path` is a file this reader can open.
    ///
    /// The error carries the diagnostic.
    fn check_file(&self, path: &Path) -> IoResult<()>;

    /// Boolean form of [`check_file`](Self::check_file).
    ///
    /// The diagnostic is dropped; hosts that report it call `check_file`
    /// instead. Nothing is recorded for `geterror`.
    fn valid_file(&self, path: &Path) -> bool {
        self.check_file(path).is_ok()
    }

    /// Opens `path` and selects subimage 0, returning its spec.
    fn open(&mut self, path: &Path) -> IoResult<ImageSpec>;

    /// Opens `path` with a configuration hint.
    ///
    /// Readers that recognize no configuration ignore it.
    fn open_with_config(&mut self, path: &Path, config: &ImageSpec) -> IoResult<ImageSpec> {
        let _ = config;
        self.open(path)
    }

    /// Releases the file. Safe to call when nothing is open.
    fn close(&mut self);

    /// Currently selected subimage.
    fn current_subimage(&self) -> Option<usize>;

    /// Currently selected mip level.
    fn current_miplevel(&self) -> Option<usize>;

    /// Spec of the current selection.
    fn spec(&self) -> Option<&ImageSpec>;

    /// Selects a subimage and mip level, returning its spec.
    ///
    /// On failure the previous selection stays in place.
    fn seek_subimage(&mut self, subimage: usize, miplevel: usize) -> IoResult<ImageSpec>;

    /// Reads row `y` of the current subimage into `buf` in native format.
    fn read_native_scanline(&mut self, y: usize, z: usize, buf: &mut [u8]) -> IoResult<()>;

    /// Reads rows `ybegin..yend` into `buf`.
    fn read_native_scanlines(
        &mut self,
        ybegin: usize,
        yend: usize,
        z: usize,
        buf: &mut [u8],
    ) -> IoResult<()> {
        let _ = (ybegin, yend, z, buf);
        Err(IoError::UnsupportedOperation(format!(
            "{}: batch scanline reads",
            self.format_name()
        )))
    }

    /// Reads the tile whose origin is (`x`, `y`) into `buf`.
    fn read_native_tile(&mut self, x: usize, y: usize, z: usize, buf: &mut [u8]) -> IoResult<()> {
        let _ = (x, y, z, buf);
        Err(IoError::UnsupportedOperation(format!(
            "{}: tiled reads",
            self.format_name()
        )))
    }

    /// Reads all tiles covering `xbegin..xend` x `ybegin..yend` into `buf`.
    #[allow(clippy::too_many_arguments)]
    fn read_native_tiles(
        &mut self,
        xbegin: usize,
        xend: usize,
        ybegin: usize,
        yend: usize,
        zbegin: usize,
        zend: usize,
        buf: &mut [u8],
    ) -> IoResult<()> {
        let _ = (xbegin, xend, ybegin, yend, zbegin, zend, buf);
        Err(IoError::UnsupportedOperation(format!(
            "{}: batch tiled reads",
            self.format_name()
        )))
    }
}
