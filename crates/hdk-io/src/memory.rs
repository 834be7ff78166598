//! In-memory image library.
//!
//! [`MemoryLibrary`] implements [`ImgLibrary`] over images held in memory and
//! keyed by path. Hosts use it to feed synthetic planes through the readers;
//! the counters make handle release observable.
//!
//! Rows are stored in the native bottom-up order. Handles opened with
//! [`OpenOptions::flip_vertical`] serve row 0 as the top row.
//!
//! # Example
//!
//! ```rust
//! use hdk_io::img::{ImgDataType, ImgPlane};
//! use hdk_io::memory::{MemoryImage, MemoryLibrary};
//!
//! let image = MemoryImage::new("PIC", 4, 2)
//!     .with_plane_fn(ImgPlane::single("Pz", ImgDataType::Float32), |x, _, _| x as f64);
//!
//! let mut library = MemoryLibrary::new();
//! library.insert("/shots/depth.pic", image);
//! assert_eq!(library.open_count(), 0);
//! ```

use crate::img::{
    ImgDataType, ImgFile, ImgImageType, ImgLibrary, ImgPlane, ImgStat, OpenOptions, OptionValue,
};
use crate::{IoError, IoResult};
use half::f16;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Default tile edge for tile-mode handles.
pub const DEFAULT_TILE_SIZE: u32 = 16;

/// One image held by a [`MemoryLibrary`].
#[derive(Debug, Clone)]
pub struct MemoryImage {
    format_name: String,
    image_type: ImgImageType,
    stat: ImgStat,
    /// Per plane, rows bottom-up.
    data: Vec<Vec<u8>>,
    options: Vec<(String, String)>,
    structured: Option<Vec<(String, OptionValue)>>,
    tile_size: (u32, u32),
    allow_tiles: bool,
}

impl MemoryImage {
    /// Creates an image with no planes.
    pub fn new(format_name: impl Into<String>, xres: u32, yres: u32) -> Self {
        Self {
            format_name: format_name.into(),
            image_type: ImgImageType::Flat,
            stat: ImgStat::new(xres, yres, Vec::new()),
            data: Vec::new(),
            options: Vec::new(),
            structured: None,
            tile_size: (DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE),
            allow_tiles: true,
        }
    }

    /// Sets the image type.
    pub fn with_image_type(mut self, image_type: ImgImageType) -> Self {
        self.image_type = image_type;
        self
    }

    /// Adds a plane with raw native-endian data, rows bottom-up.
    pub fn with_plane(mut self, plane: ImgPlane, data: Vec<u8>) -> Self {
        let mut planes = self.stat.planes().to_vec();
        planes.push(plane);
        self.stat = ImgStat::new(self.stat.xres(), self.stat.yres(), planes);
        self.data.push(data);
        self
    }

    /// Adds a zero-filled plane.
    pub fn with_blank_plane(self, plane: ImgPlane) -> Self {
        let size = self.plane_bytes(&plane);
        self.with_plane(plane, vec![0; size])
    }

    /// Adds a plane whose component `c` at (`x`, `y`) is `f(x, y, c)`.
    ///
    /// `y` counts from the top. Values are converted to the plane's data type.
    pub fn with_plane_fn(self, plane: ImgPlane, f: impl Fn(u32, u32, usize) -> f64) -> Self {
        let (xres, yres) = (self.stat.xres(), self.stat.yres());
        let mut data = Vec::with_capacity(self.plane_bytes(&plane));
        for native_y in 0..yres {
            let y = yres - 1 - native_y;
            for x in 0..xres {
                for c in 0..plane.component_count() {
                    encode(plane.data_type(), f(x, y, c), &mut data);
                }
            }
        }
        self.with_plane(plane, data)
    }

    /// Adds a name/value option.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((name.into(), value.into()));
        self
    }

    /// Adds a typed option, creating the structured set on first use.
    pub fn with_structured_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.structured
            .get_or_insert_with(Vec::new)
            .push((name.into(), value));
        self
    }

    /// Sets the tile size served by tile-mode handles.
    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_size = (width.max(1), height.max(1));
        self
    }

    /// Makes tile-mode opens fail.
    pub fn refuse_tile_mode(mut self) -> Self {
        self.allow_tiles = false;
        self
    }

    fn plane_bytes(&self, plane: &ImgPlane) -> usize {
        self.stat.xres() as usize * self.stat.yres() as usize * plane.pixel_size().unwrap_or(0)
    }
}

fn encode(data_type: ImgDataType, value: f64, out: &mut Vec<u8>) {
    match data_type {
        ImgDataType::Int8 => out.extend_from_slice(&(value as i8).to_ne_bytes()),
        ImgDataType::Int16 => out.extend_from_slice(&(value as i16).to_ne_bytes()),
        ImgDataType::Int32 => out.extend_from_slice(&(value as i32).to_ne_bytes()),
        ImgDataType::Float16 => out.extend_from_slice(&f16::from_f64(value).to_ne_bytes()),
        ImgDataType::Float32 => out.extend_from_slice(&(value as f32).to_ne_bytes()),
        ImgDataType::Other(_) => {}
    }
}

/// [`ImgLibrary`] over in-memory images.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    images: HashMap<PathBuf, Arc<MemoryImage>>,
    opens: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl MemoryLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `image` openable at `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, image: MemoryImage) {
        self.images.insert(path.into(), Arc::new(image));
    }

    /// Number of `open` calls so far, successful or not.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of handles currently alive.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl ImgLibrary for MemoryLibrary {
    fn open(&self, path: &Path, options: &OpenOptions) -> Option<Box<dyn ImgFile>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let image = self.images.get(path)?;
        if options.tile_interface && !image.allow_tiles {
            return None;
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(MemoryFile {
            image: Arc::clone(image),
            options: *options,
            live: Arc::clone(&self.live),
        }))
    }
}

/// Handle returned by [`MemoryLibrary`].
#[derive(Debug)]
struct MemoryFile {
    image: Arc<MemoryImage>,
    options: OpenOptions,
    live: Arc<AtomicUsize>,
}

impl MemoryFile {
    fn plane_data(&self, plane: usize) -> IoResult<(&ImgPlane, &[u8], usize)> {
        let stat = &self.image.stat;
        let desc = stat.plane(plane).ok_or(IoError::OutOfRange {
            what: "plane",
            index: plane,
            limit: stat.num_planes(),
        })?;
        let pixel = desc.pixel_size().ok_or_else(|| {
            IoError::UnsupportedPixelType(format!("{:?}", desc.data_type()))
        })?;
        Ok((desc, &self.image.data[plane], pixel))
    }

    fn native_row(&self, y: usize) -> usize {
        let yres = self.image.stat.yres() as usize;
        if self.options.flip_vertical {
            yres - 1 - y
        } else {
            y
        }
    }
}

impl ImgFile for MemoryFile {
    fn format_name(&self) -> &str {
        &self.image.format_name
    }

    fn image_type(&self) -> ImgImageType {
        self.image.image_type
    }

    fn stat(&self) -> &ImgStat {
        &self.image.stat
    }

    fn read_scanline(&mut self, y: usize, plane: usize, buf: &mut [u8]) -> IoResult<()> {
        if self.options.tile_interface {
            return Err(IoError::UnsupportedOperation(
                "scanline read on a tile-mode handle".into(),
            ));
        }
        let (_, data, pixel) = self.plane_data(plane)?;
        let yres = self.image.stat.yres() as usize;
        if y >= yres {
            return Err(IoError::OutOfRange {
                what: "scanline",
                index: y,
                limit: yres,
            });
        }
        let row_bytes = self.image.stat.xres() as usize * pixel;
        if buf.len() < row_bytes {
            return Err(IoError::BufferTooSmall {
                needed: row_bytes,
                actual: buf.len(),
            });
        }
        let start = self.native_row(y) * row_bytes;
        let src = data
            .get(start..start + row_bytes)
            .ok_or_else(|| IoError::DecodeError("plane data truncated".into()))?;
        buf[..row_bytes].copy_from_slice(src);
        Ok(())
    }

    fn read_tile(&mut self, tx: usize, ty: usize, plane: usize, buf: &mut [u8]) -> IoResult<()> {
        if !self.options.tile_interface {
            return Err(IoError::UnsupportedOperation(
                "tile read on a scanline-mode handle".into(),
            ));
        }
        let (_, data, pixel) = self.plane_data(plane)?;
        let (tw, th) = (self.image.tile_size.0 as usize, self.image.tile_size.1 as usize);
        let (xres, yres) = (self.image.stat.xres() as usize, self.image.stat.yres() as usize);
        let (x0, y0) = (tx * tw, ty * th);
        if x0 >= xres || y0 >= yres {
            return Err(IoError::OutOfRange {
                what: "tile",
                index: if x0 >= xres { tx } else { ty },
                limit: if x0 >= xres { xres.div_ceil(tw) } else { yres.div_ceil(th) },
            });
        }
        let tile_bytes = tw * th * pixel;
        if buf.len() < tile_bytes {
            return Err(IoError::BufferTooSmall {
                needed: tile_bytes,
                actual: buf.len(),
            });
        }

        buf[..tile_bytes].fill(0);
        let row_bytes = xres * pixel;
        let span = (tw.min(xres - x0)) * pixel;
        for row in 0..th.min(yres - y0) {
            let start = self.native_row(y0 + row) * row_bytes + x0 * pixel;
            let src = data
                .get(start..start + span)
                .ok_or_else(|| IoError::DecodeError("plane data truncated".into()))?;
            let dst = row * tw * pixel;
            buf[dst..dst + span].copy_from_slice(src);
        }
        Ok(())
    }

    fn tile_size(&self) -> Option<(u32, u32)> {
        self.options.tile_interface.then_some(self.image.tile_size)
    }

    fn options(&self) -> &[(String, String)] {
        &self.image.options
    }

    fn structured_options(&self) -> Option<&[(String, OptionValue)]> {
        self.image.structured.as_deref()
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
