//! Contract of the Houdini image library.
//!
//! The readers never parse pic/rat bytes themselves. They talk to an
//! [`ImgLibrary`], which opens a path and hands back an [`ImgFile`]: a handle
//! exposing global statistics, plane descriptors, options and row/tile reads.
//!
//! ```text
//! ImgLibrary::open(path, OpenOptions) -> Box<dyn ImgFile>
//!                                          |
//!                    +---------------------+----------------------+
//!                    |                     |                      |
//!                 stat()              options()         read_scanline()
//!          xres / yres / planes   name/value pairs       read_tile()
//! ```
//!
//! The library binds access mode at open time, so a reader that wants both
//! row and tile access holds two handles to the same path.

use crate::IoResult;
use glam::{DMat3, DMat4, DVec2, DVec3, DVec4};
use std::path::Path;

/// Format name reported by tile-capable `.rat` handles.
pub const RAT_FORMAT_NAME: &str = "RAT";

/// Format name reported by scanline `.pic` handles.
pub const PIC_FORMAT_NAME: &str = "PIC";

/// Native per-component data type of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImgDataType {
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 16-bit float.
    Float16,
    /// 32-bit float.
    Float32,
    /// A library type code this crate has no mapping for.
    Other(u32),
}

impl ImgDataType {
    /// Bytes per component, `None` for unknown codes.
    pub const fn bytes(&self) -> Option<usize> {
        match self {
            Self::Int8 => Some(1),
            Self::Int16 | Self::Float16 => Some(2),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Other(_) => None,
        }
    }
}

/// Global image classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImgImageType {
    /// One value per pixel and component.
    #[default]
    Flat,
    /// Variable number of depth samples per pixel.
    Deep,
}

/// Read-only descriptor of one plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ImgPlane {
    name: String,
    data_type: ImgDataType,
    components: usize,
    component_names: Vec<String>,
}

impl ImgPlane {
    /// Creates a multi-component plane; the component count is the number of names.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        data_type: ImgDataType,
        component_names: impl IntoIterator<Item = S>,
    ) -> Self {
        let component_names: Vec<String> = component_names.into_iter().map(Into::into).collect();
        Self {
            name: name.into(),
            data_type,
            components: component_names.len(),
            component_names,
        }
    }

    /// Creates a single-component plane. Such planes carry no component names.
    pub fn single(name: impl Into<String>, data_type: ImgDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            components: 1,
            component_names: Vec::new(),
        }
    }

    /// Plane name, e.g. `"C"` or `"Pz"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native data type shared by all components.
    pub fn data_type(&self) -> ImgDataType {
        self.data_type
    }

    /// Number of components per pixel.
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Name of component `index`.
    ///
    /// Single-component planes have no component names; callers must name
    /// the channel after the plane instead.
    pub fn component_name(&self, index: usize) -> Option<&str> {
        if self.components <= 1 {
            return None;
        }
        self.component_names.get(index).map(String::as_str)
    }

    /// Bytes per component, `None` for unknown data types.
    pub fn component_size(&self) -> Option<usize> {
        self.data_type.bytes()
    }

    /// Bytes per pixel, `None` for unknown data types.
    pub fn pixel_size(&self) -> Option<usize> {
        self.component_size().map(|b| b * self.components)
    }
}

/// Global statistics of an open file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImgStat {
    xres: u32,
    yres: u32,
    planes: Vec<ImgPlane>,
}

impl ImgStat {
    /// Creates stats for an `xres` x `yres` image with the given planes.
    pub fn new(xres: u32, yres: u32, planes: Vec<ImgPlane>) -> Self {
        Self { xres, yres, planes }
    }

    /// Width in pixels.
    pub fn xres(&self) -> u32 {
        self.xres
    }

    /// Height in pixels.
    pub fn yres(&self) -> u32 {
        self.yres
    }

    /// Number of planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// Plane at `index` in declaration order.
    pub fn plane(&self, index: usize) -> Option<&ImgPlane> {
        self.planes.get(index)
    }

    /// All planes in declaration order.
    pub fn planes(&self) -> &[ImgPlane] {
        &self.planes
    }
}

/// Access mode requested at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    /// Serve rows top-down instead of the native bottom-up order.
    pub flip_vertical: bool,
    /// Open through the tile interface instead of the scanline one.
    pub tile_interface: bool,
}

impl OpenOptions {
    /// Scanline access, native row order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets vertical flipping.
    pub fn with_flip_vertical(mut self, flip: bool) -> Self {
        self.flip_vertical = flip;
        self
    }

    /// Selects the tile interface.
    pub fn with_tile_interface(mut self, tiles: bool) -> Self {
        self.tile_interface = tiles;
        self
    }
}

/// Typed entry of a file's structured option set.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// 4x4 matrix.
    Matrix4(DMat4),
    /// 3x3 matrix.
    Matrix3(DMat3),
    /// String.
    String(String),
    /// Double-precision real.
    Real(f64),
    /// Integer.
    Int(i64),
    /// 2-vector.
    Vector2(DVec2),
    /// 3-vector.
    Vector3(DVec3),
    /// 4-vector.
    Vector4(DVec4),
    /// Boolean.
    Bool(bool),
}

/// Open handle to a pic/rat file.
pub trait ImgFile: Send {
    /// Name of the file format, e.g. [`RAT_FORMAT_NAME`].
    fn format_name(&self) -> &str;

    /// Flat or deep image.
    fn image_type(&self) -> ImgImageType;

    /// Resolution and planes.
    fn stat(&self) -> &ImgStat;

    /// Reads row `y` of `plane` into `buf`.
    ///
    /// Row order depends on [`OpenOptions::flip_vertical`] at open time.
    fn read_scanline(&mut self, y: usize, plane: usize, buf: &mut [u8]) -> IoResult<()>;

    /// Reads tile (`tx`, `ty`) of `plane` into `buf`.
    ///
    /// Only handles opened with [`OpenOptions::tile_interface`] support this.
    fn read_tile(&mut self, tx: usize, ty: usize, plane: usize, buf: &mut [u8]) -> IoResult<()>;

    /// Tile size of a tile-mode handle.
    fn tile_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Free-form name/value options.
    fn options(&self) -> &[(String, String)];

    /// Typed option set, if the file carries one.
    fn structured_options(&self) -> Option<&[(String, OptionValue)]> {
        None
    }
}

/// Entry point of the image library.
pub trait ImgLibrary: Send + Sync {
    /// Opens `path`, or returns `None` if the library does not recognize it.
    fn open(&self, path: &Path, options: &OpenOptions) -> Option<Box<dyn ImgFile>>;
}
