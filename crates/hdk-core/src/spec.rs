//! Image specification and metadata.
//!
//! This module provides [`ImageSpec`] - the description a reader hands to its
//! host for one subimage: resolution, channel layout, pixel type and an
//! open-ended attribute map.
//!
//! # Overview
//!
//! [`ImageSpec`] is modeled after OpenImageIO's `ImageSpec`. It serves as the
//! "header" for raw scanline data, containing everything needed to size a
//! row buffer and to interpret the bytes a reader writes into it.
//!
//! # Usage
//!
//! ```rust
//! use hdk_core::{ImageSpec, DataFormat};
//!
//! let mut spec = ImageSpec::new(64, 32, 3, DataFormat::F32);
//! spec.channel_names = vec!["C.r".into(), "C.g".into(), "C.b".into()];
//! spec.set_attr("houdini:software", "mplay");
//!
//! assert_eq!(spec.bytes_per_row(), 64 * 3 * 4);
//! ```

use crate::format::DataFormat;
use std::collections::HashMap;

/// Attribute value that can be stored in image metadata.
///
/// Supports the value shapes found in Houdini file options.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// 2-component vector
    Vector2([f64; 2]),
    /// 3-component vector
    Vector3([f64; 3]),
    /// 3x3 matrix (row-major)
    Matrix3([f64; 9]),
    /// 4x4 matrix (row-major)
    Matrix4([f64; 16]),
}

impl AttrValue {
    /// Returns this value as an integer, if applicable.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Returns this value as a float, if applicable.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a string, if applicable.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the components of a vector or matrix value.
    ///
    /// Matrices come back row-major.
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::Vector2(v) => Some(v),
            Self::Vector3(v) => Some(v),
            Self::Matrix3(m) => Some(m),
            Self::Matrix4(m) => Some(m),
            _ => None,
        }
    }

    /// Short type name, used in log output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Vector2(_) => "vector2",
            Self::Vector3(_) => "vector3",
            Self::Matrix3(_) => "matrix3",
            Self::Matrix4(_) => "matrix4",
        }
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// Image specification describing one subimage.
///
/// # Example
///
/// ```rust
/// use hdk_core::{ImageSpec, DataFormat};
///
/// let spec = ImageSpec::new(1920, 1080, 4, DataFormat::F16);
/// assert_eq!(spec.bytes_per_pixel(), 8); // 4 channels * 2 bytes
/// assert_eq!(spec.channel_formats.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Image depth (1 for 2D images)
    pub depth: u32,
    /// Number of channels per pixel
    pub channels: u32,
    /// Data type shared by all channels
    pub format: DataFormat,
    /// Per-channel data types, one entry per channel
    pub channel_formats: Vec<DataFormat>,
    /// Channel names, one entry per channel once a reader fills them in
    pub channel_names: Vec<String>,
    /// Pixels hold a variable number of depth samples
    pub deep: bool,
    /// Arbitrary metadata attributes
    pub attributes: HashMap<String, AttrValue>,
}

impl ImageSpec {
    /// Creates a new image specification with given dimensions and format.
    ///
    /// Every channel gets `format`; names are left empty.
    pub fn new(width: u32, height: u32, channels: u32, format: DataFormat) -> Self {
        Self {
            width,
            height,
            depth: 1,
            channels,
            format,
            channel_formats: vec![format; channels as usize],
            channel_names: Vec::new(),
            deep: false,
            attributes: HashMap::new(),
        }
    }

    /// Returns the number of bytes per pixel.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        if self.channel_formats.len() == self.channels as usize {
            self.channel_formats.iter().map(|f| f.bytes_per_channel()).sum()
        } else {
            self.channels as usize * self.format.bytes_per_channel()
        }
    }

    /// Returns the number of bytes per scanline (row).
    #[inline]
    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    /// Returns the total number of pixels in the image.
    #[inline]
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }

    /// Returns the total size of pixel data in bytes.
    #[inline]
    pub fn data_size(&self) -> usize {
        self.pixel_count() as usize * self.bytes_per_pixel()
    }

    /// Sets an attribute value.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Gets an attribute value by key.
    pub fn get_attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Gets an attribute as a string.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get_attr(key).and_then(|v| v.as_str())
    }

    /// Gets an attribute as an integer.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get_attr(key).and_then(|v| v.as_int())
    }

    /// Gets an attribute as a float.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get_attr(key).and_then(|v| v.as_float())
    }

    /// Iterates attributes whose key starts with `prefix:`.
    pub fn attrs_in_namespace<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a AttrValue)> + 'a {
        self.attributes.iter().filter_map(move |(k, v)| {
            k.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(|name| (name, v))
        })
    }
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self::new(0, 0, 0, DataFormat::U8)
    }
}

impl std::fmt::Display for ImageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}x{} {} {}ch",
            self.width, self.height, self.depth, self.format, self.channels
        )?;
        if self.deep {
            write!(f, " deep")?;
        }
        Ok(())
    }
}
