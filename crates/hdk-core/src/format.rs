//! Runtime pixel data formats.
//!
//! [`DataFormat`] is the generic per-channel storage type a host sees. It is
//! deliberately wider than what any single plugin produces: Houdini planes
//! carry signed integers, while most other formats only know unsigned ones.
//!
//! # Usage
//!
//! ```rust
//! use hdk_core::format::DataFormat;
//!
//! let fmt = DataFormat::F16;
//! assert_eq!(fmt.bytes_per_channel(), 2);
//! assert!(fmt.is_float());
//!
//! assert!(DataFormat::I16.is_signed());
//! assert!(!DataFormat::U16.is_signed());
//! ```

/// Runtime pixel data format.
///
/// Represents the actual storage type of one channel value in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    /// 8-bit unsigned integer.
    #[default]
    U8,
    /// 8-bit signed integer.
    I8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit signed integer.
    I16,
    /// 32-bit unsigned integer.
    U32,
    /// 32-bit signed integer.
    I32,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float.
    F32,
}

impl DataFormat {
    /// Number of bytes per channel.
    #[inline]
    pub const fn bytes_per_channel(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
        }
    }

    /// Number of bits per channel.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.bytes_per_channel() as u32 * 8
    }

    /// Whether this is a floating-point format.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Whether this is an integer format.
    #[inline]
    pub const fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Whether values of this format carry a sign.
    ///
    /// Floats are signed.
    #[inline]
    pub const fn is_signed(&self) -> bool {
        !matches!(self, Self::U8 | Self::U16 | Self::U32)
    }

    /// Short name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F16 => "f16",
            Self::F32 => "f32",
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
