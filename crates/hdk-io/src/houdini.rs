//! Houdini pic/rat reader.
//!
//! Maps the planes of a pic/rat file onto host subimages. Planes carry their
//! own data type, component count and component order, so each plane becomes
//! exactly one subimage instead of being flattened into one raster.
//!
//! # Lifecycle
//!
//! ```text
//! new() --open()--> scanline handle (+ tile handle for .rat)
//!                    parts[0..planes], all underived
//!                    seek_subimage(0, 0)
//!       --seek_subimage(i, 0)--> derive parts[i] once, then serve from cache
//!       --read_native_scanline(y)--> row y of the selected plane
//!       --close()--> back to the state of new()
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hdk_io::{HoudiniInput, ImageInput};
//!
//! let mut input = HoudiniInput::new(library);
//! let spec = input.open("shot.rat".as_ref())?;
//! for i in 0..input.num_subimages() {
//!     let spec = input.seek_subimage(i, 0)?;
//!     println!("{}: {:?}", i, spec.channel_names);
//! }
//! ```

use crate::img::{
    ImgDataType, ImgFile, ImgImageType, ImgLibrary, ImgPlane, OpenOptions, RAT_FORMAT_NAME,
};
use crate::metadata::{copy_metadata, HOUDINI_NAMESPACE};
use crate::{ImageInput, IoError, IoResult};
use hdk_core::{DataFormat, ImageSpec};
use smallvec::SmallVec;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration attribute requesting unassociated alpha.
pub const UNASSOCIATED_ALPHA_ATTR: &str = "oiio:UnassociatedAlpha";

/// Value written to `XResolution`/`YResolution`, in pixels per `ResolutionUnit`.
pub const PIXELS_PER_METER: f64 = 1.0;

/// Which plugin the reader is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Variant {
    /// Full pic/rat reader: tile handle, metadata.
    Houdini,
    /// Legacy rat reader: scanline handle only, no metadata.
    LegacyRat,
}

impl Variant {
    fn format_name(self) -> &'static str {
        match self {
            Self::Houdini => "Houdini (pic/rat)",
            Self::LegacyRat => "rat",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Houdini => &["rat", "pic"],
            Self::LegacyRat => &["rat"],
        }
    }
}

/// Maps a native plane data type to the host pixel type.
///
/// Library type codes without a counterpart are an error.
pub fn data_format_from_img(data_type: ImgDataType) -> IoResult<DataFormat> {
    match data_type {
        ImgDataType::Int8 => Ok(DataFormat::I8),
        ImgDataType::Int16 => Ok(DataFormat::I16),
        ImgDataType::Int32 => Ok(DataFormat::I32),
        ImgDataType::Float16 => Ok(DataFormat::F16),
        ImgDataType::Float32 => Ok(DataFormat::F32),
        ImgDataType::Other(code) => Err(IoError::UnsupportedPixelType(format!(
            "image library data type {code}"
        ))),
    }
}

/// Channel names for one plane: `"P"` for a single component, else `"P.c"`.
pub fn channel_names(plane: &ImgPlane) -> Vec<String> {
    let count = plane.component_count();
    if count == 1 {
        return vec![plane.name().to_string()];
    }
    (0..count)
        .map(|c| match plane.component_name(c) {
            Some(component) => format!("{}.{}", plane.name(), component),
            None => format!("{}.{}", plane.name(), c),
        })
        .collect()
}

/// Derived state of one plane.
#[derive(Debug, Clone, Default)]
struct PartInfo {
    initialized: bool,
    spec: ImageSpec,
    /// Width of top mip level
    topwidth: u32,
    /// Height of top mip level
    topheight: u32,
    /// Highest valid mip level; only level 0 exists.
    nmiplevels: usize,
    pixeltype: SmallVec<[DataFormat; 4]>,
    chanbytes: SmallVec<[usize; 4]>,
}

impl PartInfo {
    fn derive(file: &dyn ImgFile, index: usize, with_metadata: bool) -> IoResult<Self> {
        let stat = file.stat();
        let plane = stat.plane(index).ok_or(IoError::OutOfRange {
            what: "subimage",
            index,
            limit: stat.num_planes(),
        })?;

        let format = data_format_from_img(plane.data_type())?;
        let components = plane.component_count();
        let bytes = plane
            .component_size()
            .unwrap_or_else(|| format.bytes_per_channel());

        let mut spec = ImageSpec::new(stat.xres(), stat.yres(), components as u32, format);
        spec.set_attr("XResolution", PIXELS_PER_METER);
        spec.set_attr("YResolution", PIXELS_PER_METER);
        spec.set_attr("ResolutionUnit", "m");
        spec.deep = file.image_type() == ImgImageType::Deep;
        if with_metadata {
            copy_metadata(file, &mut spec, HOUDINI_NAMESPACE);
        }
        spec.channel_names = channel_names(plane);

        tracing::debug!(
            "derived subimage {} from plane {:?}: {}",
            index,
            plane.name(),
            spec
        );

        Ok(Self {
            initialized: true,
            topwidth: stat.xres(),
            topheight: stat.yres(),
            nmiplevels: 0,
            pixeltype: SmallVec::from_elem(format, components),
            chanbytes: SmallVec::from_elem(bytes, components),
            spec,
        })
    }
}

/// Reader for Houdini pic and rat files.
///
/// One plane of the file is one subimage. Specs are derived on first seek
/// and cached for the rest of the open session.
pub struct HoudiniInput {
    library: Arc<dyn ImgLibrary>,
    variant: Variant,
    filename: Option<PathBuf>,
    /// Row access, vertically flipped to top-down order.
    scanline_file: Option<Box<dyn ImgFile>>,
    /// Tile access, rat files only.
    tile_file: Option<Box<dyn ImgFile>>,
    deep: bool,
    unassociated_alpha: bool,
    parts: Vec<PartInfo>,
    /// (subimage, miplevel)
    current: Option<(usize, usize)>,
    last_error: Option<String>,
}

impl HoudiniInput {
    /// Creates a closed reader backed by `library`.
    pub fn new(library: Arc<dyn ImgLibrary>) -> Self {
        Self::with_variant(library, Variant::Houdini)
    }

    pub(crate) fn with_variant(library: Arc<dyn ImgLibrary>, variant: Variant) -> Self {
        Self {
            library,
            variant,
            filename: None,
            scanline_file: None,
            tile_file: None,
            deep: false,
            unassociated_alpha: false,
            parts: Vec::new(),
            current: None,
            last_error: None,
        }
    }

    /// Path of the open file.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Whether a file is open.
    pub fn is_open(&self) -> bool {
        self.scanline_file.is_some()
    }

    /// Number of subimages (planes) in the open file, 0 when closed.
    pub fn num_subimages(&self) -> usize {
        self.parts.len()
    }

    /// Whether the open file is a deep rat.
    pub fn is_deep(&self) -> bool {
        self.deep
    }

    /// Whether a tile-mode handle is held.
    pub fn has_tile_handle(&self) -> bool {
        self.tile_file.is_some()
    }

    /// Unassociated-alpha hint from the last `open_with_config`.
    pub fn unassociated_alpha(&self) -> bool {
        self.unassociated_alpha
    }

    /// Per-channel pixel types of a derived subimage.
    pub fn channel_formats(&self, subimage: usize) -> Option<&[DataFormat]> {
        self.parts
            .get(subimage)
            .filter(|p| p.initialized)
            .map(|p| p.pixeltype.as_slice())
    }

    /// Per-channel byte sizes of a derived subimage.
    pub fn channel_sizes(&self, subimage: usize) -> Option<&[usize]> {
        self.parts
            .get(subimage)
            .filter(|p| p.initialized)
            .map(|p| p.chanbytes.as_slice())
    }

    /// Returns and clears the message of the last failed operation.
    pub fn geterror(&mut self) -> Option<String> {
        self.last_error.take()
    }

    fn record<T>(&mut self, result: IoResult<T>) -> IoResult<T> {
        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }

    fn open_impl(&mut self, path: &Path, config: Option<&ImageSpec>) -> IoResult<ImageSpec> {
        self.close();

        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(IoError::NotRegularFile(path.to_path_buf())),
        }

        let scanline_opts = OpenOptions::new().with_flip_vertical(true);
        let file = self.library.open(path, &scanline_opts).ok_or_else(|| {
            tracing::warn!("image library could not open {}", path.display());
            IoError::UnsupportedFormat(format!("\"{}\" could not be opened", path.display()))
        })?;

        let mut tile_file = None;
        let mut deep = false;
        if self.variant == Variant::Houdini && file.format_name() == RAT_FORMAT_NAME {
            // `file` is dropped, and so released, if this fails.
            let tiles = self
                .library
                .open(path, &scanline_opts.with_tile_interface(true))
                .ok_or_else(|| {
                    tracing::warn!("image library could not open {} for tiles", path.display());
                    IoError::UnsupportedFormat(format!(
                        "\"{}\" could not be opened for tile access",
                        path.display()
                    ))
                })?;
            tile_file = Some(tiles);
            deep = file.image_type() == ImgImageType::Deep;
        }

        let nplanes = file.stat().num_planes();
        tracing::debug!(
            "opened {} ({}, {} planes, {}x{})",
            path.display(),
            file.format_name(),
            nplanes,
            file.stat().xres(),
            file.stat().yres()
        );

        self.filename = Some(path.to_path_buf());
        self.scanline_file = Some(file);
        self.tile_file = tile_file;
        self.deep = deep;
        self.parts = vec![PartInfo::default(); nplanes];
        self.current = None;
        self.unassociated_alpha = config
            .and_then(|c| c.get_int(UNASSOCIATED_ALPHA_ATTR))
            .is_some_and(|v| v != 0);

        match self.seek_impl(0, 0) {
            Ok(spec) => Ok(spec),
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    fn seek_impl(&mut self, subimage: usize, miplevel: usize) -> IoResult<ImageSpec> {
        let file = self.scanline_file.as_deref().ok_or(IoError::NotOpen)?;
        let nparts = self.parts.len();
        if subimage >= nparts {
            return Err(IoError::OutOfRange {
                what: "subimage",
                index: subimage,
                limit: nparts,
            });
        }

        if self.current == Some((subimage, miplevel)) {
            tracing::trace!("subimage {subimage} already selected");
            return Ok(self.parts[subimage].spec.clone());
        }

        let part = &self.parts[subimage];
        if miplevel > part.nmiplevels {
            return Err(IoError::OutOfRange {
                what: "miplevel",
                index: miplevel,
                limit: part.nmiplevels + 1,
            });
        }

        if !part.initialized {
            let derived = PartInfo::derive(file, subimage, self.variant == Variant::Houdini)?;
            self.parts[subimage] = derived;
        } else {
            tracing::trace!("subimage {subimage} served from cache");
        }

        self.current = Some((subimage, miplevel));
        Ok(self.parts[subimage].spec.clone())
    }

    fn read_scanline_impl(&mut self, y: usize, buf: &mut [u8]) -> IoResult<()> {
        let (subimage, _) = self.current.ok_or(IoError::NoSubimage)?;
        let file = self.scanline_file.as_deref_mut().ok_or(IoError::NotOpen)?;
        debug_assert!(subimage < file.stat().num_planes());

        let part = &self.parts[subimage];
        let height = part.topheight as usize;
        if y >= height {
            return Err(IoError::OutOfRange {
                what: "scanline",
                index: y,
                limit: height,
            });
        }
        let row_bytes = part.topwidth as usize * part.chanbytes.iter().sum::<usize>();
        if buf.len() < row_bytes {
            return Err(IoError::BufferTooSmall {
                needed: row_bytes,
                actual: buf.len(),
            });
        }

        file.read_scanline(y, subimage, &mut buf[..row_bytes])
    }
}

impl ImageInput for HoudiniInput {
    fn format_name(&self) -> &'static str {
        self.variant.format_name()
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.variant.extensions()
    }

    fn check_file(&self, path: &Path) -> IoResult<()> {
        std::fs::File::open(path)?;
        match self.library.open(path, &OpenOptions::new()) {
            Some(_) => Ok(()),
            None => Err(IoError::UnsupportedFormat(format!(
                "\"{}\" is not a file Houdini can open",
                path.display()
            ))),
        }
    }

    fn open(&mut self, path: &Path) -> IoResult<ImageSpec> {
        let result = self.open_impl(path, None);
        self.record(result)
    }

    fn open_with_config(&mut self, path: &Path, config: &ImageSpec) -> IoResult<ImageSpec> {
        let result = self.open_impl(path, Some(config));
        self.record(result)
    }

    fn close(&mut self) {
        if let Some(path) = self.filename.take() {
            tracing::debug!("closing {}", path.display());
        }
        self.tile_file = None;
        self.scanline_file = None;
        self.deep = false;
        self.unassociated_alpha = false;
        self.parts.clear();
        self.current = None;
    }

    fn current_subimage(&self) -> Option<usize> {
        self.current.map(|(s, _)| s)
    }

    fn current_miplevel(&self) -> Option<usize> {
        self.current.map(|(_, m)| m)
    }

    fn spec(&self) -> Option<&ImageSpec> {
        self.current.map(|(s, _)| &self.parts[s].spec)
    }

    fn seek_subimage(&mut self, subimage: usize, miplevel: usize) -> IoResult<ImageSpec> {
        let result = self.seek_impl(subimage, miplevel);
        self.record(result)
    }

    fn read_native_scanline(&mut self, y: usize, _z: usize, buf: &mut [u8]) -> IoResult<()> {
        let result = self.read_scanline_impl(y, buf);
        self.record(result)
    }
}

impl Drop for HoudiniInput {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for HoudiniInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoudiniInput")
            .field("format", &self.variant.format_name())
            .field("filename", &self.filename)
            .field("subimages", &self.parts.len())
            .field("current", &self.current)
            .field("tiles", &self.tile_file.is_some())
            .field("deep", &self.deep)
            .finish()
    }
}
