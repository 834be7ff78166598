//! Integration tests for HoudiniInput over the in-memory image library.

use approx::assert_relative_eq;
use glam::{DMat4, DVec3, DVec4};
use hdk_io::img::{
    ImgDataType, ImgFile, ImgImageType, ImgLibrary, ImgPlane, ImgStat, OpenOptions, OptionValue,
    PIC_FORMAT_NAME, RAT_FORMAT_NAME,
};
use hdk_io::memory::{MemoryImage, MemoryLibrary};
use hdk_io::{AttrValue, DataFormat, HoudiniInput, ImageInput, ImageSpec, IoError, IoResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Creates an empty regular file so the path passes the filesystem check.
fn touch(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"").expect("create file");
    path
}

fn three_depth_planes() -> MemoryImage {
    MemoryImage::new(PIC_FORMAT_NAME, 64, 32)
        .with_plane_fn(ImgPlane::single("Pz", ImgDataType::Float32), |x, y, _| (x + y) as f64)
        .with_plane_fn(ImgPlane::single("Of", ImgDataType::Float32), |_, y, _| y as f64)
        .with_plane_fn(ImgPlane::single("Az", ImgDataType::Float32), |x, _, _| x as f64)
}

fn open_with(
    image: MemoryImage,
    name: &str,
) -> (TempDir, PathBuf, Arc<MemoryLibrary>, HoudiniInput) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = touch(&dir, name);
    let mut library = MemoryLibrary::new();
    library.insert(&path, image);
    let library = Arc::new(library);
    let input = HoudiniInput::new(library.clone());
    (dir, path, library, input)
}

fn f32_row(buf: &[u8]) -> Vec<f32> {
    buf.chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[test]
fn open_selects_first_plane() {
    let image = MemoryImage::new(PIC_FORMAT_NAME, 16, 8)
        .with_blank_plane(ImgPlane::new("C", ImgDataType::Float16, ["r", "g", "b", "a"]))
        .with_blank_plane(ImgPlane::single("Pz", ImgDataType::Float32));
    let (_dir, path, _lib, mut input) = open_with(image, "beauty.pic");

    let spec = input.open(&path).expect("open");
    assert_eq!(spec.channels, 4);
    assert_eq!(spec.format, DataFormat::F16);
    assert_eq!(input.current_subimage(), Some(0));
    assert_eq!(input.current_miplevel(), Some(0));
    assert_eq!(input.num_subimages(), 2);
    assert_eq!(input.spec(), Some(&spec));
    assert_eq!(input.filename(), Some(path.as_path()));
}

#[test]
fn three_single_channel_planes() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");
    input.open(&path).expect("open");

    let spec = input.seek_subimage(1, 0).expect("seek");
    assert_eq!(spec.width, 64);
    assert_eq!(spec.height, 32);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.format, DataFormat::F32);
    assert_eq!(spec.channel_names, vec!["Of"]);
    assert_eq!(input.channel_formats(1), Some(&[DataFormat::F32][..]));
    assert_eq!(input.channel_sizes(1), Some(&[4usize][..]));
}

#[test]
fn rgb_plane_channel_names() {
    let image = MemoryImage::new(PIC_FORMAT_NAME, 8, 8)
        .with_blank_plane(ImgPlane::new("C", ImgDataType::Int16, ["R", "G", "B"]));
    let (_dir, path, _lib, mut input) = open_with(image, "rgb.pic");

    let spec = input.open(&path).expect("open");
    assert_eq!(spec.channel_names, vec!["C.R", "C.G", "C.B"]);
    assert_eq!(spec.channel_formats, vec![DataFormat::I16; 3]);
    assert_eq!(input.channel_sizes(0), Some(&[2usize, 2, 2][..]));
}

#[test]
fn repeated_seek_is_identical() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");
    input.open(&path).expect("open");

    let first = input.seek_subimage(2, 0).expect("seek");
    let second = input.seek_subimage(2, 0).expect("seek again");
    assert_eq!(first, second);

    input.seek_subimage(0, 0).expect("back to 0");
    let third = input.seek_subimage(2, 0).expect("cached");
    assert_eq!(first, third);
}

/// Library wrapper counting `options()` calls, one per plane derivation.
struct CountingLibrary {
    inner: MemoryLibrary,
    options_reads: Arc<AtomicUsize>,
}

struct CountingFile {
    inner: Box<dyn ImgFile>,
    options_reads: Arc<AtomicUsize>,
}

impl ImgLibrary for CountingLibrary {
    fn open(&self, path: &Path, options: &OpenOptions) -> Option<Box<dyn ImgFile>> {
        let inner = self.inner.open(path, options)?;
        Some(Box::new(CountingFile {
            inner,
            options_reads: Arc::clone(&self.options_reads),
        }))
    }
}

impl ImgFile for CountingFile {
    fn format_name(&self) -> &str {
        self.inner.format_name()
    }

    fn image_type(&self) -> ImgImageType {
        self.inner.image_type()
    }

    fn stat(&self) -> &ImgStat {
        self.inner.stat()
    }

    fn read_scanline(&mut self, y: usize, plane: usize, buf: &mut [u8]) -> IoResult<()> {
        self.inner.read_scanline(y, plane, buf)
    }

    fn read_tile(&mut self, tx: usize, ty: usize, plane: usize, buf: &mut [u8]) -> IoResult<()> {
        self.inner.read_tile(tx, ty, plane, buf)
    }

    fn options(&self) -> &[(String, String)] {
        self.options_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.options()
    }
}

#[test]
fn each_plane_derived_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = touch(&dir, "depth.pic");
    let mut inner = MemoryLibrary::new();
    inner.insert(&path, three_depth_planes());
    let options_reads = Arc::new(AtomicUsize::new(0));
    let library = Arc::new(CountingLibrary {
        inner,
        options_reads: Arc::clone(&options_reads),
    });
    let mut input = HoudiniInput::new(library);

    input.open(&path).expect("open");
    assert_eq!(options_reads.load(Ordering::SeqCst), 1);

    for _ in 0..5 {
        input.seek_subimage(1, 0).expect("seek 1");
        input.seek_subimage(0, 0).expect("seek 0");
    }
    assert_eq!(options_reads.load(Ordering::SeqCst), 2);

    let err = input.seek_subimage(0, 1).unwrap_err();
    assert!(matches!(err, IoError::OutOfRange { what: "miplevel", .. }));
    assert_eq!(input.current_subimage(), Some(0));
    assert_eq!(options_reads.load(Ordering::SeqCst), 2);

    input.seek_subimage(2, 0).expect("seek 2");
    input.seek_subimage(2, 0).expect("seek 2 again");
    assert_eq!(options_reads.load(Ordering::SeqCst), 3);
}

#[test]
fn out_of_range_subimage_keeps_selection() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");
    input.open(&path).expect("open");
    input.seek_subimage(1, 0).expect("seek");
    let before = input.spec().cloned();

    let err = input.seek_subimage(3, 0).unwrap_err();
    assert!(matches!(err, IoError::OutOfRange { what: "subimage", index: 3, limit: 3 }));
    assert_eq!(input.current_subimage(), Some(1));
    assert_eq!(input.spec().cloned(), before);
    assert!(input.geterror().is_some_and(|m| m.contains("subimage")));
    assert!(input.geterror().is_none());
}

#[test]
fn nonzero_miplevel_fails() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");
    input.open(&path).expect("open");

    for subimage in 0..3 {
        let err = input.seek_subimage(subimage, 1).unwrap_err();
        assert!(matches!(err, IoError::OutOfRange { what: "miplevel", .. }));
    }
    assert_eq!(input.current_subimage(), Some(0));
    assert_eq!(input.current_miplevel(), Some(0));
}

#[test]
fn open_directory_skips_library() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library = Arc::new(MemoryLibrary::new());
    let mut input = HoudiniInput::new(library.clone());

    let err = input.open(dir.path()).unwrap_err();
    assert!(matches!(err, IoError::NotRegularFile(_)));
    assert_eq!(library.open_count(), 0);
    assert!(!input.is_open());
}

#[test]
fn open_missing_file_fails() {
    let library = Arc::new(MemoryLibrary::new());
    let mut input = HoudiniInput::new(library.clone());
    let err = input.open(Path::new("/nonexistent/dir/missing.rat")).unwrap_err();
    assert!(matches!(err, IoError::NotRegularFile(_)));
    assert_eq!(library.open_count(), 0);
}

#[test]
fn valid_file_rejects_unknown_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = touch(&dir, "notes.pic");
    let mut input = HoudiniInput::new(Arc::new(MemoryLibrary::new()));

    assert!(!input.valid_file(&path));
    assert!(input.geterror().is_none());
    let err = input.check_file(&path).unwrap_err();
    assert!(matches!(err, IoError::UnsupportedFormat(_)));
    assert!(err.to_string().contains("notes.pic"));
}

#[test]
fn valid_file_accepts_known_file() {
    let (_dir, path, library, input) = open_with(three_depth_planes(), "depth.pic");
    assert!(input.valid_file(&path));
    assert_eq!(library.live_handles(), 0);
    assert!(!input.is_open());
}

#[test]
fn close_restores_fresh_state() {
    let image = MemoryImage::new(RAT_FORMAT_NAME, 8, 4)
        .with_image_type(ImgImageType::Deep)
        .with_blank_plane(ImgPlane::single("Pz", ImgDataType::Float32));
    let (_dir, path, library, mut input) = open_with(image, "deep.rat");
    let fresh = HoudiniInput::new(library.clone());

    let mut config = ImageSpec::default();
    config.set_attr("oiio:UnassociatedAlpha", 1);
    input.open_with_config(&path, &config).expect("open");
    assert!(input.is_deep());
    assert!(input.has_tile_handle());
    assert!(input.unassociated_alpha());
    assert_eq!(library.live_handles(), 2);

    input.close();
    assert_eq!(library.live_handles(), 0);
    assert_eq!(input.is_open(), fresh.is_open());
    assert_eq!(input.filename(), fresh.filename());
    assert_eq!(input.num_subimages(), fresh.num_subimages());
    assert_eq!(input.is_deep(), fresh.is_deep());
    assert_eq!(input.has_tile_handle(), fresh.has_tile_handle());
    assert_eq!(input.unassociated_alpha(), fresh.unassociated_alpha());
    assert_eq!(input.current_subimage(), fresh.current_subimage());
    assert_eq!(input.current_miplevel(), fresh.current_miplevel());
    assert_eq!(input.spec(), fresh.spec());
    assert_eq!(input.channel_formats(0), fresh.channel_formats(0));

    // Closing twice is harmless.
    input.close();
}

#[test]
fn config_without_alpha_hint_is_ignored() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");

    let mut config = ImageSpec::default();
    config.set_attr("oiio:UnassociatedAlpha", 0);
    let spec = input.open_with_config(&path, &config).expect("open");
    assert!(!input.unassociated_alpha());
    assert_eq!(spec.channel_names, vec!["Pz"]);

    let mut config = ImageSpec::default();
    config.set_attr("oiio:ioproxy", "none");
    config.set_attr("houdini:unknown", 3);
    let with_unknown = input.open_with_config(&path, &config).expect("reopen");
    assert!(!input.unassociated_alpha());
    assert!(with_unknown.get_attr("oiio:ioproxy").is_none());
    assert_eq!(with_unknown, input.open(&path).expect("plain open"));
}

#[test]
fn drop_releases_handles() {
    let image = MemoryImage::new(RAT_FORMAT_NAME, 8, 4)
        .with_blank_plane(ImgPlane::single("Pz", ImgDataType::Float32));
    let (_dir, path, library, mut input) = open_with(image, "a.rat");
    input.open(&path).expect("open");
    assert_eq!(library.live_handles(), 2);
    drop(input);
    assert_eq!(library.live_handles(), 0);
}

#[test]
fn rat_tile_open_failure_releases_scanline_handle() {
    let image = MemoryImage::new(RAT_FORMAT_NAME, 8, 4)
        .with_blank_plane(ImgPlane::single("Pz", ImgDataType::Float32))
        .refuse_tile_mode();
    let (_dir, path, library, mut input) = open_with(image, "a.rat");

    let err = input.open(&path).unwrap_err();
    assert!(matches!(err, IoError::UnsupportedFormat(_)));
    assert_eq!(library.open_count(), 2);
    assert_eq!(library.live_handles(), 0);
    assert!(!input.is_open());
    assert!(input.geterror().is_some());
}

#[test]
fn pic_opens_without_tile_handle() {
    let (_dir, path, library, mut input) = open_with(three_depth_planes(), "depth.pic");
    input.open(&path).expect("open");
    assert!(!input.has_tile_handle());
    assert!(!input.is_deep());
    assert_eq!(library.live_handles(), 1);
}

#[test]
fn deep_image_type_marks_spec() {
    let image = MemoryImage::new(RAT_FORMAT_NAME, 4, 4)
        .with_image_type(ImgImageType::Deep)
        .with_blank_plane(ImgPlane::single("Pz", ImgDataType::Float32));
    let (_dir, path, _lib, mut input) = open_with(image, "deep.rat");
    let spec = input.open(&path).expect("open");
    assert!(spec.deep);
}

#[test]
fn unknown_pixel_type_fails_seek() {
    let image = MemoryImage::new(PIC_FORMAT_NAME, 4, 4)
        .with_blank_plane(ImgPlane::single("Pz", ImgDataType::Float32))
        .with_plane(ImgPlane::single("X", ImgDataType::Other(77)), Vec::new());
    let (_dir, path, _lib, mut input) = open_with(image, "odd.pic");
    input.open(&path).expect("open");

    let err = input.seek_subimage(1, 0).unwrap_err();
    assert!(matches!(err, IoError::UnsupportedPixelType(_)));
    assert_eq!(input.current_subimage(), Some(0));
    assert_eq!(input.channel_formats(1), None);
}

#[test]
fn unknown_pixel_type_in_first_plane_fails_open() {
    let image = MemoryImage::new(PIC_FORMAT_NAME, 4, 4)
        .with_plane(ImgPlane::single("X", ImgDataType::Other(77)), Vec::new());
    let (_dir, path, library, mut input) = open_with(image, "odd.pic");
    assert!(input.open(&path).is_err());
    assert!(!input.is_open());
    assert_eq!(library.live_handles(), 0);
}

#[test]
fn empty_file_fails_open() {
    let image = MemoryImage::new(PIC_FORMAT_NAME, 4, 4);
    let (_dir, path, library, mut input) = open_with(image, "empty.pic");
    let err = input.open(&path).unwrap_err();
    assert!(matches!(err, IoError::OutOfRange { what: "subimage", .. }));
    assert_eq!(library.live_handles(), 0);
}

#[test]
fn scanlines_are_top_down() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");
    input.open(&path).expect("open");
    input.seek_subimage(1, 0).expect("seek");

    let mut row = vec![0u8; 64 * 4];
    input.read_native_scanline(0, 0, &mut row).expect("row 0");
    assert!(f32_row(&row).iter().all(|&v| v == 0.0));

    input.read_native_scanline(31, 0, &mut row).expect("row 31");
    assert!(f32_row(&row).iter().all(|&v| v == 31.0));
}

#[test]
fn scanline_follows_selected_plane() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");
    let spec = input.open(&path).expect("open");
    let mut row = vec![0u8; spec.bytes_per_row()];

    input.read_native_scanline(5, 0, &mut row).expect("plane 0");
    assert_relative_eq!(f32_row(&row)[3], 8.0);

    input.seek_subimage(2, 0).expect("seek");
    input.read_native_scanline(5, 0, &mut row).expect("plane 2");
    assert_relative_eq!(f32_row(&row)[3], 3.0);
}

#[test]
fn multi_component_rows_interleave() {
    let image = MemoryImage::new(PIC_FORMAT_NAME, 2, 2).with_plane_fn(
        ImgPlane::new("C", ImgDataType::Int32, ["r", "g", "b"]),
        |x, y, c| (100 * y + 10 * x) as f64 + c as f64,
    );
    let (_dir, path, _lib, mut input) = open_with(image, "c.pic");
    let spec = input.open(&path).expect("open");
    assert_eq!(spec.bytes_per_row(), 2 * 3 * 4);

    let mut row = vec![0u8; spec.bytes_per_row()];
    input.read_native_scanline(1, 0, &mut row).expect("row");
    let values: Vec<i32> = row
        .chunks_exact(4)
        .map(|b| i32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    assert_eq!(values, vec![100, 101, 102, 110, 111, 112]);
}

#[test]
fn scanline_errors() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");
    let mut row = vec![0u8; 64 * 4];
    assert!(matches!(
        input.read_native_scanline(0, 0, &mut row),
        Err(IoError::NoSubimage)
    ));

    input.open(&path).expect("open");
    assert!(matches!(
        input.read_native_scanline(32, 0, &mut row),
        Err(IoError::OutOfRange { what: "scanline", .. })
    ));
    let mut short = vec![0u8; 10];
    assert!(matches!(
        input.read_native_scanline(0, 0, &mut short),
        Err(IoError::BufferTooSmall { needed: 256, actual: 10 })
    ));
}

#[test]
fn seek_before_open_fails() {
    let mut input = HoudiniInput::new(Arc::new(MemoryLibrary::new()));
    assert!(matches!(input.seek_subimage(0, 0), Err(IoError::NotOpen)));
}

#[test]
fn tiled_and_batch_reads_unsupported() {
    let image = MemoryImage::new(RAT_FORMAT_NAME, 8, 4)
        .with_blank_plane(ImgPlane::single("Pz", ImgDataType::Float32));
    let (_dir, path, _lib, mut input) = open_with(image, "a.rat");
    input.open(&path).expect("open");

    let mut buf = vec![0u8; 1024];
    assert!(matches!(
        input.read_native_scanlines(0, 2, 0, &mut buf),
        Err(IoError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        input.read_native_tile(0, 0, 0, &mut buf),
        Err(IoError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        input.read_native_tiles(0, 8, 0, 4, 0, 1, &mut buf),
        Err(IoError::UnsupportedOperation(_))
    ));
}

#[test]
fn resolution_attributes() {
    let (_dir, path, _lib, mut input) = open_with(three_depth_planes(), "depth.pic");
    let spec = input.open(&path).expect("open");
    assert_relative_eq!(spec.get_float("XResolution").unwrap(), 1.0);
    assert_relative_eq!(spec.get_float("YResolution").unwrap(), 1.0);
    assert_eq!(spec.get_string("ResolutionUnit"), Some("m"));
}

#[test]
fn metadata_copied_under_namespace() {
    let xform = DMat4::from_translation(DVec3::new(4.0, 5.0, 6.0));
    let image = MemoryImage::new(RAT_FORMAT_NAME, 4, 4)
        .with_blank_plane(ImgPlane::single("Pz", ImgDataType::Float32))
        .with_option("software", "mantra")
        .with_option("frame", "12")
        .with_structured_option("worldToCamera", OptionValue::Matrix4(xform))
        .with_structured_option("fstop", OptionValue::Real(5.6))
        .with_structured_option("samples", OptionValue::Int(64))
        .with_structured_option("clip", OptionValue::Vector2(glam::DVec2::new(0.1, 1000.0)))
        .with_structured_option("tint", OptionValue::Vector4(DVec4::ONE))
        .with_structured_option("interactive", OptionValue::Bool(false));
    let (_dir, path, _lib, mut input) = open_with(image, "meta.rat");
    let spec = input.open(&path).expect("open");

    assert_eq!(spec.get_string("houdini:software"), Some("mantra"));
    assert_eq!(spec.get_string("houdini:frame"), Some("12"));
    assert_relative_eq!(spec.get_float("houdini:fstop").unwrap(), 5.6);
    assert_eq!(spec.get_int("houdini:samples"), Some(64));
    assert_eq!(spec.get_attr("houdini:clip"), Some(&AttrValue::Vector2([0.1, 1000.0])));
    match spec.get_attr("houdini:worldToCamera") {
        Some(AttrValue::Matrix4(m)) => {
            assert_eq!(m[3], 4.0);
            assert_eq!(m[7], 5.0);
            assert_eq!(m[11], 6.0);
        }
        other => panic!("expected matrix4, got {other:?}"),
    }
    assert!(spec.get_attr("houdini:tint").is_none());
    assert!(spec.get_attr("houdini:interactive").is_none());
    assert_eq!(spec.attrs_in_namespace("houdini").count(), 6);
}

#[test]
fn reopen_resets_selection() {
    let (_dir, path, library, mut input) = open_with(three_depth_planes(), "depth.pic");
    input.open(&path).expect("open");
    input.seek_subimage(2, 0).expect("seek");

    let spec = input.open(&path).expect("reopen");
    assert_eq!(input.current_subimage(), Some(0));
    assert_eq!(spec.channel_names, vec!["Pz"]);
    assert_eq!(library.live_handles(), 1);
    assert!(!input.unassociated_alpha());
}
