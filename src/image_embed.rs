//! Image resolution, validation, decoding and aspect-fit sizing
//!
//! `embed` never fails loudly: every recoverable problem (missing reference,
//! network error, wrong content type, oversize, unknown or corrupt data) is
//! logged as a warning and yields `None`, and the caller draws without it.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::GenericImageView;
use log::{debug, warn};

use crate::config::RenderOptions;
use crate::error::{RendererError, RendererResult};
use crate::fetch::{fetch_with_deadline, is_remote, Deadline};

/// What an image is used for. Only affects logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Logo,
    Photo,
    Signature,
}

impl ImageKind {
    fn as_str(self) -> &'static str {
        match self {
            ImageKind::Logo => "logo",
            ImageKind::Photo => "photo",
            ImageKind::Signature => "signature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
}

/// Pixel payload ready to be written as an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixels {
    /// Baseline JPEG passed through untouched.
    Jpeg { data: Vec<u8>, components: u8 },
    Gray(Vec<u8>),
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: ImagePixels,
}

impl DecodedImage {
    pub fn from_gray(image: &image::GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: ImagePixels::Gray(image.as_raw().clone()),
        }
    }
}

type Decoder = fn(&[u8]) -> RendererResult<DecodedImage>;

/// One supported raster format.
pub struct ImageSignature {
    pub format: RasterFormat,
    pub extensions: &'static [&'static str],
    pub magic: &'static [u8],
    pub decode: Decoder,
}

/// Supported formats, checked in order.
pub static SIGNATURES: [ImageSignature; 2] = [
    ImageSignature {
        format: RasterFormat::Png,
        extensions: &["png"],
        magic: &[0x89, 0x50, 0x4E, 0x47],
        decode: decode_png,
    },
    ImageSignature {
        format: RasterFormat::Jpeg,
        extensions: &["jpg", "jpeg", "jpe"],
        magic: &[0xFF, 0xD8, 0xFF],
        decode: decode_jpeg,
    },
];

fn extension_of(source: &str) -> Option<String> {
    // Strip query and fragment so remote URLs are matched on their path.
    let path = source.split(['?', '#']).next().unwrap_or(source);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Match by extension first, then by leading magic bytes.
pub fn detect_format(source: &str, bytes: &[u8]) -> Option<&'static ImageSignature> {
    if let Some(ext) = extension_of(source) {
        if let Some(sig) = SIGNATURES.iter().find(|s| s.extensions.contains(&ext.as_str())) {
            return Some(sig);
        }
    }
    SIGNATURES.iter().find(|s| bytes.starts_with(s.magic))
}

fn decode_png(bytes: &[u8]) -> RendererResult<DecodedImage> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| RendererError::Image(format!("Failed to decode PNG: {}", e)))?;
    let (width, height) = img.dimensions();

    let pixels = if img.color().has_alpha() {
        let rgba = img.to_rgba8().into_raw();
        let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(rgba.len() / 4);
        for px in rgba.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }
        ImagePixels::Rgb {
            rgb,
            alpha: Some(alpha),
        }
    } else {
        ImagePixels::Rgb {
            rgb: img.to_rgb8().into_raw(),
            alpha: None,
        }
    };
    Ok(DecodedImage { width, height, pixels })
}

fn decode_jpeg(bytes: &[u8]) -> RendererResult<DecodedImage> {
    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(bytes));
    decoder
        .decode()
        .map_err(|e| RendererError::Image(format!("Failed to decode JPEG: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| RendererError::Image("JPEG has no frame header".to_string()))?;
    let components = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => 1,
        jpeg_decoder::PixelFormat::RGB24 => 3,
        jpeg_decoder::PixelFormat::CMYK32 => 4,
        other => {
            return Err(RendererError::Image(format!(
                "Unsupported JPEG pixel format: {:?}",
                other
            )))
        }
    };
    Ok(DecodedImage {
        width: info.width as u32,
        height: info.height as u32,
        pixels: ImagePixels::Jpeg {
            data: bytes.to_vec(),
            components,
        },
    })
}

/// Largest size that keeps the aspect ratio and fits `max_w` × `max_h`.
///
/// Width is constrained first, then height. Images smaller than the box are
/// not enlarged.
pub fn calculate_aspect_fit_dimensions(
    intrinsic_w: f64,
    intrinsic_h: f64,
    max_w: f64,
    max_h: f64,
) -> (f64, f64) {
    if intrinsic_w <= 0.0 || intrinsic_h <= 0.0 || max_w <= 0.0 || max_h <= 0.0 {
        return (0.0, 0.0);
    }
    let aspect_ratio = intrinsic_w / intrinsic_h;
    let (mut w, mut h) = (intrinsic_w, intrinsic_h);
    if w > max_w {
        w = max_w;
        h = w / aspect_ratio;
    }
    if h > max_h {
        h = max_h;
        w = h * aspect_ratio;
    }
    (w, h)
}

/// Resolves and decodes image references for one generation call.
#[derive(Debug, Clone)]
pub struct ImageEmbedder {
    deadline: Deadline,
    base_dir: Option<PathBuf>,
}

impl ImageEmbedder {
    pub fn new(deadline: Deadline) -> Self {
        Self {
            deadline,
            base_dir: None,
        }
    }

    pub fn from_options(options: &RenderOptions) -> Self {
        Self::new(Deadline {
            timeout: options.fetch_timeout(),
            max_bytes: options.max_image_bytes,
            user_agent: options.user_agent.clone(),
        })
    }

    /// Directory that relative local references are resolved against
    /// (the process working directory when unset).
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn embed(&self, source: Option<&str>, kind: ImageKind) -> Option<DecodedImage> {
        let source = source.map(str::trim).filter(|s| !s.is_empty())?;
        match self.load(source, kind) {
            Ok(image) => {
                debug!(
                    "embedded {} {} ({}x{})",
                    kind.as_str(),
                    source,
                    image.width,
                    image.height
                );
                Some(image)
            }
            Err(err) => {
                warn!("skipping {} '{}': {}", kind.as_str(), source, err);
                None
            }
        }
    }

    fn load(&self, source: &str, kind: ImageKind) -> RendererResult<DecodedImage> {
        let bytes = if is_remote(source) {
            self.read_remote(source)?
        } else {
            self.read_local(source)?
        };
        let signature = detect_format(source, &bytes).ok_or_else(|| {
            RendererError::Image(format!("unrecognized image format for {}", kind.as_str()))
        })?;
        (signature.decode)(&bytes)
    }

    fn read_remote(&self, url: &str) -> RendererResult<Vec<u8>> {
        let fetched = fetch_with_deadline(url, &self.deadline)?;
        match fetched.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => Ok(fetched.bytes),
            other => Err(RendererError::Image(format!(
                "content type {:?} is not an image",
                other
            ))),
        }
    }

    fn resolve(&self, path: &str) -> RendererResult<PathBuf> {
        let path = Path::new(path);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(base.join(path))
    }

    fn read_local(&self, path: &str) -> RendererResult<Vec<u8>> {
        let resolved = self.resolve(path)?;
        let meta = std::fs::metadata(&resolved)?;
        if !meta.is_file() {
            return Err(RendererError::Image(format!(
                "{} is not a file",
                resolved.display()
            )));
        }
        if meta.len() > self.deadline.max_bytes {
            return Err(RendererError::Image(format!(
                "{} is {} bytes, limit is {}",
                resolved.display(),
                meta.len(),
                self.deadline.max_bytes
            )));
        }
        Ok(std::fs::read(&resolved)?)
    }
}
