//! Font faces, text measurement and PDF font resources
//!
//! Two weights are available on every page. By default they are the
//! builtin Helvetica faces measured from their AFM widths; a TrueType file
//! can replace either one, in which case widths come from `ttf-parser` and
//! the file is embedded as a simple WinAnsi font.

use pdf_writer::types::FontFlags;
use pdf_writer::{Filter, Finish, Name, Pdf, Rect as PdfRect};
use ttf_parser::Face;

use crate::config::RenderOptions;
use crate::error::{RendererError, RendererResult};
use crate::serializer::{deflate, RefAllocator};
use crate::winansi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontWeight {
    /// Page resource name for the weight.
    pub fn resource_name(self) -> Name<'static> {
        match self {
            FontWeight::Regular => Name(b"F1"),
            FontWeight::Bold => Name(b"F2"),
        }
    }
}

// Advance widths (1/1000 em) for WinAnsi codes 0x20..=0xFF. 0x7F is unused.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    556, 350, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

#[derive(Debug, Clone)]
struct EmbeddedFace {
    data: Vec<u8>,
    postscript_name: String,
    /// Widths for WinAnsi codes 32..=255.
    widths: Vec<f32>,
    ascent: f32,
    descent: f32,
    cap_height: f32,
    bbox: [f32; 4],
}

#[derive(Debug, Clone)]
enum FaceSource {
    Builtin {
        base_font: &'static [u8],
        widths: &'static [u16; 224],
    },
    TrueType(Box<EmbeddedFace>),
}

#[derive(Debug, Clone)]
pub struct FontFace {
    source: FaceSource,
}

impl FontFace {
    pub fn helvetica() -> Self {
        Self {
            source: FaceSource::Builtin {
                base_font: b"Helvetica",
                widths: &HELVETICA_WIDTHS,
            },
        }
    }

    pub fn helvetica_bold() -> Self {
        Self {
            source: FaceSource::Builtin {
                base_font: b"Helvetica-Bold",
                widths: &HELVETICA_BOLD_WIDTHS,
            },
        }
    }

    /// Parse a TrueType/OpenType file and build its WinAnsi width table.
    pub fn from_truetype(data: Vec<u8>) -> RendererResult<Self> {
        let face = Face::parse(&data, 0)
            .map_err(|e| RendererError::Font(format!("Invalid font file: {}", e)))?;
        let scale = 1000.0 / face.units_per_em() as f32;

        let fallback = face.glyph_hor_advance(ttf_parser::GlyphId(0)).unwrap_or(0) as f32 * scale;
        let widths = (32u8..=255)
            .map(|code| {
                winansi::decode_byte(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 * scale)
                    .unwrap_or(fallback)
            })
            .collect();

        let postscript_name = face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
            .map(|name| name.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect::<String>())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(face.ascender()) as f32 * scale;
        let ascent = face.ascender() as f32 * scale;
        let descent = face.descender() as f32 * scale;
        let bbox = [
            bbox.x_min as f32 * scale,
            bbox.y_min as f32 * scale,
            bbox.x_max as f32 * scale,
            bbox.y_max as f32 * scale,
        ];
        drop(face);
        let embedded = EmbeddedFace {
            data,
            postscript_name,
            widths,
            ascent,
            descent,
            cap_height,
            bbox,
        };
        Ok(Self {
            source: FaceSource::TrueType(Box::new(embedded)),
        })
    }

    /// Advance width of one character in 1/1000 em.
    fn char_width(&self, ch: char) -> f32 {
        match &self.source {
            FaceSource::Builtin { widths, .. } => match winansi::encode_char(ch) {
                Some(code) if code >= 32 && code != 0x7F => widths[(code - 32) as usize] as f32,
                _ => widths[(b'?' - 32) as usize] as f32,
            },
            FaceSource::TrueType(face) => match winansi::encode_char(ch) {
                Some(code) if code >= 32 => face.widths[(code - 32) as usize],
                _ => face.widths[(b'?' - 32) as usize],
            },
        }
    }

    /// Width of `text` in points at `size`.
    pub fn measure(&self, text: &str, size: f64) -> f64 {
        let units: f32 = text.chars().map(|ch| self.char_width(ch)).sum();
        units as f64 * size / 1000.0
    }

    fn write(&self, pdf: &mut Pdf, refs: &mut RefAllocator) -> pdf_writer::Ref {
        let font_id = refs.next();
        match &self.source {
            FaceSource::Builtin { base_font, .. } => {
                let mut font = pdf.type1_font(font_id);
                font.base_font(Name(*base_font));
                font.pair(Name(b"Encoding"), Name(b"WinAnsiEncoding"));
                font.finish();
            }
            FaceSource::TrueType(face) => {
                let descriptor_id = refs.next();
                let file_id = refs.next();
                let ps_name = face.postscript_name.as_bytes();

                // pdf-writer has no typed writer for simple TrueType fonts.
                let mut font = pdf.indirect(font_id).dict();
                font.pair(Name(b"Type"), Name(b"Font"));
                font.pair(Name(b"Subtype"), Name(b"TrueType"));
                font.pair(Name(b"BaseFont"), Name(ps_name));
                font.pair(Name(b"FirstChar"), 32);
                font.pair(Name(b"LastChar"), 255);
                font.insert(Name(b"Widths"))
                    .array()
                    .items(face.widths.iter().copied());
                font.pair(Name(b"FontDescriptor"), descriptor_id);
                font.pair(Name(b"Encoding"), Name(b"WinAnsiEncoding"));
                font.finish();

                let mut descriptor = pdf.font_descriptor(descriptor_id);
                descriptor
                    .name(Name(ps_name))
                    .flags(FontFlags::NON_SYMBOLIC)
                    .bbox(PdfRect::new(face.bbox[0], face.bbox[1], face.bbox[2], face.bbox[3]))
                    .italic_angle(0.0)
                    .ascent(face.ascent)
                    .descent(face.descent)
                    .cap_height(face.cap_height)
                    .stem_v(80.0)
                    .font_file2(file_id);
                descriptor.finish();

                let compressed = deflate(&face.data);
                pdf.stream(file_id, &compressed)
                    .filter(Filter::FlateDecode)
                    .pair(Name(b"Length1"), face.data.len() as i32);
            }
        }
        font_id
    }
}

/// The regular and bold faces used for one document.
#[derive(Debug, Clone)]
pub struct FontSet {
    regular: FontFace,
    bold: FontFace,
}

impl Default for FontSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FontSet {
    pub fn builtin() -> Self {
        Self {
            regular: FontFace::helvetica(),
            bold: FontFace::helvetica_bold(),
        }
    }

    /// Builtin faces, replaced by the TrueType files named in the options.
    pub fn from_options(options: &RenderOptions) -> RendererResult<Self> {
        let mut set = Self::builtin();
        if let Some(path) = &options.font_regular_path {
            set.regular = FontFace::from_truetype(load_font_file(path)?)?;
        }
        if let Some(path) = &options.font_bold_path {
            set.bold = FontFace::from_truetype(load_font_file(path)?)?;
        }
        Ok(set)
    }

    pub fn face(&self, weight: FontWeight) -> &FontFace {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }

    pub fn measure(&self, text: &str, size: f64, weight: FontWeight) -> f64 {
        self.face(weight).measure(text, size)
    }

    /// Write both faces and return `(resource name, object)` pairs for the page.
    pub fn write_resources(
        &self,
        pdf: &mut Pdf,
        refs: &mut RefAllocator,
    ) -> Vec<(Name<'static>, pdf_writer::Ref)> {
        [FontWeight::Regular, FontWeight::Bold]
            .into_iter()
            .map(|weight| (weight.resource_name(), self.face(weight).write(pdf, refs)))
            .collect()
    }
}

/// Load a TTF/OTF file from disk.
pub fn load_font_file(path: &str) -> RendererResult<Vec<u8>> {
    let data = std::fs::read(path)
        .map_err(|e| RendererError::Font(format!("Failed to read font file {}: {}", path, e)))?;
    Face::parse(&data, 0)
        .map_err(|e| RendererError::Font(format!("Invalid font file {}: {}", path, e)))?;
    Ok(data)
}
