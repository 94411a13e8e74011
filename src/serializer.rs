//! Turns a finished page canvas into PDF bytes

use log::debug;
use pdf_writer::{Filter, Finish, Name, Pdf, Rect as PdfRect, Ref, TextStr};

use crate::canvas::{PageCanvas, PlacedImage};
use crate::error::{RendererError, RendererResult};
use crate::image_embed::ImagePixels;

const COMPRESSION_LEVEL: u8 = 6;

/// Hands out consecutive indirect object ids.
pub struct RefAllocator {
    next_ref_id: i32,
}

impl RefAllocator {
    pub fn new(start: i32) -> Self {
        Self { next_ref_id: start }
    }

    pub fn next(&mut self) -> Ref {
        let r = Ref::new(self.next_ref_id);
        self.next_ref_id += 1;
        r
    }
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, COMPRESSION_LEVEL)
}

/// Metadata written to the document information dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    /// Kind of document, e.g. "bulletin" or "timetable".
    pub creator: String,
}

fn write_image(pdf: &mut Pdf, refs: &mut RefAllocator, placed: &PlacedImage) -> RendererResult<Ref> {
    let image = &placed.image;
    if image.width == 0 || image.height == 0 {
        return Err(RendererError::Image(format!("image {} has no pixels", placed.name)));
    }
    let id = refs.next();
    let (width, height) = (image.width as i32, image.height as i32);

    match &image.pixels {
        ImagePixels::Jpeg { data, components } => {
            let mut xobject = pdf.image_xobject(id, data);
            xobject.filter(Filter::DctDecode);
            xobject.width(width);
            xobject.height(height);
            match components {
                1 => {
                    xobject.color_space().device_gray();
                }
                4 => {
                    xobject.color_space().device_cmyk();
                    // Adobe CMYK JPEGs are stored inverted.
                    xobject.decode([1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
                }
                _ => {
                    xobject.color_space().device_rgb();
                }
            }
            xobject.bits_per_component(8);
        }
        ImagePixels::Gray(pixels) => {
            let compressed = deflate(pixels);
            let mut xobject = pdf.image_xobject(id, &compressed);
            xobject.filter(Filter::FlateDecode);
            xobject.width(width);
            xobject.height(height);
            xobject.color_space().device_gray();
            xobject.bits_per_component(8);
        }
        ImagePixels::Rgb { rgb, alpha } => {
            let smask_id = alpha.as_ref().map(|alpha| {
                let smask_id = refs.next();
                let compressed = deflate(alpha);
                let mut smask = pdf.image_xobject(smask_id, &compressed);
                smask.filter(Filter::FlateDecode);
                smask.width(width);
                smask.height(height);
                smask.color_space().device_gray();
                smask.bits_per_component(8);
                smask.finish();
                smask_id
            });
            let compressed = deflate(rgb);
            let mut xobject = pdf.image_xobject(id, &compressed);
            xobject.filter(Filter::FlateDecode);
            xobject.width(width);
            xobject.height(height);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
            if let Some(smask_id) = smask_id {
                xobject.s_mask(smask_id);
            }
        }
    }
    Ok(id)
}

/// Serialize a single-page document.
pub fn finalize(canvas: PageCanvas, info: &DocumentInfo) -> RendererResult<Vec<u8>> {
    let (content, images, fonts, size) = canvas.finish();

    let mut pdf = Pdf::new();
    let mut refs = RefAllocator::new(1);
    let catalog_id = refs.next();
    let page_tree_id = refs.next();
    let page_id = refs.next();
    let content_id = refs.next();
    let info_id = refs.next();

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let font_refs = fonts.write_resources(&mut pdf, &mut refs);
    let mut image_refs = Vec::with_capacity(images.len());
    for placed in &images {
        image_refs.push((placed.name.as_str(), write_image(&mut pdf, &mut refs, placed)?));
    }

    {
        let mut page = pdf.page(page_id);
        page.media_box(PdfRect::new(0.0, 0.0, size.width as f32, size.height as f32));
        page.parent(page_tree_id);
        page.contents(content_id);
        let mut resources = page.resources();
        {
            let mut dict = resources.fonts();
            for (name, id) in &font_refs {
                dict.pair(*name, *id);
            }
        }
        if !image_refs.is_empty() {
            let mut dict = resources.x_objects();
            for (name, id) in &image_refs {
                dict.pair(Name(name.as_bytes()), *id);
            }
        }
    }

    let compressed = deflate(&content);
    pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);

    pdf.document_info(info_id)
        .title(TextStr(&info.title))
        .author(TextStr(&info.author))
        .creator(TextStr(&info.creator))
        .producer(TextStr(concat!("school-pdf-renderer ", env!("CARGO_PKG_VERSION"))));

    let bytes = pdf.finish();
    debug!(
        "serialized '{}' ({} bytes, {} images)",
        info.title,
        bytes.len(),
        images.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontSet;
    use crate::image_embed::DecodedImage;
    use crate::types::{Margins, Size};

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_ref_allocator_is_sequential() {
        let mut refs = RefAllocator::new(5);
        assert_eq!(refs.next(), Ref::new(5));
        assert_eq!(refs.next(), Ref::new(6));
    }

    #[test]
    fn test_finalize_writes_complete_document() {
        let mut canvas = PageCanvas::new(Size::new(200.0, 200.0), Margins::uniform(10.0), FontSet::builtin());
        canvas.draw_string(20.0, 100.0, "Bulletin", 12.0, crate::fonts::FontWeight::Bold);
        let name = canvas.register_image(DecodedImage {
            width: 2,
            height: 1,
            pixels: ImagePixels::Rgb {
                rgb: vec![0; 6],
                alpha: Some(vec![255, 0]),
            },
        });
        canvas.draw_image(&name, 20.0, 20.0, 20.0, 10.0);

        let info = DocumentInfo {
            title: "Bulletin T1".to_string(),
            author: "Lycee".to_string(),
            creator: "bulletin".to_string(),
        };
        let bytes = finalize(canvas, &info).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"%%EOF"));
        assert!(contains(&bytes, b"/Helvetica-Bold"));
        assert!(contains(&bytes, b"/WinAnsiEncoding"));
        assert!(contains(&bytes, b"/SMask"));
        assert!(contains(&bytes, b"/Im1"));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let mut canvas = PageCanvas::new(Size::new(100.0, 100.0), Margins::uniform(5.0), FontSet::builtin());
        canvas.register_image(DecodedImage {
            width: 0,
            height: 0,
            pixels: ImagePixels::Gray(vec![]),
        });
        assert!(matches!(
            finalize(canvas, &DocumentInfo::default()),
            Err(RendererError::Image(_))
        ));
    }
}
