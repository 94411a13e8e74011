//! Section blocks shared by the bulletin and timetable composers
//!
//! Every block draws inside the rectangle its layout section was given and
//! nowhere else.

use crate::canvas::PageCanvas;
use crate::config::RenderOptions;
use crate::error::RendererResult;
use crate::fonts::FontSet;
use crate::image_embed::{calculate_aspect_fit_dimensions, DecodedImage};
use crate::labels::Labels;
use crate::layout::Section;
use crate::model::OrganizationRecord;
use crate::primitives::{draw_image, draw_line, draw_rect, draw_text, Align, LineStyle, RectStyle, TextOptions};
use crate::types::{Color, Margins, Rect};
use crate::verification::VerificationRecord;

pub const BAND_FILL: Color = Color::gray(0.86);
pub const SHADE_FILL: Color = Color::gray(0.95);
pub const RULE_COLOR: Color = Color::gray(0.55);
pub const MUTED_TEXT: Color = Color::gray(0.35);

/// Largest square the QR is displayed at.
const QR_DISPLAY_MAX: f64 = 56.0;

pub const PAGE_MARGIN: f64 = 36.0;

/// Blank page sized and fonted from the options.
pub fn page_canvas(options: &RenderOptions) -> RendererResult<PageCanvas> {
    Ok(PageCanvas::new(
        options.page_size(),
        Margins::uniform(PAGE_MARGIN),
        FontSet::from_options(options)?,
    ))
}

/// Full-width rectangle of a planned section.
pub fn section_rect(canvas: &PageCanvas, section: &Section) -> Rect {
    let content = canvas.content_rect();
    Rect::new(content.x, section.bottom(), content.width, section.height)
}

/// Place `image` aspect-fit and centered inside `area`.
pub fn draw_image_fitted(canvas: &mut PageCanvas, image: DecodedImage, area: Rect) -> Rect {
    let (w, h) = calculate_aspect_fit_dimensions(image.width as f64, image.height as f64, area.width, area.height);
    let placed = Rect::new(area.x + (area.width - w) / 2.0, area.y + (area.height - h) / 2.0, w, h);
    draw_image(canvas, image, placed.x, placed.y, placed.width, placed.height);
    placed
}

/// Organization identity: official offices, name, motto and contact, with
/// the logo on the left.
pub fn draw_header(
    canvas: &mut PageCanvas,
    section: &Section,
    org: &OrganizationRecord,
    logo: Option<DecodedImage>,
    options: &RenderOptions,
    labels: &Labels,
) {
    let area = section_rect(canvas, section);
    let logo_w = options.logo_max_width.min(area.width * 0.25);
    let logo_h = options.logo_max_height.min(area.height - 4.0);

    let pad = match logo {
        Some(logo) => {
            let box_ = Rect::new(area.x, area.top() - 2.0 - logo_h, logo_w, logo_h);
            draw_image_fitted(canvas, logo, box_);
            logo_w + 8.0
        }
        None => 0.0,
    };
    let text_x = area.x + pad;
    let text_w = area.width - 2.0 * pad;

    let offices: Vec<String> = [
        (labels.regional_office, &org.regional_office),
        (labels.departmental_office, &org.departmental_office),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}: {}", label, v))
    })
    .collect();

    let small = TextOptions::sized(7.5).within(text_w, Align::Center).color(MUTED_TEXT);
    let mut baseline = area.top() - 9.0;
    if !offices.is_empty() {
        draw_text(canvas, &offices.join("  |  "), text_x, baseline, &small);
    }
    baseline -= 17.0;
    draw_text(
        canvas,
        &org.name.to_uppercase(),
        text_x,
        baseline,
        &TextOptions::sized(13.0).bold().within(text_w, Align::Center),
    );
    baseline -= 13.0;
    if let Some(motto) = &org.motto {
        draw_text(canvas, motto, text_x, baseline, &TextOptions::sized(8.0).within(text_w, Align::Center));
    }
    baseline -= 12.0;
    draw_text(canvas, &org.contact_line(), text_x, baseline, &small);

    let rule_y = area.bottom() + 1.0;
    draw_line(
        canvas,
        area.left(),
        rule_y,
        area.right(),
        rule_y,
        &LineStyle {
            color: Color::black(),
            thickness: 0.8,
        },
    );
}

/// Document title with a centered subtitle line beneath it.
pub fn draw_title(canvas: &mut PageCanvas, section: &Section, title: &str, subtitle: &str) {
    let area = section_rect(canvas, section);
    draw_text(
        canvas,
        title,
        area.x,
        area.top() - 14.0,
        &TextOptions::sized(14.0).bold().within(area.width, Align::Center),
    );
    draw_text(
        canvas,
        subtitle,
        area.x,
        area.top() - 28.0,
        &TextOptions::sized(10.0).within(area.width, Align::Center),
    );
}

pub struct SignatureBlock {
    pub title: String,
    pub name: Option<String>,
    pub image: Option<DecodedImage>,
}

/// Side by side signature blocks: title on top, optional image, a rule and
/// the signatory's name.
pub fn draw_signatures(canvas: &mut PageCanvas, section: &Section, blocks: Vec<SignatureBlock>) {
    if blocks.is_empty() {
        return;
    }
    let area = section_rect(canvas, section);
    let block_w = area.width / blocks.len() as f64;
    let inner_w = block_w - 20.0;

    for (i, block) in blocks.into_iter().enumerate() {
        let x = area.x + i as f64 * block_w;
        draw_text(
            canvas,
            &block.title,
            x,
            area.top() - 10.0,
            &TextOptions::sized(8.5).bold().within(block_w, Align::Center),
        );
        let image_area = Rect::new(x + 10.0, area.bottom() + 16.0, inner_w, area.height - 32.0);
        if let Some(image) = block.image {
            if image_area.height > 0.0 {
                draw_image_fitted(canvas, image, image_area);
            }
        }
        let rule_y = area.bottom() + 14.0;
        draw_line(
            canvas,
            x + 16.0,
            rule_y,
            x + block_w - 16.0,
            rule_y,
            &LineStyle {
                color: RULE_COLOR,
                thickness: 0.5,
            },
        );
        if let Some(name) = &block.name {
            draw_text(
                canvas,
                name,
                x,
                area.bottom() + 4.0,
                &TextOptions::sized(8.0).within(block_w, Align::Center),
            );
        }
    }
}

/// Verification code, scannable image, authenticity text and contact line.
pub fn draw_footer(
    canvas: &mut PageCanvas,
    section: &Section,
    org: &OrganizationRecord,
    verification: &VerificationRecord,
    labels: &Labels,
    show_scannable: bool,
) {
    let area = section_rect(canvas, section);
    draw_line(
        canvas,
        area.left(),
        area.top() - 1.0,
        area.right(),
        area.top() - 1.0,
        &LineStyle {
            color: RULE_COLOR,
            thickness: 0.5,
        },
    );

    let qr_side = QR_DISPLAY_MAX.min(area.height - 6.0);
    let mut text_x = area.x;
    if show_scannable && qr_side > 0.0 {
        if let Some(scannable) = &verification.scannable {
            let image = DecodedImage::from_gray(scannable);
            draw_image(canvas, image, area.x, area.bottom() + 2.0, qr_side, qr_side);
            text_x += qr_side + 10.0;
        }
    }
    let text_w = area.right() - text_x;
    let code_line = format!("{}: {}", labels.verification_code, verification.code);
    let contact = [org.name.trim().to_string(), org.contact_line()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" - ");
    let small = TextOptions::sized(7.0).within(text_w, Align::Left).color(MUTED_TEXT);

    if area.height >= 50.0 {
        draw_text(canvas, &code_line, text_x, area.top() - 14.0, &TextOptions::sized(9.0).bold().within(text_w, Align::Left));
        draw_text(canvas, labels.authenticity, text_x, area.top() - 27.0, &small);
        draw_text(canvas, &verification.url, text_x, area.top() - 37.0, &small);
        draw_text(canvas, &contact, text_x, area.top() - 50.0, &small);
    } else {
        let code_w = draw_text(canvas, &code_line, text_x, area.top() - 11.0, &TextOptions::sized(8.0).bold().within(text_w, Align::Left)).width;
        let rest_x = text_x + code_w + 8.0;
        if rest_x < area.right() {
            draw_text(
                canvas,
                labels.authenticity,
                rest_x,
                area.top() - 11.0,
                &TextOptions::sized(6.5).within(area.right() - rest_x, Align::Left).color(MUTED_TEXT),
            );
        }
        draw_text(canvas, &contact, text_x, area.top() - 22.0, &small);
    }
}

/// Filled band with a thin border, used for table headers and summaries.
pub fn draw_band(canvas: &mut PageCanvas, rect: Rect, fill: Color) {
    draw_rect(canvas, rect, &RectStyle::filled(fill).with_border(RULE_COLOR, 0.5));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;
    use crate::layout::SectionKind;
    use crate::types::Size;
    use crate::verification::{build_verification, VerificationKey};

    fn canvas() -> PageCanvas {
        PageCanvas::new(Size::new(595.28, 841.89), Margins::uniform(36.0), FontSet::builtin())
    }

    fn section(kind: SectionKind, top: f64, height: f64) -> Section {
        Section {
            kind,
            min_height: height,
            height,
            top,
        }
    }

    fn assert_inside(canvas: &PageCanvas, area: Rect) {
        for drawn in canvas.drawn_bounds() {
            assert!(area.contains(drawn), "{:?} escapes {:?}", drawn, area);
        }
    }

    fn org() -> OrganizationRecord {
        OrganizationRecord {
            id: 1,
            name: "Lycée Bilingue de Yaoundé".to_string(),
            motto: Some("Travail - Discipline - Succès".to_string()),
            phone: Some("+237 600 00 00 00".to_string()),
            regional_office: Some("Centre".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_header_stays_in_section() {
        let mut c = canvas();
        let s = section(SectionKind::Header, 805.89, 76.0);
        let logo = DecodedImage {
            width: 300,
            height: 100,
            pixels: crate::image_embed::ImagePixels::Gray(vec![0; 30000]),
        };
        draw_header(&mut c, &s, &org(), Some(logo), &RenderOptions::default(), Labels::for_language(Language::Primary));
        assert!(c.drawn_bounds().len() >= 4);
        assert_inside(&c, section_rect(&c, &s));
    }

    #[test]
    fn test_footer_with_and_without_scannable() {
        let labels = Labels::for_language(Language::Secondary);
        let key = VerificationKey::new(1, 1, "T1", "2024-2025", 12.0);

        let record = build_verification(&key, "https://v.test/verify", Some(120));
        let mut c = canvas();
        let s = section(SectionKind::Footer, 98.0, 62.0);
        draw_footer(&mut c, &s, &org(), &record, labels, true);
        assert_inside(&c, section_rect(&c, &s));
        let (_, images, _, _) = c.finish();
        assert_eq!(images.len(), 1);

        let mut c = canvas();
        let s = section(SectionKind::Footer, 66.0, 30.0);
        draw_footer(&mut c, &s, &org(), &record, labels, false);
        assert_inside(&c, section_rect(&c, &s));
        let (_, images, _, _) = c.finish();
        assert!(images.is_empty());
    }

    #[test]
    fn test_signatures_split_width() {
        let mut c = canvas();
        let s = section(SectionKind::Signatures, 200.0, 66.0);
        let blocks = vec![
            SignatureBlock {
                title: "Class teacher".to_string(),
                name: Some("M. Mballa".to_string()),
                image: Some(DecodedImage {
                    width: 10,
                    height: 40,
                    pixels: crate::image_embed::ImagePixels::Gray(vec![0; 400]),
                }),
            },
            SignatureBlock {
                title: "Parent".to_string(),
                name: None,
                image: None,
            },
        ];
        draw_signatures(&mut c, &s, blocks);
        assert_inside(&c, section_rect(&c, &s));
    }
}
