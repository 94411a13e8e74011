//! Weekly timetable composer
//!
//! Days run across, time slots run down. Breaks are drawn as shaded bands
//! across the whole grid.

use log::{debug, info};

use crate::blocks::{
    draw_band, draw_footer, draw_header, draw_signatures, draw_title, page_canvas, section_rect, SignatureBlock,
    BAND_FILL, MUTED_TEXT, RULE_COLOR, SHADE_FILL,
};
use crate::bulletin::{ComposedPage, GeneratedDocument};
use crate::canvas::PageCanvas;
use crate::config::RenderOptions;
use crate::error::RendererResult;
use crate::image_embed::{ImageEmbedder, ImageKind};
use crate::labels::Labels;
use crate::layout::{calculate_layout, LayoutRequest, OptionalSections, Section, SectionHeights, SectionKind};
use crate::model::{OrganizationRecord, TimeSlot, TimetableRecord};
use crate::primitives::{draw_line, draw_rect, draw_text, Align, LineStyle, RectStyle, TextOptions};
use crate::serializer::{finalize, DocumentInfo};
use crate::types::Rect;
use crate::verification::{build_verification, VerificationKey};

/// Period identifier timetables are hashed under.
pub const TIMETABLE_PERIOD_ID: &str = "TIMETABLE";

const TIME_COLUMN_WIDTH: f64 = 70.0;

struct Grid {
    x: f64,
    width: f64,
    day_width: f64,
    days: usize,
}

impl Grid {
    fn new(area: Rect, days: usize) -> Self {
        let days = days.max(1);
        Self {
            x: area.x,
            width: area.width,
            day_width: (area.width - TIME_COLUMN_WIDTH) / days as f64,
            days,
        }
    }

    fn day_x(&self, day: usize) -> f64 {
        self.x + TIME_COLUMN_WIDTH + day as f64 * self.day_width
    }

    fn draw_dividers(&self, canvas: &mut PageCanvas, area: Rect) {
        let style = LineStyle {
            color: RULE_COLOR,
            thickness: 0.4,
        };
        for day in 0..self.days {
            let x = self.day_x(day);
            draw_line(canvas, x, area.bottom(), x, area.top(), &style);
        }
    }
}

fn slot_time(slot: &TimeSlot) -> String {
    match (slot.start.trim(), slot.end.trim()) {
        ("", "") => String::new(),
        (start, "") => start.to_string(),
        (start, end) => format!("{} - {}", start, end),
    }
}

fn draw_day_header(canvas: &mut PageCanvas, section: &Section, record: &TimetableRecord, grid: &Grid, labels: &Labels) {
    let area = section_rect(canvas, section);
    draw_band(canvas, area, BAND_FILL);
    let bold = TextOptions::sized(8.5).bold();
    let baseline = area.top() - 13.0;
    draw_text(
        canvas,
        labels.time,
        grid.x + 3.0,
        baseline,
        &bold.within(TIME_COLUMN_WIDTH - 6.0, Align::Center),
    );
    for (i, day) in record.days.iter().enumerate() {
        draw_text(
            canvas,
            day,
            grid.day_x(i) + 3.0,
            baseline,
            &bold.within(grid.day_width - 6.0, Align::Center),
        );
    }
    grid.draw_dividers(canvas, area);
}

fn draw_slot(
    canvas: &mut PageCanvas,
    section: &Section,
    index: usize,
    record: &TimetableRecord,
    grid: &Grid,
    labels: &Labels,
) {
    let area = section_rect(canvas, section);
    let Some(slot) = record.slots.get(index) else {
        return;
    };
    let time_opts = TextOptions::sized(7.5).within(TIME_COLUMN_WIDTH - 6.0, Align::Center);

    if slot.is_break {
        draw_rect(canvas, area, &RectStyle::filled(SHADE_FILL).with_border(RULE_COLOR, 0.4));
        draw_text(canvas, &slot_time(slot), grid.x + 3.0, area.top() - area.height / 2.0 - 3.0, &time_opts);
        let label = slot.label.as_deref().filter(|l| !l.trim().is_empty()).unwrap_or(labels.break_label);
        let band_x = grid.day_x(0);
        draw_text(
            canvas,
            label,
            band_x,
            area.top() - area.height / 2.0 - 3.0,
            &TextOptions::sized(8.5)
                .bold()
                .color(MUTED_TEXT)
                .within(grid.x + grid.width - band_x, Align::Center),
        );
        return;
    }

    draw_rect(canvas, area, &RectStyle::outlined(RULE_COLOR, 0.4));
    draw_text(canvas, &slot_time(slot), grid.x + 3.0, area.top() - 11.0, &time_opts);
    for day in 0..record.days.len() {
        let Some(entry) = record.entry_at(day, index) else {
            continue;
        };
        let x = grid.day_x(day) + 3.0;
        let width = grid.day_width - 6.0;
        draw_text(
            canvas,
            &entry.subject,
            x,
            area.top() - 11.0,
            &TextOptions::sized(8.0).bold().within(width, Align::Center),
        );
        let detail = TextOptions::sized(7.0).color(MUTED_TEXT).within(width, Align::Center);
        if let Some(teacher) = &entry.teacher {
            draw_text(canvas, teacher, x, area.top() - 19.5, &detail);
        }
        if let Some(room) = &entry.room {
            draw_text(canvas, &format!("{} {}", labels.room, room.trim()), x, area.top() - 27.5, &detail);
        }
    }
    grid.draw_dividers(canvas, area);
}

fn draw_class_line(canvas: &mut PageCanvas, section: &Section, record: &TimetableRecord, labels: &Labels) {
    let area = section_rect(canvas, section);
    let parts: Vec<String> = [
        (labels.class, Some(record.class_name.clone())),
        (labels.head_teacher, record.head_teacher.clone()),
        (labels.room, record.room.clone()),
        (labels.academic_year, Some(record.academic_year_id.clone())),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}: {}", label, v))
    })
    .collect();
    draw_text(
        canvas,
        &parts.join("      "),
        area.x,
        area.top() - 14.0,
        &TextOptions::sized(9.0).bold().within(area.width, Align::Left),
    );
}

/// Plan and draw a timetable without serializing it.
pub fn compose_timetable(
    record: &TimetableRecord,
    org: &OrganizationRecord,
    options: &RenderOptions,
    embedder: &ImageEmbedder,
) -> RendererResult<ComposedPage> {
    options.validate()?;
    org.validate()?;
    let class_id = record.validate()?;
    let labels = Labels::for_language(options.language);

    let mut canvas = page_canvas(options)?;
    let content = canvas.content_rect();
    let plan = calculate_layout(&LayoutRequest {
        row_count: record.slots.len(),
        optional: OptionalSections {
            verification_code: options.include_qr_code,
            signatures: options.include_signatures,
            ..OptionalSections::default()
        },
        heights: SectionHeights::timetable(),
        content_top: content.top(),
        content_height: content.height,
    });
    debug!(
        "timetable plan for class {}: {} slots, row {:.1}, fits {}",
        class_id,
        record.slots.len(),
        plan.row_height,
        plan.fits
    );

    // Timetables carry no score; the number of scheduled lessons stands in.
    let key = VerificationKey::new(
        class_id,
        org.id,
        TIMETABLE_PERIOD_ID,
        &record.academic_year_id,
        record.entries.len() as f64,
    );
    let verification = build_verification(
        &key,
        &options.verification_base_url,
        options.include_qr_code.then_some(options.qr_code_size),
    );

    let grid = Grid::new(content, record.days.len());
    let subtitle = format!("{}: {}   -   {}", labels.class, record.class_name, record.academic_year_id);

    for section in &plan.sections {
        match section.kind {
            SectionKind::Header => {
                let logo = embedder.embed(org.logo.as_deref(), ImageKind::Logo);
                draw_header(&mut canvas, section, org, logo, options, labels);
            }
            SectionKind::Title => draw_title(&mut canvas, section, labels.timetable_title, &subtitle),
            SectionKind::EntityInfo => draw_class_line(&mut canvas, section, record, labels),
            SectionKind::TableHeader => draw_day_header(&mut canvas, section, record, &grid, labels),
            SectionKind::Row(i) => draw_slot(&mut canvas, section, i, record, &grid, labels),
            SectionKind::Signatures => {
                let blocks = vec![
                    SignatureBlock {
                        title: labels.head_teacher.to_string(),
                        name: record.head_teacher.clone(),
                        image: None,
                    },
                    SignatureBlock {
                        title: labels.principal.to_string(),
                        name: org.principal_name.clone(),
                        image: embedder.embed(org.principal_signature.as_deref(), ImageKind::Signature),
                    },
                ];
                draw_signatures(&mut canvas, section, blocks);
            }
            SectionKind::Footer => {
                draw_footer(&mut canvas, section, org, &verification, labels, options.include_qr_code)
            }
            SectionKind::Summary | SectionKind::Statistics | SectionKind::PerformanceLegend => {}
        }
    }

    Ok(ComposedPage {
        canvas,
        plan,
        verification,
    })
}

pub fn generate_timetable_with(
    record: &TimetableRecord,
    org: &OrganizationRecord,
    options: &RenderOptions,
    embedder: &ImageEmbedder,
) -> RendererResult<GeneratedDocument> {
    let composed = compose_timetable(record, org, options, embedder)?;
    let labels = Labels::for_language(options.language);
    let info = DocumentInfo {
        title: format!("{} - {}", labels.timetable_title, record.class_name),
        author: org.name.clone(),
        creator: "timetable".to_string(),
    };
    let fits = composed.plan.fits;
    let verification = composed.verification.metadata();
    let bytes = finalize(composed.canvas, &info)?;
    info!(
        "generated timetable for {} ({} bytes, code {})",
        record.class_name,
        bytes.len(),
        verification.code
    );
    Ok(GeneratedDocument {
        bytes,
        verification,
        layout_fits: fits,
    })
}

pub fn generate_timetable(
    record: &TimetableRecord,
    org: &OrganizationRecord,
    options: &RenderOptions,
) -> RendererResult<GeneratedDocument> {
    generate_timetable_with(record, org, options, &ImageEmbedder::from_options(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RendererError;
    use crate::model::TimetableEntry;

    fn slot(start: &str, end: &str, is_break: bool) -> TimeSlot {
        TimeSlot {
            start: start.to_string(),
            end: end.to_string(),
            is_break,
            label: None,
        }
    }

    fn record() -> TimetableRecord {
        let days = ["Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi"];
        let slots = vec![
            slot("07:30", "08:25", false),
            slot("08:25", "09:20", false),
            slot("09:20", "10:15", false),
            slot("10:15", "10:30", true),
            slot("10:30", "11:25", false),
            slot("11:25", "12:20", false),
        ];
        let mut entries = Vec::new();
        for day in 0..days.len() {
            for (s, sl) in slots.iter().enumerate() {
                if !sl.is_break && (day + s) % 3 != 0 {
                    entries.push(TimetableEntry {
                        day,
                        slot: s,
                        subject: "Physique-Chimie".to_string(),
                        teacher: Some("M. Abena".to_string()),
                        room: Some("B12".to_string()),
                    });
                }
            }
        }
        TimetableRecord {
            class_id: Some(21),
            class_name: "Terminale C".to_string(),
            academic_year_id: "2024-2025".to_string(),
            head_teacher: Some("Mme Atangana".to_string()),
            room: Some("B12".to_string()),
            days: days.iter().map(|d| d.to_string()).collect(),
            slots,
            entries,
        }
    }

    fn org() -> OrganizationRecord {
        OrganizationRecord {
            id: 5,
            name: "Lycée de Mbalmayo".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_timetable_fits_landscape_page() {
        for options in [
            RenderOptions::timetable_defaults(),
            RenderOptions {
                include_signatures: true,
                ..RenderOptions::timetable_defaults()
            },
            RenderOptions {
                include_qr_code: false,
                ..RenderOptions::timetable_defaults()
            },
        ] {
            let page = compose_timetable(&record(), &org(), &options, &ImageEmbedder::from_options(&options)).unwrap();
            assert!(page.plan.fits);
            let area = page.canvas.content_rect();
            assert!(area.width > area.height);
            for drawn in page.canvas.drawn_bounds() {
                assert!(area.contains(drawn), "{:?} escapes {:?}", drawn, area);
            }
        }
    }

    #[test]
    fn test_generate_timetable() {
        let doc = generate_timetable(&record(), &org(), &RenderOptions::timetable_defaults()).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-"));
        assert!(doc.verification.url.contains("?code="));
    }

    #[test]
    fn test_out_of_range_entry_is_rejected() {
        let mut r = record();
        r.entries.push(TimetableEntry {
            day: 9,
            slot: 0,
            subject: "Sport".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            generate_timetable(&r, &org(), &RenderOptions::timetable_defaults()),
            Err(RendererError::InvalidValue(..))
        ));
    }

    #[test]
    fn test_slot_time() {
        assert_eq!(slot_time(&slot("08:00", "09:00", false)), "08:00 - 09:00");
        assert_eq!(slot_time(&slot("08:00", "", false)), "08:00");
        assert_eq!(slot_time(&slot(" ", "", false)), "");
    }
}
