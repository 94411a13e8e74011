//! Report card composer
//!
//! Validates the records, asks the spacing calculator for a plan, then draws
//! each planned section top to bottom. Verification data is created once per
//! call and printed in the footer.

use log::{debug, info};

use crate::blocks::{
    draw_band, draw_footer, draw_header, draw_image_fitted, draw_signatures, draw_title, page_canvas,
    section_rect, SignatureBlock, BAND_FILL, MUTED_TEXT, RULE_COLOR, SHADE_FILL,
};
use crate::canvas::PageCanvas;
use crate::config::RenderOptions;
use crate::content::{provider_for, ContentProvider};
use crate::error::RendererResult;
use crate::image_embed::{ImageEmbedder, ImageKind};
use crate::labels::Labels;
use crate::layout::{calculate_layout, LayoutPlan, LayoutRequest, OptionalSections, Section, SectionHeights, SectionKind};
use crate::model::{format_score, OrganizationRecord, PerformanceLevel, StudentRecord, SubjectRow, GRADE_SCALE};
use crate::primitives::{draw_line, draw_rect, draw_text, Align, LineStyle, RectStyle, TextOptions};
use crate::serializer::{finalize, DocumentInfo};
use crate::types::{Color, Rect};
use crate::verification::{build_verification, VerificationKey, VerificationMetadata, VerificationRecord};

/// Sub-score columns beyond this are not printed.
pub const MAX_SCORE_COLUMNS: usize = 4;

/// A row needs this much height before the teacher line is drawn.
const SECONDARY_LINE_MIN_HEIGHT: f64 = 22.0;

const CELL_PADDING: f64 = 3.0;

/// A finished document and what the caller must persist for verification.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub verification: VerificationMetadata,
    /// False when the content overflowed the page at minimum sizing.
    pub layout_fits: bool,
}

/// A drawn but not yet serialized page.
pub struct ComposedPage {
    pub canvas: PageCanvas,
    pub plan: LayoutPlan,
    pub verification: VerificationRecord,
}

#[derive(Debug, Clone, Copy)]
struct Column {
    x: f64,
    width: f64,
}

impl Column {
    fn text_x(&self) -> f64 {
        self.x + CELL_PADDING
    }

    fn text_width(&self) -> f64 {
        (self.width - 2.0 * CELL_PADDING).max(0.0)
    }
}

struct TableColumns {
    subject: Column,
    scores: Vec<Column>,
    average: Column,
    coefficient: Column,
    total: Column,
    remark: Option<Column>,
}

impl TableColumns {
    fn new(area: Rect, score_columns: usize, with_remark: bool) -> Self {
        const SCORE_W: f64 = 32.0;
        const AVERAGE_W: f64 = 38.0;
        const COEF_W: f64 = 32.0;
        const TOTAL_W: f64 = 40.0;
        const SUBJECT_MIN_W: f64 = 80.0;

        let remark_w = if with_remark { (area.width * 0.26).min(140.0) } else { 0.0 };
        let fixed = AVERAGE_W + COEF_W + TOTAL_W + remark_w;
        let mut score_columns = score_columns.min(MAX_SCORE_COLUMNS);
        while score_columns > 0 && area.width - fixed - score_columns as f64 * SCORE_W < SUBJECT_MIN_W {
            score_columns -= 1;
        }
        let subject_w = (area.width - fixed - score_columns as f64 * SCORE_W).max(0.0);

        let mut x = area.x;
        let mut next = |width: f64| {
            let col = Column { x, width };
            x += width;
            col
        };
        let subject = next(subject_w);
        let scores: Vec<Column> = (0..score_columns).map(|_| next(SCORE_W)).collect();
        let average = next(AVERAGE_W);
        let coefficient = next(COEF_W);
        let total = next(TOTAL_W);
        let remark = with_remark.then(|| next(remark_w));
        Self {
            subject,
            scores,
            average,
            coefficient,
            total,
            remark,
        }
    }
}

fn draw_cell(canvas: &mut PageCanvas, text: &str, col: Column, baseline: f64, options: TextOptions, align: Align) {
    draw_text(canvas, text, col.text_x(), baseline, &options.within(col.text_width(), align));
}

fn format_coefficient(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn optional_sections(options: &RenderOptions) -> OptionalSections {
    OptionalSections {
        comments: options.include_comments,
        rankings: options.include_rankings,
        statistics: options.include_statistics,
        performance_levels: options.include_performance_levels,
        verification_code: options.include_qr_code,
        signatures: options.include_signatures,
    }
}

fn draw_entity_info(
    canvas: &mut PageCanvas,
    section: &Section,
    student: &StudentRecord,
    embedder: &ImageEmbedder,
    options: &RenderOptions,
    labels: &Labels,
) {
    let area = section_rect(canvas, section);
    draw_rect(canvas, area, &RectStyle::outlined(RULE_COLOR, 0.5));

    let box_w = options.photo_max_width.min(area.width * 0.25);
    let box_h = options.photo_max_height.min(area.height - 6.0);
    let photo_box = Rect::new(area.right() - 6.0 - box_w, area.top() - 3.0 - box_h, box_w, box_h);
    match embedder.embed(student.photo.as_deref(), ImageKind::Photo) {
        Some(photo) => {
            draw_image_fitted(canvas, photo, photo_box);
        }
        None => {
            draw_rect(
                canvas,
                photo_box,
                &RectStyle::filled(Color::gray(0.97)).with_border(RULE_COLOR, 0.5),
            );
            draw_text(
                canvas,
                labels.photo,
                photo_box.x,
                photo_box.y + photo_box.height / 2.0 - 3.0,
                &TextOptions::sized(8.0).color(MUTED_TEXT).within(photo_box.width, Align::Center),
            );
        }
    }

    let text_x = area.x + 6.0;
    let text_w = (photo_box.x - 6.0 - text_x).max(0.0);
    draw_text(
        canvas,
        &format!("{}: {}", labels.student, student.full_name()),
        text_x,
        area.top() - 14.0,
        &TextOptions::sized(10.0).bold().within(text_w, Align::Left),
    );

    let birth = student.birth_date.as_deref().map(|date| match student.birth_place.as_deref() {
        Some(place) if !place.trim().is_empty() => format!("{} {} {}", date, labels.at, place.trim()),
        _ => date.to_string(),
    });
    let class_size = student.class_size.map(|n| n.to_string());
    let fields: Vec<String> = [
        (labels.matricule, student.matricule.clone()),
        (labels.class, student.class_name.clone()),
        (labels.born, birth),
        (labels.gender, student.gender.clone()),
        (labels.class_size, class_size),
        (labels.class_teacher, student.class_teacher.clone()),
        (labels.academic_year, Some(student.academic_year_id.clone())),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}: {}", label, v))
    })
    .take(10)
    .collect();

    let col_w = text_w / 2.0;
    let field_opts = TextOptions::sized(8.5).within(col_w - 6.0, Align::Left);
    for (i, field) in fields.iter().enumerate() {
        let (col, row) = (i / 5, i % 5);
        draw_text(
            canvas,
            field,
            text_x + col as f64 * col_w,
            area.top() - 30.0 - row as f64 * 13.0,
            &field_opts,
        );
    }
}

fn draw_table_header(canvas: &mut PageCanvas, section: &Section, cols: &TableColumns, options: &RenderOptions, labels: &Labels) {
    let area = section_rect(canvas, section);
    draw_band(canvas, area, BAND_FILL);
    let baseline = area.top() - 13.0;
    let bold = TextOptions::sized(8.0).bold();

    draw_cell(canvas, labels.subject, cols.subject, baseline, bold, Align::Left);
    for (i, col) in cols.scores.iter().enumerate() {
        let text = if cols.scores.len() == 1 {
            labels.score.to_string()
        } else {
            format!("{} {}", labels.score, i + 1)
        };
        draw_cell(canvas, &text, *col, baseline, bold, Align::Center);
    }
    draw_cell(canvas, labels.average, cols.average, baseline, bold, Align::Center);
    draw_cell(canvas, labels.coefficient, cols.coefficient, baseline, bold, Align::Center);
    draw_cell(canvas, labels.weighted_total, cols.total, baseline, bold, Align::Center);
    if let Some(col) = cols.remark {
        let text = match (options.include_comments, options.include_performance_levels) {
            (false, true) => labels.level,
            _ => labels.remark,
        };
        draw_cell(canvas, text, col, baseline, bold, Align::Left);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_row(
    canvas: &mut PageCanvas,
    section: &Section,
    index: usize,
    row: &SubjectRow,
    cols: &TableColumns,
    student: &StudentRecord,
    provider: &dyn ContentProvider,
    options: &RenderOptions,
    labels: &Labels,
) {
    let area = section_rect(canvas, section);
    if index % 2 == 1 {
        draw_rect(canvas, area, &RectStyle::filled(SHADE_FILL));
    }
    draw_line(
        canvas,
        area.left(),
        area.bottom(),
        area.right(),
        area.bottom(),
        &LineStyle {
            color: Color::gray(0.8),
            thickness: 0.3,
        },
    );

    let baseline = area.top() - 10.0;
    let regular = TextOptions::sized(8.5);

    let aggregate = row.aggregate();
    draw_cell(canvas, &row.name, cols.subject, baseline, regular, Align::Left);
    for (i, col) in cols.scores.iter().enumerate() {
        let text = row.scores.get(i).map(|s| format_score(*s)).unwrap_or_else(|| "-".to_string());
        draw_cell(canvas, &text, *col, baseline, regular, Align::Center);
    }
    draw_cell(canvas, &format_score(aggregate), cols.average, baseline, regular.bold(), Align::Center);
    draw_cell(canvas, &format_coefficient(row.coefficient), cols.coefficient, baseline, regular, Align::Center);
    draw_cell(canvas, &format_score(row.weighted_total()), cols.total, baseline, regular.bold(), Align::Center);

    if let Some(col) = cols.remark {
        let mut parts = Vec::new();
        if options.include_performance_levels {
            parts.push(labels.level(PerformanceLevel::from_average(aggregate)).to_string());
        }
        if options.include_comments {
            if let Some(remark) = provider.subject_remark(student, row) {
                parts.push(remark);
            }
        }
        draw_cell(canvas, &parts.join(" - "), col, baseline, TextOptions::sized(7.5), Align::Left);
    }

    if options.include_comments && area.height >= SECONDARY_LINE_MIN_HEIGHT {
        if let Some(teacher) = row.teacher.as_deref().filter(|t| !t.trim().is_empty()) {
            draw_text(
                canvas,
                &format!("{}: {}", labels.teacher, teacher.trim()),
                cols.subject.text_x() + 6.0,
                area.top() - 19.0,
                &TextOptions::sized(7.0)
                    .color(MUTED_TEXT)
                    .within((cols.subject.text_width() - 6.0).max(0.0), Align::Left),
            );
        }
    }
}

fn draw_summary(
    canvas: &mut PageCanvas,
    section: &Section,
    student: &StudentRecord,
    provider: &dyn ContentProvider,
    options: &RenderOptions,
    labels: &Labels,
) {
    let area = section_rect(canvas, section);
    draw_band(canvas, area, Color::gray(0.92));

    let average = student.overall_average();
    let coefficients: f64 = student.subjects.iter().map(|r| r.coefficient).sum();
    let x = area.x + 6.0;
    let half = (area.width - 12.0) / 2.0;

    draw_text(
        canvas,
        &format!(
            "{}: {} / {}    {}: {}",
            labels.overall_average,
            format_score(average),
            GRADE_SCALE,
            labels.total_coefficients,
            format_coefficient(coefficients)
        ),
        x,
        area.top() - 13.0,
        &TextOptions::sized(10.0).bold().within(half, Align::Left),
    );
    let decision = student
        .council_decision
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| labels.decision_for(average));
    draw_text(
        canvas,
        &format!("{}: {}", labels.decision, decision),
        x + half,
        area.top() - 13.0,
        &TextOptions::sized(9.0).bold().within(half, Align::Right),
    );

    let appreciation = provider
        .general_appreciation(student)
        .unwrap_or_else(|| labels.appreciation_for(average).to_string());
    draw_text(
        canvas,
        &format!("{}: {}", labels.appreciation, appreciation),
        x,
        area.top() - 25.0,
        &TextOptions::sized(8.0)
            .within(half * 4.0 / 3.0 - 6.0, Align::Left)
            .wrapped()
            .max_lines(2),
    );
    let grades: Vec<String> = [
        (labels.discipline, provider.discipline_grade(student)),
        (labels.effort, provider.effort_grade(student)),
    ]
    .into_iter()
    .filter_map(|(label, grade)| grade.map(|g| format!("{}: {}", label, g)))
    .collect();
    if !grades.is_empty() {
        draw_text(
            canvas,
            &grades.join("   "),
            x + half * 4.0 / 3.0,
            area.top() - 25.0,
            &TextOptions::sized(8.0).within(half * 2.0 / 3.0, Align::Right),
        );
    }

    if options.include_rankings {
        let rank = match (student.rank, student.class_size) {
            (Some(rank), Some(size)) => format!("{} {} {}", rank, labels.of, size),
            (Some(rank), None) => rank.to_string(),
            _ => "-".to_string(),
        };
        draw_text(
            canvas,
            &format!("{}: {}", labels.rank, rank),
            x,
            area.top() - 47.0,
            &TextOptions::sized(9.0).bold().within(half, Align::Left),
        );
    }
}

fn draw_statistics(canvas: &mut PageCanvas, section: &Section, student: &StudentRecord, labels: &Labels) {
    let area = section_rect(canvas, section);
    draw_rect(canvas, area, &RectStyle::outlined(RULE_COLOR, 0.5));
    let x = area.x + 6.0;
    let width = area.width - 12.0;
    let opts = TextOptions::sized(8.0).within(width, Align::Left);

    let score = |value: Option<f64>| value.map(format_score).unwrap_or_else(|| "-".to_string());
    let stats = student.statistics;
    draw_text(
        canvas,
        &format!(
            "{}: {}     {}: {}     {}: {}",
            labels.highest,
            score(stats.map(|s| s.highest)),
            labels.lowest,
            score(stats.map(|s| s.lowest)),
            labels.class_average,
            score(stats.map(|s| s.class_average)),
        ),
        x,
        area.top() - 11.0,
        &opts,
    );

    let attendance = student.attendance.unwrap_or_default();
    let conduct = student.conduct.as_deref().map(str::trim).filter(|c| !c.is_empty()).unwrap_or("-");
    draw_text(
        canvas,
        &format!(
            "{}: {} ({} {})     {}: {}     {}: {}",
            labels.absences,
            attendance.absences,
            attendance.excused_absences,
            labels.excused,
            labels.lates,
            attendance.lates,
            labels.conduct,
            conduct,
        ),
        x,
        area.top() - 22.0,
        &opts,
    );
}

fn draw_performance_legend(canvas: &mut PageCanvas, section: &Section, labels: &Labels) {
    let area = section_rect(canvas, section);
    let bands: Vec<String> = PerformanceLevel::ALL
        .iter()
        .map(|level| match level {
            PerformanceLevel::Insufficient => {
                format!("{} < {}", labels.level(*level), PerformanceLevel::Fair.threshold())
            }
            _ => format!("{} >= {}", labels.level(*level), level.threshold()),
        })
        .collect();
    draw_text(
        canvas,
        &format!("{}: {}", labels.legend, bands.join("  |  ")),
        area.x + 6.0,
        area.top() - 11.0,
        &TextOptions::sized(7.5).color(MUTED_TEXT).within(area.width - 12.0, Align::Left),
    );
}

fn signature_blocks(
    student: &StudentRecord,
    org: &OrganizationRecord,
    embedder: &ImageEmbedder,
    labels: &Labels,
) -> Vec<SignatureBlock> {
    let mut blocks = Vec::with_capacity(3);
    if student.class_teacher.is_some() || student.class_teacher_signature.is_some() {
        blocks.push(SignatureBlock {
            title: labels.class_teacher.to_string(),
            name: student.class_teacher.clone(),
            image: embedder.embed(student.class_teacher_signature.as_deref(), ImageKind::Signature),
        });
    }
    blocks.push(SignatureBlock {
        title: labels.parent_signature.to_string(),
        name: None,
        image: None,
    });
    blocks.push(SignatureBlock {
        title: labels.principal.to_string(),
        name: org.principal_name.clone(),
        image: embedder.embed(org.principal_signature.as_deref(), ImageKind::Signature),
    });
    blocks
}

/// Plan and draw a bulletin without serializing it.
pub fn compose_bulletin(
    student: &StudentRecord,
    org: &OrganizationRecord,
    options: &RenderOptions,
    embedder: &ImageEmbedder,
    provider: &dyn ContentProvider,
) -> RendererResult<ComposedPage> {
    options.validate()?;
    org.validate()?;
    let student_id = student.validate()?;
    let labels = Labels::for_language(options.language);

    let mut canvas = page_canvas(options)?;
    let content = canvas.content_rect();
    let plan = calculate_layout(&LayoutRequest {
        row_count: student.subjects.len(),
        optional: optional_sections(options),
        heights: SectionHeights::bulletin(),
        content_top: content.top(),
        content_height: content.height,
    });
    debug!(
        "bulletin plan for student {}: {} sections, gap {:.1}, row {:.1}, fits {}",
        student_id,
        plan.sections.len(),
        plan.gap,
        plan.row_height,
        plan.fits
    );

    let key = VerificationKey::new(
        student_id,
        org.id,
        &student.period_id,
        &student.academic_year_id,
        student.overall_average(),
    );
    let verification = build_verification(
        &key,
        &options.verification_base_url,
        options.include_qr_code.then_some(options.qr_code_size),
    );

    let max_scores = student.subjects.iter().map(|r| r.scores.len()).max().unwrap_or(0);
    let with_remark = options.include_comments || options.include_performance_levels;
    let cols = TableColumns::new(content, max_scores, with_remark);
    let period = student.period_label.as_deref().unwrap_or(&student.period_id);
    let subtitle = format!(
        "{}: {}   -   {}: {}",
        labels.period, period, labels.academic_year, student.academic_year_id
    );

    for section in &plan.sections {
        match section.kind {
            SectionKind::Header => {
                let logo = embedder.embed(org.logo.as_deref(), ImageKind::Logo);
                draw_header(&mut canvas, section, org, logo, options, labels);
            }
            SectionKind::Title => draw_title(&mut canvas, section, labels.bulletin_title, &subtitle),
            SectionKind::EntityInfo => draw_entity_info(&mut canvas, section, student, embedder, options, labels),
            SectionKind::TableHeader => draw_table_header(&mut canvas, section, &cols, options, labels),
            SectionKind::Row(i) => {
                if let Some(row) = student.subjects.get(i) {
                    draw_row(&mut canvas, section, i, row, &cols, student, provider, options, labels);
                }
            }
            SectionKind::Summary => draw_summary(&mut canvas, section, student, provider, options, labels),
            SectionKind::Statistics => draw_statistics(&mut canvas, section, student, labels),
            SectionKind::PerformanceLegend => draw_performance_legend(&mut canvas, section, labels),
            SectionKind::Signatures => {
                let blocks = signature_blocks(student, org, embedder, labels);
                draw_signatures(&mut canvas, section, blocks);
            }
            SectionKind::Footer => {
                draw_footer(&mut canvas, section, org, &verification, labels, options.include_qr_code)
            }
        }
    }

    Ok(ComposedPage {
        canvas,
        plan,
        verification,
    })
}

/// Render one bulletin with an explicit embedder and content provider.
pub fn generate_bulletin_with(
    student: &StudentRecord,
    org: &OrganizationRecord,
    options: &RenderOptions,
    embedder: &ImageEmbedder,
    provider: &dyn ContentProvider,
) -> RendererResult<GeneratedDocument> {
    let composed = compose_bulletin(student, org, options, embedder, provider)?;
    let labels = Labels::for_language(options.language);
    let period = student.period_label.as_deref().unwrap_or(&student.period_id);
    let info = DocumentInfo {
        title: format!("{} - {} - {}", labels.bulletin_title, student.full_name(), period),
        author: org.name.clone(),
        creator: "bulletin".to_string(),
    };
    let fits = composed.plan.fits;
    let verification = composed.verification.metadata();
    let bytes = finalize(composed.canvas, &info)?;
    info!(
        "generated bulletin for {} ({} bytes, code {})",
        student.full_name(),
        bytes.len(),
        verification.code
    );
    Ok(GeneratedDocument {
        bytes,
        verification,
        layout_fits: fits,
    })
}

/// Render one bulletin with the embedder and provider the options select.
pub fn generate_bulletin(
    student: &StudentRecord,
    org: &OrganizationRecord,
    options: &RenderOptions,
) -> RendererResult<GeneratedDocument> {
    let embedder = ImageEmbedder::from_options(options);
    let provider = provider_for(options);
    generate_bulletin_with(student, org, options, &embedder, provider.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RecordedContent;
    use crate::error::RendererError;
    use crate::image_embed::tests::{jpeg_bytes, png_bytes};
    use crate::model::{Attendance, ClassStatistics};
    use std::path::PathBuf;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn org() -> OrganizationRecord {
        OrganizationRecord {
            id: 3,
            name: "Collège Saint Joseph".to_string(),
            address: Some("BP 112 Douala".to_string()),
            email: Some("contact@csj.test".to_string()),
            principal_name: Some("Mme Ekotto".to_string()),
            ..Default::default()
        }
    }

    fn subject(name: &str, scores: &[f64], coefficient: f64) -> SubjectRow {
        SubjectRow {
            name: name.to_string(),
            scores: scores.to_vec(),
            coefficient,
            teacher: Some("M. Fotso".to_string()),
            ..Default::default()
        }
    }

    fn student(rows: usize) -> StudentRecord {
        StudentRecord {
            id: Some(11),
            first_name: "Paul".to_string(),
            last_name: "Essomba".to_string(),
            matricule: Some("CSJ-2024-011".to_string()),
            class_name: Some("3e A".to_string()),
            birth_date: Some("12/03/2010".to_string()),
            birth_place: Some("Douala".to_string()),
            class_teacher: Some("M. Nkoulou".to_string()),
            period_id: "T1".to_string(),
            period_label: Some("Premier trimestre".to_string()),
            academic_year_id: "2024-2025".to_string(),
            subjects: (0..rows)
                .map(|i| subject(&format!("Matière {}", i + 1), &[12.0 + (i % 5) as f64, 14.5], 1.0 + (i % 3) as f64))
                .collect(),
            rank: Some(4),
            class_size: Some(38),
            attendance: Some(Attendance {
                absences: 3,
                excused_absences: 2,
                lates: 1,
            }),
            statistics: Some(ClassStatistics {
                highest: 17.2,
                lowest: 6.4,
                class_average: 11.3,
            }),
            ..Default::default()
        }
    }

    fn temp_dir() -> PathBuf {
        let p = std::env::temp_dir().join(format!("bulletin-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&p).unwrap();
        p
    }

    #[test]
    fn test_generates_complete_pdf() {
        let doc = generate_bulletin(&student(9), &org(), &RenderOptions::default()).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-"));
        assert!(contains(&doc.bytes, b"%%EOF"));
        assert!(doc.layout_fits);
        assert_eq!(doc.verification.code.len(), 8);
        assert!(doc.verification.url.ends_with(&format!("?code={}", doc.verification.code)));
        // QR raster is embedded as an image.
        assert!(contains(&doc.bytes, b"/Im1"));
    }

    #[test]
    fn test_everything_stays_in_content_rect_when_it_fits() {
        let s = student(8);
        let embedder = ImageEmbedder::from_options(&RenderOptions::default());
        for optional in OptionalSections::all_combinations() {
            let options = RenderOptions {
                include_comments: optional.comments,
                include_rankings: optional.rankings,
                include_statistics: optional.statistics,
                include_performance_levels: optional.performance_levels,
                include_qr_code: optional.verification_code,
                include_signatures: optional.signatures,
                ..RenderOptions::default()
            };
            let page = compose_bulletin(&s, &org(), &options, &embedder, &RecordedContent).unwrap();
            assert!(page.plan.fits, "{:?}", optional);
            let area = page.canvas.content_rect();
            for drawn in page.canvas.drawn_bounds() {
                assert!(area.contains(drawn), "{:?} escapes content with {:?}", drawn, optional);
            }
        }
    }

    #[test]
    fn test_images_are_embedded_from_disk() {
        let dir = temp_dir();
        std::fs::write(dir.join("logo.png"), png_bytes(120, 60, true)).unwrap();
        std::fs::write(dir.join("photo.jpg"), jpeg_bytes(30, 40)).unwrap();

        let mut organization = org();
        organization.logo = Some("logo.png".to_string());
        let mut s = student(5);
        s.photo = Some("photo.jpg".to_string());

        let options = RenderOptions::default();
        let embedder = ImageEmbedder::from_options(&options).with_base_dir(&dir);
        let doc = generate_bulletin_with(&s, &organization, &options, &embedder, &RecordedContent).unwrap();
        assert!(contains(&doc.bytes, b"/DCTDecode"));
        assert!(contains(&doc.bytes, b"/SMask"));
        assert!(contains(&doc.bytes, b"/Im3"));
    }

    #[test]
    fn test_missing_images_still_generate() {
        let mut organization = org();
        organization.logo = Some("does/not/exist.png".to_string());
        let mut s = student(3);
        s.photo = Some("nope.jpg".to_string());
        s.class_teacher_signature = Some("sig.png".to_string());
        let options = RenderOptions {
            include_qr_code: false,
            ..RenderOptions::default()
        };
        let doc = generate_bulletin(&s, &organization, &options).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-"));
        assert!(!contains(&doc.bytes, b"/XObject"));
    }

    #[test]
    fn test_missing_identity_is_fatal() {
        let mut s = student(2);
        s.id = None;
        assert!(matches!(
            generate_bulletin(&s, &org(), &RenderOptions::default()),
            Err(RendererError::MissingField(_))
        ));
    }

    #[test]
    fn test_overflow_is_generated_with_flag() {
        let doc = generate_bulletin(&student(45), &org(), &RenderOptions::default()).unwrap();
        assert!(!doc.layout_fits);
        assert!(doc.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_empty_subject_list() {
        let doc = generate_bulletin(&student(0), &org(), &RenderOptions::default()).unwrap();
        assert!(doc.layout_fits);
    }

    #[test]
    fn test_columns_fit_table_width() {
        let area = Rect::new(36.0, 0.0, 523.28, 20.0);
        let cols = TableColumns::new(area, 7, true);
        assert_eq!(cols.scores.len(), MAX_SCORE_COLUMNS);
        let remark = cols.remark.unwrap();
        assert!((remark.x + remark.width - area.right()).abs() < 1e-9);

        let narrow = TableColumns::new(Rect::new(0.0, 0.0, 300.0, 20.0), 4, true);
        assert!(narrow.subject.width >= 80.0 || narrow.scores.is_empty());
    }

    fn content_stream(options: &RenderOptions) -> Vec<u8> {
        let embedder = ImageEmbedder::from_options(options);
        let page = compose_bulletin(&student(5), &org(), options, &embedder, &RecordedContent).unwrap();
        let (content, _, _, _) = page.canvas.finish();
        content
    }

    #[test]
    fn test_teacher_line_follows_comments_flag() {
        let with = RenderOptions {
            include_qr_code: false,
            ..RenderOptions::default()
        };
        let without = RenderOptions {
            include_comments: false,
            ..with.clone()
        };
        assert!(contains(&content_stream(&with), b"(Enseignant: M. Fotso)"));
        assert!(!contains(&content_stream(&without), b"Enseignant"));
    }

    #[test]
    fn test_rank_line_follows_rankings_flag() {
        let with = RenderOptions {
            include_qr_code: false,
            ..RenderOptions::default()
        };
        let without = RenderOptions {
            include_rankings: false,
            ..with.clone()
        };
        assert!(contains(&content_stream(&with), b"(Rang: 4 sur 38)"));
        assert!(!contains(&content_stream(&without), b"Rang:"));
    }

    #[test]
    fn test_long_appreciation_wraps_inside_summary() {
        let options = RenderOptions::default();
        let embedder = ImageEmbedder::from_options(&options);
        let drawn_in_summary = |remark: &str| {
            let mut s = student(8);
            s.general_remark = Some(remark.to_string());
            let page = compose_bulletin(&s, &org(), &options, &embedder, &RecordedContent).unwrap();
            let summary = section_rect(&page.canvas, page.plan.section(SectionKind::Summary).unwrap());
            let content = page.canvas.content_rect();
            assert!(page.canvas.drawn_bounds().iter().all(|d| content.contains(d)));
            page.canvas.drawn_bounds().iter().filter(|d| summary.contains(d)).count()
        };
        let short = drawn_in_summary("Bon trimestre");
        let long = drawn_in_summary(
            "Eleve serieux et applique, des progres nets en sciences, doit cependant \
             participer davantage a l'oral et soigner la presentation de ses copies \
             pour confirmer ces bons resultats au prochain trimestre",
        );
        assert_eq!(long, short + 1);
    }

    #[test]
    fn test_truetype_override_is_embedded() {
        let Some(path) = crate::fonts::tests::system_ttf() else {
            eprintln!("no system TrueType font found, skipping");
            return;
        };
        let options = RenderOptions {
            font_regular_path: Some(path.to_string()),
            ..RenderOptions::default()
        };
        let doc = generate_bulletin(&student(6), &org(), &options).unwrap();
        assert!(contains(&doc.bytes, b"/Subtype /TrueType"));
        assert!(contains(&doc.bytes, b"/FontFile2"));
        assert!(contains(&doc.bytes, b"/Helvetica-Bold"));
        assert!(doc.layout_fits);
    }

    #[test]
    fn test_coefficient_formatting() {
        assert_eq!(format_coefficient(4.0), "4");
        assert_eq!(format_coefficient(2.5), "2.5");
    }
}
