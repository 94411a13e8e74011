//! Vertical spacing calculator
//!
//! Given how many table rows there are and which optional sections are on,
//! produce a top-to-bottom plan of section heights and positions before any
//! drawing happens. The function is pure: identical requests give identical
//! plans.
//!
//! Minimum heights (including a floor gap between blocks) are summed first.
//! Leftover space grows each row a little, capped per row, and the rest
//! widens the gaps, also capped. When the minimums alone exceed the page the
//! plan is returned packed at minimum size with `fits == false`; nothing is
//! paginated.

use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    Title,
    EntityInfo,
    TableHeader,
    Row(usize),
    Summary,
    Statistics,
    PerformanceLegend,
    Signatures,
    Footer,
}

/// Optional parts of the document that change the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionalSections {
    pub comments: bool,
    pub rankings: bool,
    pub statistics: bool,
    pub performance_levels: bool,
    pub verification_code: bool,
    pub signatures: bool,
}

impl OptionalSections {
    /// Every combination of the six toggles, for exhaustive checks.
    pub fn all_combinations() -> impl Iterator<Item = OptionalSections> {
        (0u8..64).map(|bits| OptionalSections {
            comments: bits & 1 != 0,
            rankings: bits & 2 != 0,
            statistics: bits & 4 != 0,
            performance_levels: bits & 8 != 0,
            verification_code: bits & 16 != 0,
            signatures: bits & 32 != 0,
        })
    }
}

/// Base minimum heights in points. A zero height drops the section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionHeights {
    pub header: f64,
    pub title: f64,
    pub entity_info: f64,
    pub table_header: f64,
    pub row: f64,
    pub row_comments: f64,
    pub row_performance: f64,
    pub summary: f64,
    pub summary_rankings: f64,
    pub statistics: f64,
    pub performance_legend: f64,
    pub signatures: f64,
    pub footer: f64,
    pub footer_verification: f64,
}

impl SectionHeights {
    pub const fn bulletin() -> Self {
        Self {
            header: 76.0,
            title: 34.0,
            entity_info: 90.0,
            table_header: 20.0,
            row: 14.0,
            row_comments: 8.0,
            row_performance: 2.0,
            summary: 40.0,
            summary_rankings: 12.0,
            statistics: 28.0,
            performance_legend: 16.0,
            signatures: 66.0,
            footer: 30.0,
            footer_verification: 62.0,
        }
    }

    pub const fn timetable() -> Self {
        Self {
            header: 60.0,
            title: 34.0,
            entity_info: 22.0,
            table_header: 20.0,
            row: 30.0,
            row_comments: 0.0,
            row_performance: 0.0,
            summary: 0.0,
            summary_rankings: 0.0,
            statistics: 0.0,
            performance_legend: 0.0,
            signatures: 50.0,
            footer: 24.0,
            footer_verification: 62.0,
        }
    }
}

/// Gap between blocks never drops below this.
pub const SECTION_GAP_FLOOR: f64 = 6.0;
/// Gap between blocks never grows beyond this.
pub const SECTION_GAP_CAP: f64 = 16.0;
/// Most a row can grow beyond its minimum.
pub const ROW_GROWTH_CAP: f64 = 6.0;
/// Share of the slack offered to row growth.
const ROW_SLACK_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest {
    pub row_count: usize,
    pub optional: OptionalSections,
    pub heights: SectionHeights,
    pub content_top: f64,
    pub content_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub min_height: f64,
    pub height: f64,
    /// Y coordinate of the section's top edge.
    pub top: f64,
}

impl Section {
    pub fn bottom(&self) -> f64 {
        self.top - self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub sections: Vec<Section>,
    pub gap: f64,
    pub row_height: f64,
    pub total_required: f64,
    pub total_height: f64,
    pub content_height: f64,
    pub fits: bool,
}

impl LayoutPlan {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|s| matches!(s.kind, SectionKind::Row(_)))
    }

    pub fn slack(&self) -> f64 {
        self.content_height - self.total_required
    }
}

/// Whether a gap precedes this section. Rows hang directly under the table
/// header and each other.
fn gap_before(kind: SectionKind, index: usize) -> bool {
    index > 0 && !matches!(kind, SectionKind::Row(_))
}

fn minimum_sections(req: &LayoutRequest) -> Vec<(SectionKind, f64)> {
    let h = &req.heights;
    let opt = &req.optional;
    let mut row_min = h.row;
    if opt.comments {
        row_min += h.row_comments;
    }
    if opt.performance_levels {
        row_min += h.row_performance;
    }
    let summary = if opt.rankings { h.summary + h.summary_rankings } else { h.summary };
    let footer = if opt.verification_code { h.footer_verification } else { h.footer };

    let mut out = vec![
        (SectionKind::Header, h.header),
        (SectionKind::Title, h.title),
        (SectionKind::EntityInfo, h.entity_info),
        (SectionKind::TableHeader, h.table_header),
    ];
    out.extend((0..req.row_count).map(|i| (SectionKind::Row(i), row_min)));
    out.push((SectionKind::Summary, if h.summary > 0.0 { summary } else { 0.0 }));
    if opt.statistics {
        out.push((SectionKind::Statistics, h.statistics));
    }
    if opt.performance_levels {
        out.push((SectionKind::PerformanceLegend, h.performance_legend));
    }
    if opt.signatures {
        out.push((SectionKind::Signatures, h.signatures));
    }
    out.push((SectionKind::Footer, footer));
    out.retain(|(_, height)| *height > 0.0);
    out
}

pub fn calculate_layout(req: &LayoutRequest) -> LayoutPlan {
    let minimums = minimum_sections(req);
    let gap_count = minimums
        .iter()
        .enumerate()
        .filter(|(i, (kind, _))| gap_before(*kind, *i))
        .count();
    let min_sum: f64 = minimums.iter().map(|(_, h)| h).sum();
    let total_required = min_sum + gap_count as f64 * SECTION_GAP_FLOOR;
    let slack = req.content_height - total_required;
    let fits = slack >= 0.0;

    let (row_growth, gap) = if fits {
        let row_growth = if req.row_count > 0 {
            (slack * ROW_SLACK_SHARE / req.row_count as f64).min(ROW_GROWTH_CAP)
        } else {
            0.0
        };
        let remaining = slack - row_growth * req.row_count as f64;
        let gap = if gap_count > 0 {
            (SECTION_GAP_FLOOR + remaining / gap_count as f64).min(SECTION_GAP_CAP)
        } else {
            SECTION_GAP_FLOOR
        };
        (row_growth, gap)
    } else {
        warn!(
            "{} rows need {:.1}pt but only {:.1}pt is available; sections are packed at minimum height",
            req.row_count, total_required, req.content_height
        );
        (0.0, SECTION_GAP_FLOOR)
    };

    let mut sections = Vec::with_capacity(minimums.len());
    let mut cursor = req.content_top;
    let mut row_height = 0.0;
    for (i, (kind, min_height)) in minimums.into_iter().enumerate() {
        if gap_before(kind, i) {
            cursor -= gap;
        }
        let height = match kind {
            SectionKind::Row(_) => {
                row_height = min_height + row_growth;
                row_height
            }
            _ => min_height,
        };
        sections.push(Section {
            kind,
            min_height,
            height,
            top: cursor,
        });
        cursor -= height;
    }

    LayoutPlan {
        sections,
        gap,
        row_height,
        total_required,
        total_height: req.content_top - cursor,
        content_height: req.content_height,
        fits,
    }
}
