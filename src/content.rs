//! Narrative content providers
//!
//! The composer asks a provider for the discipline grade, effort grade and
//! remarks it prints. `RecordedContent` only returns what the record holds.
//! `PlaceholderContent` fills the gaps with a weighted choice seeded from the
//! entity id, so the same record always yields the same text.

use sha2::{Digest, Sha256};

use crate::config::RenderOptions;
use crate::labels::Labels;
use crate::model::{PerformanceLevel, StudentRecord, SubjectRow};

pub trait ContentProvider {
    fn discipline_grade(&self, student: &StudentRecord) -> Option<String>;

    fn effort_grade(&self, student: &StudentRecord) -> Option<String>;

    fn subject_remark(&self, student: &StudentRecord, row: &SubjectRow) -> Option<String>;

    fn general_appreciation(&self, student: &StudentRecord) -> Option<String>;
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Record data only; nothing is invented.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedContent;

impl ContentProvider for RecordedContent {
    fn discipline_grade(&self, student: &StudentRecord) -> Option<String> {
        non_empty(&student.discipline_grade)
    }

    fn effort_grade(&self, student: &StudentRecord) -> Option<String> {
        non_empty(&student.effort_grade)
    }

    fn subject_remark(&self, _student: &StudentRecord, row: &SubjectRow) -> Option<String> {
        non_empty(&row.remark)
    }

    fn general_appreciation(&self, student: &StudentRecord) -> Option<String> {
        non_empty(&student.general_remark)
    }
}

const GRADE_WEIGHTS: [(&str, u64); 5] = [("A", 3), ("B", 5), ("C", 4), ("D", 2), ("E", 1)];

/// Recorded values first, then deterministic synthesized ones.
#[derive(Debug)]
pub struct PlaceholderContent {
    labels: &'static Labels,
}

impl PlaceholderContent {
    pub fn new(labels: &'static Labels) -> Self {
        Self { labels }
    }

    fn seed(student: &StudentRecord, field: &str) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(student.id.unwrap_or_default().to_be_bytes());
        hasher.update(b":");
        hasher.update(student.period_id.as_bytes());
        hasher.update(b":");
        hasher.update(field.as_bytes());
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

/// Pick from `choices` with probability proportional to each weight.
pub fn weighted_choice<'a, T>(choices: &'a [(T, u64)], seed: u64) -> Option<&'a T> {
    let total: u64 = choices.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return None;
    }
    let mut roll = seed % total;
    for (choice, weight) in choices {
        if roll < *weight {
            return Some(choice);
        }
        roll -= weight;
    }
    None
}

impl ContentProvider for PlaceholderContent {
    fn discipline_grade(&self, student: &StudentRecord) -> Option<String> {
        RecordedContent.discipline_grade(student).or_else(|| {
            weighted_choice(&GRADE_WEIGHTS, Self::seed(student, "discipline")).map(|g| g.to_string())
        })
    }

    fn effort_grade(&self, student: &StudentRecord) -> Option<String> {
        RecordedContent.effort_grade(student).or_else(|| {
            weighted_choice(&GRADE_WEIGHTS, Self::seed(student, "effort")).map(|g| g.to_string())
        })
    }

    fn subject_remark(&self, student: &StudentRecord, row: &SubjectRow) -> Option<String> {
        RecordedContent.subject_remark(student, row).or_else(|| {
            let level = PerformanceLevel::from_average(row.aggregate());
            // Earlier entries read more natural and are favoured.
            let choices: Vec<(&str, u64)> = self
                .labels
                .remarks(level)
                .iter()
                .enumerate()
                .map(|(i, r)| (*r, 3u64.saturating_sub(i as u64).max(1)))
                .collect();
            let field = format!("remark:{}", row.name);
            weighted_choice(&choices, Self::seed(student, &field)).map(|r| r.to_string())
        })
    }

    fn general_appreciation(&self, student: &StudentRecord) -> Option<String> {
        RecordedContent
            .general_appreciation(student)
            .or_else(|| Some(self.labels.appreciation_for(student.overall_average()).to_string()))
    }
}

/// Provider selected by `placeholderContent`.
pub fn provider_for(options: &RenderOptions) -> Box<dyn ContentProvider> {
    if options.placeholder_content {
        Box::new(PlaceholderContent::new(Labels::for_language(options.language)))
    } else {
        Box::new(RecordedContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;

    fn student(id: u64) -> StudentRecord {
        StudentRecord {
            id: Some(id),
            first_name: "Awa".to_string(),
            last_name: "Ndiaye".to_string(),
            period_id: "T1".to_string(),
            academic_year_id: "2024-2025".to_string(),
            subjects: vec![SubjectRow {
                name: "Mathématiques".to_string(),
                average: Some(15.0),
                coefficient: 4.0,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_recorded_content_never_invents() {
        let s = student(1);
        assert_eq!(RecordedContent.discipline_grade(&s), None);
        assert_eq!(RecordedContent.subject_remark(&s, &s.subjects[0]), None);

        let mut s = student(1);
        s.effort_grade = Some(" B ".to_string());
        assert_eq!(RecordedContent.effort_grade(&s).as_deref(), Some("B"));
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let provider = PlaceholderContent::new(Labels::for_language(Language::Secondary));
        let s = student(42);
        let first = provider.discipline_grade(&s);
        assert!(first.is_some());
        assert_eq!(first, provider.discipline_grade(&s));
        let remark = provider.subject_remark(&s, &s.subjects[0]).unwrap();
        assert!(Labels::for_language(Language::Secondary)
            .remarks(PerformanceLevel::VeryGood)
            .contains(&remark.as_str()));
    }

    #[test]
    fn test_placeholder_prefers_record() {
        let provider = PlaceholderContent::new(Labels::for_language(Language::Primary));
        let mut s = student(7);
        s.discipline_grade = Some("A+".to_string());
        s.general_remark = Some("Bravo".to_string());
        assert_eq!(provider.discipline_grade(&s).as_deref(), Some("A+"));
        assert_eq!(provider.general_appreciation(&s).as_deref(), Some("Bravo"));
    }

    #[test]
    fn test_weighted_choice_bounds() {
        let choices = [("x", 1u64), ("y", 0), ("z", 2)];
        assert_eq!(weighted_choice(&choices, 0), Some(&"x"));
        assert_eq!(weighted_choice(&choices, 1), Some(&"z"));
        assert_eq!(weighted_choice(&choices, 5), Some(&"z"));
        let empty: [(&str, u64); 0] = [];
        assert_eq!(weighted_choice(&empty, 3), None);
    }
}
