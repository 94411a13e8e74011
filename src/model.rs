//! Input records handed to the engine by the surrounding application
//!
//! Records are already validated upstream; the engine only checks that the
//! identity fields it prints and hashes are present.

use serde::{Deserialize, Serialize};

use crate::error::{RendererError, RendererResult};

/// Scale that all grades are expressed on.
pub const GRADE_SCALE: f64 = 20.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizationRecord {
    pub id: u64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub motto: Option<String>,
    pub logo: Option<String>,
    pub regional_office: Option<String>,
    pub departmental_office: Option<String>,
    pub principal_name: Option<String>,
    pub principal_signature: Option<String>,
}

impl OrganizationRecord {
    pub fn validate(&self) -> RendererResult<()> {
        if self.name.trim().is_empty() {
            return Err(RendererError::MissingField("organization.name".to_string()));
        }
        Ok(())
    }

    /// Single contact line used in the header and footer.
    pub fn contact_line(&self) -> String {
        [&self.address, &self.phone, &self.email]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

/// One subject line of a bulletin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubjectRow {
    pub name: String,
    pub scores: Vec<f64>,
    /// Explicit average; takes precedence over the mean of `scores`.
    pub average: Option<f64>,
    pub coefficient: f64,
    pub teacher: Option<String>,
    pub remark: Option<String>,
}

impl SubjectRow {
    pub fn aggregate(&self) -> f64 {
        if let Some(avg) = self.average {
            return avg;
        }
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    /// Always recomputed from the aggregate and coefficient.
    pub fn weighted_total(&self) -> f64 {
        self.aggregate() * self.coefficient
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Attendance {
    pub absences: u32,
    pub excused_absences: u32,
    pub lates: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassStatistics {
    pub highest: f64,
    pub lowest: f64,
    pub class_average: f64,
}

/// A student's record for one reporting period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: Option<u64>,
    pub first_name: String,
    pub last_name: String,
    pub matricule: Option<String>,
    pub class_name: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub gender: Option<String>,
    pub photo: Option<String>,
    pub class_teacher: Option<String>,
    pub class_teacher_signature: Option<String>,
    pub period_id: String,
    pub period_label: Option<String>,
    pub academic_year_id: String,
    pub subjects: Vec<SubjectRow>,
    pub rank: Option<u32>,
    pub class_size: Option<u32>,
    pub attendance: Option<Attendance>,
    pub conduct: Option<String>,
    pub discipline_grade: Option<String>,
    pub effort_grade: Option<String>,
    pub statistics: Option<ClassStatistics>,
    pub general_remark: Option<String>,
    pub council_decision: Option<String>,
}

impl StudentRecord {
    /// Presence checks for the fields the document cannot be drawn without.
    pub fn validate(&self) -> RendererResult<u64> {
        let id = self
            .id
            .ok_or_else(|| RendererError::MissingField("student.id".to_string()))?;
        if self.last_name.trim().is_empty() && self.first_name.trim().is_empty() {
            return Err(RendererError::MissingField("student.name".to_string()));
        }
        if self.period_id.trim().is_empty() {
            return Err(RendererError::MissingField("student.periodId".to_string()));
        }
        if self.academic_year_id.trim().is_empty() {
            return Err(RendererError::MissingField("student.academicYearId".to_string()));
        }
        for (i, row) in self.subjects.iter().enumerate() {
            if !row.coefficient.is_finite() || row.coefficient < 0.0 {
                return Err(RendererError::InvalidValue(
                    format!("subjects[{}].coefficient", i),
                    row.coefficient.to_string(),
                ));
            }
        }
        Ok(id)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name.trim().to_uppercase(), self.first_name.trim())
            .trim()
            .to_string()
    }

    pub fn overall_average(&self) -> f64 {
        overall_average(&self.subjects)
    }
}

/// Σ(aggregate × coefficient) / Σ(coefficient), 0 when the coefficients sum to 0.
pub fn overall_average(rows: &[SubjectRow]) -> f64 {
    let coefficients: f64 = rows.iter().map(|r| r.coefficient).sum();
    if coefficients == 0.0 {
        return 0.0;
    }
    rows.iter().map(SubjectRow::weighted_total).sum::<f64>() / coefficients
}

/// Fixed one-decimal rendering of averages and weighted totals.
pub fn format_score(value: f64) -> String {
    format!("{:.1}", value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Insufficient,
}

impl PerformanceLevel {
    pub const ALL: [PerformanceLevel; 5] = [
        PerformanceLevel::Excellent,
        PerformanceLevel::VeryGood,
        PerformanceLevel::Good,
        PerformanceLevel::Fair,
        PerformanceLevel::Insufficient,
    ];

    pub fn from_average(avg: f64) -> Self {
        match avg {
            a if a >= 16.0 => PerformanceLevel::Excellent,
            a if a >= 14.0 => PerformanceLevel::VeryGood,
            a if a >= 12.0 => PerformanceLevel::Good,
            a if a >= 10.0 => PerformanceLevel::Fair,
            _ => PerformanceLevel::Insufficient,
        }
    }

    /// Lower bound of the band on the 20-point scale.
    pub fn threshold(self) -> f64 {
        match self {
            PerformanceLevel::Excellent => 16.0,
            PerformanceLevel::VeryGood => 14.0,
            PerformanceLevel::Good => 12.0,
            PerformanceLevel::Fair => 10.0,
            PerformanceLevel::Insufficient => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
    pub is_break: bool,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimetableEntry {
    pub day: usize,
    pub slot: usize,
    pub subject: String,
    pub teacher: Option<String>,
    pub room: Option<String>,
}

/// A class's weekly schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimetableRecord {
    pub class_id: Option<u64>,
    pub class_name: String,
    pub academic_year_id: String,
    pub head_teacher: Option<String>,
    pub room: Option<String>,
    pub days: Vec<String>,
    pub slots: Vec<TimeSlot>,
    pub entries: Vec<TimetableEntry>,
}

impl TimetableRecord {
    pub fn validate(&self) -> RendererResult<u64> {
        let id = self
            .class_id
            .ok_or_else(|| RendererError::MissingField("timetable.classId".to_string()))?;
        if self.class_name.trim().is_empty() {
            return Err(RendererError::MissingField("timetable.className".to_string()));
        }
        if self.days.is_empty() {
            return Err(RendererError::MissingField("timetable.days".to_string()));
        }
        for entry in &self.entries {
            if entry.day >= self.days.len() || entry.slot >= self.slots.len() {
                return Err(RendererError::InvalidValue(
                    "timetable.entries".to_string(),
                    format!("entry '{}' at day {} slot {} is out of range", entry.subject, entry.day, entry.slot),
                ));
            }
        }
        Ok(id)
    }

    pub fn entry_at(&self, day: usize, slot: usize) -> Option<&TimetableEntry> {
        self.entries.iter().find(|e| e.day == day && e.slot == slot)
    }
}
