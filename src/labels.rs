//! Printed strings for the two supported languages

use crate::config::Language;
use crate::model::PerformanceLevel;

#[derive(Debug)]
pub struct Labels {
    pub bulletin_title: &'static str,
    pub timetable_title: &'static str,
    pub academic_year: &'static str,
    pub period: &'static str,
    pub student: &'static str,
    pub matricule: &'static str,
    pub class: &'static str,
    pub born: &'static str,
    pub at: &'static str,
    pub gender: &'static str,
    pub class_size: &'static str,
    pub class_teacher: &'static str,
    pub head_teacher: &'static str,
    pub room: &'static str,
    pub photo: &'static str,
    pub subject: &'static str,
    pub score: &'static str,
    pub average: &'static str,
    pub coefficient: &'static str,
    pub weighted_total: &'static str,
    pub remark: &'static str,
    pub level: &'static str,
    pub teacher: &'static str,
    pub overall_average: &'static str,
    pub total_coefficients: &'static str,
    pub rank: &'static str,
    pub of: &'static str,
    pub appreciation: &'static str,
    pub decision: &'static str,
    pub discipline: &'static str,
    pub effort: &'static str,
    pub highest: &'static str,
    pub lowest: &'static str,
    pub class_average: &'static str,
    pub absences: &'static str,
    pub excused: &'static str,
    pub lates: &'static str,
    pub conduct: &'static str,
    pub legend: &'static str,
    pub parent_signature: &'static str,
    pub principal: &'static str,
    pub time: &'static str,
    pub break_label: &'static str,
    pub verification_code: &'static str,
    pub authenticity: &'static str,
    pub regional_office: &'static str,
    pub departmental_office: &'static str,
    levels: [&'static str; 5],
    appreciations: [&'static str; 5],
    decision_passed: &'static str,
    decision_warning: &'static str,
    remarks: [&'static [&'static str]; 5],
}

static FRENCH: Labels = Labels {
    bulletin_title: "BULLETIN DE NOTES",
    timetable_title: "EMPLOI DU TEMPS",
    academic_year: "Année scolaire",
    period: "Période",
    student: "Élève",
    matricule: "Matricule",
    class: "Classe",
    born: "Né(e) le",
    at: "à",
    gender: "Sexe",
    class_size: "Effectif",
    class_teacher: "Professeur principal",
    head_teacher: "Professeur principal",
    room: "Salle",
    photo: "PHOTO",
    subject: "Matière",
    score: "Note",
    average: "Moy.",
    coefficient: "Coef.",
    weighted_total: "Total",
    remark: "Appréciation",
    level: "Niveau",
    teacher: "Enseignant",
    overall_average: "Moyenne générale",
    total_coefficients: "Total coef.",
    rank: "Rang",
    of: "sur",
    appreciation: "Appréciation générale",
    decision: "Décision du conseil",
    discipline: "Discipline",
    effort: "Travail",
    highest: "Plus forte moyenne",
    lowest: "Plus faible moyenne",
    class_average: "Moyenne de la classe",
    absences: "Absences",
    excused: "justifiées",
    lates: "Retards",
    conduct: "Conduite",
    legend: "Niveaux",
    parent_signature: "Le parent",
    principal: "Le chef d'établissement",
    time: "Horaire",
    break_label: "PAUSE",
    verification_code: "Code de vérification",
    authenticity: "Document authentifiable en ligne : scannez le code ou saisissez-le sur le site de vérification.",
    regional_office: "Délégation régionale",
    departmental_office: "Délégation départementale",
    levels: ["Excellent", "Très bien", "Bien", "Passable", "Insuffisant"],
    appreciations: [
        "Excellent travail, félicitations.",
        "Très bon trimestre, continuez ainsi.",
        "Bon travail dans l'ensemble.",
        "Résultats justes, des efforts sont attendus.",
        "Résultats insuffisants, un travail sérieux s'impose.",
    ],
    decision_passed: "Admis(e)",
    decision_warning: "Avertissement travail",
    remarks: [
        &["Excellent", "Remarquable", "Très bon niveau"],
        &["Très bien", "Très bon travail", "Sérieux"],
        &["Bien", "Bon travail", "Peut mieux faire"],
        &["Assez bien", "Doit persévérer", "Passable"],
        &["Insuffisant", "Travail insuffisant", "Doit se ressaisir"],
    ],
};

static ENGLISH: Labels = Labels {
    bulletin_title: "REPORT CARD",
    timetable_title: "WEEKLY TIMETABLE",
    academic_year: "Academic year",
    period: "Term",
    student: "Student",
    matricule: "Student no.",
    class: "Class",
    born: "Born on",
    at: "in",
    gender: "Gender",
    class_size: "Class size",
    class_teacher: "Class teacher",
    head_teacher: "Head teacher",
    room: "Room",
    photo: "PHOTO",
    subject: "Subject",
    score: "Mark",
    average: "Avg.",
    coefficient: "Coef.",
    weighted_total: "Total",
    remark: "Remark",
    level: "Level",
    teacher: "Teacher",
    overall_average: "Overall average",
    total_coefficients: "Total coef.",
    rank: "Rank",
    of: "of",
    appreciation: "General remark",
    decision: "Council decision",
    discipline: "Discipline",
    effort: "Effort",
    highest: "Highest average",
    lowest: "Lowest average",
    class_average: "Class average",
    absences: "Absences",
    excused: "excused",
    lates: "Lates",
    conduct: "Conduct",
    legend: "Levels",
    parent_signature: "Parent",
    principal: "Principal",
    time: "Time",
    break_label: "BREAK",
    verification_code: "Verification code",
    authenticity: "This document can be verified online: scan the code or enter it on the verification site.",
    regional_office: "Regional office",
    departmental_office: "Divisional office",
    levels: ["Excellent", "Very good", "Good", "Fair", "Insufficient"],
    appreciations: [
        "Excellent work, congratulations.",
        "Very good term, keep it up.",
        "Good work overall.",
        "Fair results, more effort is expected.",
        "Insufficient results, serious work is required.",
    ],
    decision_passed: "Passed",
    decision_warning: "Work warning",
    remarks: [
        &["Excellent", "Outstanding", "Very high standard"],
        &["Very good", "Very good work", "Diligent"],
        &["Good", "Good work", "Could do better"],
        &["Fair", "Must persevere", "Satisfactory"],
        &["Insufficient", "Poor work", "Must improve"],
    ],
};

fn level_index(level: PerformanceLevel) -> usize {
    match level {
        PerformanceLevel::Excellent => 0,
        PerformanceLevel::VeryGood => 1,
        PerformanceLevel::Good => 2,
        PerformanceLevel::Fair => 3,
        PerformanceLevel::Insufficient => 4,
    }
}

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::Primary => &FRENCH,
            Language::Secondary => &ENGLISH,
        }
    }

    pub fn level(&self, level: PerformanceLevel) -> &'static str {
        self.levels[level_index(level)]
    }

    /// General appreciation used when the record carries none.
    pub fn appreciation_for(&self, average: f64) -> &'static str {
        self.appreciations[level_index(PerformanceLevel::from_average(average))]
    }

    /// Council decision used when the record carries none.
    pub fn decision_for(&self, average: f64) -> &'static str {
        if average >= PerformanceLevel::Fair.threshold() {
            self.decision_passed
        } else {
            self.decision_warning
        }
    }

    /// Candidate subject remarks for a performance band.
    pub fn remarks(&self, level: PerformanceLevel) -> &'static [&'static str] {
        self.remarks[level_index(level)]
    }
}
