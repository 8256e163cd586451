//! Question records and the fixed column layout of the interview sheet.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SECTION_LABEL: &str = "セクション";
pub const MAIN_QUESTION_LABEL: &str = "メイン質問";
pub const PROBE_QUESTION_LABEL: &str = "深掘り質問";
pub const EVALUATION_CRITERIA_LABEL: &str = "評価の着眼点";
pub const RESPONSE_NOTES_LABEL: &str = "回答メモ";
pub const RATING_LABEL: &str = "評価(1-5)";

/// Column headers in export order.
pub const COLUMN_LABELS: [&str; 6] = [
    SECTION_LABEL,
    MAIN_QUESTION_LABEL,
    PROBE_QUESTION_LABEL,
    EVALUATION_CRITERIA_LABEL,
    RESPONSE_NOTES_LABEL,
    RATING_LABEL,
];

/// Number of questions the prompt asks for in each section.
pub const QUESTIONS_PER_SECTION: usize = 3;

/// One row of the generated question sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub section: String,
    pub main_question: String,
    pub probe_question: String,
    pub evaluation_criteria: String,
    #[serde(default)]
    pub response_notes: String,
    #[serde(default)]
    pub rating: String,
}

impl Record {
    /// A freshly generated record: the two interviewer columns start empty.
    pub fn generated(
        section: impl Into<String>,
        main_question: impl Into<String>,
        probe_question: impl Into<String>,
        evaluation_criteria: impl Into<String>,
    ) -> Self {
        Self {
            section: section.into(),
            main_question: main_question.into(),
            probe_question: probe_question.into(),
            evaluation_criteria: evaluation_criteria.into(),
            response_notes: String::new(),
            rating: String::new(),
        }
    }

    /// Cell values in `COLUMN_LABELS` order.
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.section,
            &self.main_question,
            &self.probe_question,
            &self.evaluation_criteria,
            &self.response_notes,
            &self.rating,
        ]
    }

    /// The typed section, if the label is one of the five known categories.
    pub fn known_section(&self) -> Option<Section> {
        Section::from_label(&self.section)
    }
}

/// The five interview topic categories the prompt asks the model to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Academics,
    Internship,
    Collaboration,
    Motivation,
    FiveYearVision,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Academics,
        Section::Internship,
        Section::Collaboration,
        Section::Motivation,
        Section::FiveYearVision,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Academics => "学業・ゼミ・研究",
            Section::Internship => "学業以外（インターン）",
            Section::Collaboration => "周囲を巻き込んだ経験",
            Section::Motivation => "志望動機",
            Section::FiveYearVision => "5年後の姿",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_record_has_empty_editable_cells() {
        let r = Record::generated("志望動機", "Q1", "Q2", "C1");
        assert_eq!(r.response_notes, "");
        assert_eq!(r.rating, "");
        assert_eq!(r.cells(), ["志望動機", "Q1", "Q2", "C1", "", ""]);
    }

    #[test]
    fn section_labels_round_trip() {
        for section in Section::ALL {
            assert_eq!(Section::from_label(section.label()), Some(section));
        }
        assert_eq!(Section::from_label(" 志望動機 "), Some(Section::Motivation));
        assert_eq!(Section::from_label("趣味"), None);
    }
}
