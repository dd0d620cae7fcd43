//! Canonical practice model
//!
//! Every catalog input shape (L1 prepop, L2 prepop, mined) is converted into
//! [`Practice`] at the boundary. Nothing downstream looks at raw JSON.

use serde::{Deserialize, Serialize};

/// Marker that identifies a Level 1 practice identifier, e.g. `AC.L1-3.1.1`
pub const LEVEL_ONE_MARKER: &str = ".L1-";

/// CMMC level of a practice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PracticeLevel {
    #[serde(rename = "L1")]
    Level1,
    #[serde(rename = "L2")]
    Level2,
}

impl PracticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PracticeLevel::Level1 => "L1",
            PracticeLevel::Level2 => "L2",
        }
    }
}

/// Returns true iff the identifier contains the literal substring `.L1-`.
///
/// This is the only authority for practice level. Level fields carried in
/// input documents are ignored.
pub fn is_level_one(practice_id: &str) -> bool {
    practice_id.contains(LEVEL_ONE_MARKER)
}

/// Classify a practice identifier into its level
pub fn classify_level(practice_id: &str) -> PracticeLevel {
    if is_level_one(practice_id) {
        PracticeLevel::Level1
    } else {
        PracticeLevel::Level2
    }
}

/// One assessment objective of a practice (e.g. `AC.L1-3.1.1[a]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentObjective {
    pub id: String,
    pub text: String,
}

/// Canonical catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practice {
    pub id: String,
    /// Canonical domain name, e.g. "Access Control"
    pub domain: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<AssessmentObjective>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub further_discussion: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub key_references: Vec<String>,
    /// Explicit SPRS deduction weight, when the catalog provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprs_points: Option<u32>,
}

impl Practice {
    pub fn level(&self) -> PracticeLevel {
        classify_level(&self.id)
    }

    pub fn is_level_one(&self) -> bool {
        is_level_one(&self.id)
    }
}
