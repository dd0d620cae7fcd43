//! Mutable assessment state per practice
//!
//! A [`PracticeRecord`] exists 1:1 for each practice in the merged catalog.
//! When objective statuses change, the practice status is re-derived with
//! [`derive_practice_status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::practice::Practice;

/// Assessment status of a whole practice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeStatus {
    Met,
    Partial,
    NotMet,
    #[default]
    NotAssessed,
}

impl PracticeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PracticeStatus::Met => "met",
            PracticeStatus::Partial => "partial",
            PracticeStatus::NotMet => "not_met",
            PracticeStatus::NotAssessed => "not_assessed",
        }
    }
}

/// Where the current practice status came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    /// Set directly by the assessor
    Manual,
    /// Derived from objective statuses
    Auto,
    /// Proposed by the document analyzer
    AnalyzerSuggested,
    #[default]
    None,
}

/// Status of a single assessment objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectiveStatus {
    #[serde(rename = "MET")]
    Met,
    #[serde(rename = "NOT_MET")]
    NotMet,
    #[serde(rename = "N/A")]
    NotApplicable,
    #[default]
    #[serde(rename = "PENDING")]
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveRecord {
    #[serde(default)]
    pub status: ObjectiveStatus,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub artifacts: Vec<String>,
}

/// Mutable assessment state for one practice
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRecord {
    #[serde(default)]
    pub status: PracticeStatus,
    #[serde(default)]
    pub status_source: StatusSource,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub objectives: BTreeMap<String, ObjectiveRecord>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl PracticeRecord {
    /// Fresh record with one pending objective record per catalog objective
    pub fn for_practice(practice: &Practice) -> Self {
        let objectives = practice
            .objectives
            .iter()
            .map(|o| (o.id.clone(), ObjectiveRecord::default()))
            .collect();

        Self {
            objectives,
            ..Self::default()
        }
    }

    /// Make the objective set match the practice: add pending records for new
    /// objectives, drop records for objectives the practice no longer has.
    ///
    /// Returns true if anything changed.
    pub fn sync_objectives(&mut self, practice: &Practice) -> bool {
        let before = self.objectives.len();
        self.objectives
            .retain(|id, _| practice.objectives.iter().any(|o| &o.id == id));
        let mut changed = self.objectives.len() != before;

        for objective in &practice.objectives {
            if !self.objectives.contains_key(&objective.id) {
                self.objectives
                    .insert(objective.id.clone(), ObjectiveRecord::default());
                changed = true;
            }
        }
        changed
    }

    /// Re-derive the practice status from the objective statuses
    pub fn rederive_status(&mut self) {
        self.status = derive_practice_status(self.objectives.values().map(|o| o.status));
        self.status_source = StatusSource::Auto;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now);
    }
}

/// Roll objective statuses up into a practice status.
///
/// - any `NOT_MET` → `not_met`
/// - otherwise, at least one objective and all `MET` or `N/A` → `met`
/// - otherwise, any objective off `PENDING` → `partial`
/// - otherwise (including no objectives) → `not_assessed`
pub fn derive_practice_status<I>(statuses: I) -> PracticeStatus
where
    I: IntoIterator<Item = ObjectiveStatus>,
{
    let mut count = 0usize;
    let mut all_satisfied = true;
    let mut any_touched = false;

    for status in statuses {
        count += 1;
        match status {
            ObjectiveStatus::NotMet => return PracticeStatus::NotMet,
            ObjectiveStatus::Met | ObjectiveStatus::NotApplicable => any_touched = true,
            ObjectiveStatus::Pending => all_satisfied = false,
        }
    }

    if count > 0 && all_satisfied {
        PracticeStatus::Met
    } else if any_touched {
        PracticeStatus::Partial
    } else {
        PracticeStatus::NotAssessed
    }
}
