//! Persisted assessment state
//!
//! [`PersistedState`] is the versioned envelope written to the key-value
//! store. Field names are camelCase on the wire. A stored envelope whose
//! `version` differs from [`SCHEMA_VERSION`] is discarded whole.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::practice::Practice;
use crate::records::PracticeRecord;

/// Current envelope schema version. Bumping this discards stored state.
pub const SCHEMA_VERSION: u32 = 3;

/// Assessment scope the organization is subscribed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubscriptionLevel {
    #[default]
    L1,
    L2,
}

impl SubscriptionLevel {
    /// Whether a practice is visible at this level
    pub fn includes(&self, practice: &Practice) -> bool {
        match self {
            SubscriptionLevel::L1 => practice.is_level_one(),
            SubscriptionLevel::L2 => true,
        }
    }

    /// One-way transition. L2 stays L2.
    pub fn upgraded(self) -> Self {
        SubscriptionLevel::L2
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionLevel::L1 => "L1",
            SubscriptionLevel::L2 => "L2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    pub company_name: String,
    pub cage_code: String,
    pub uei: String,
    pub address: String,
    pub point_of_contact: String,
    pub email: String,
    pub phone: String,
    pub system_name: String,
    pub system_description: String,
    pub assessment_scope: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Ssp,
    Poam,
    Sprs,
    Gap,
}

/// Report snapshot kept for later download; the payload is opaque here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReport {
    pub id: Uuid,
    pub kind: ReportKind,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoamStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

/// Plan of Action and Milestones entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoamItem {
    pub id: Uuid,
    pub practice_id: String,
    #[serde(default)]
    pub weakness: String,
    #[serde(default)]
    pub remediation_plan: String,
    #[serde(default)]
    pub responsible_party: String,
    #[serde(default)]
    pub milestone_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: PoamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsibilityOwner {
    #[default]
    Organization,
    Provider,
    Shared,
    Inherited,
}

/// Who is responsible for implementing a practice
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponsibilityEntry {
    pub owner: ResponsibilityOwner,
    pub provider_name: String,
    pub notes: String,
}

/// Versioned envelope of all mutable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub version: u32,
    #[serde(default)]
    pub subscription_level: SubscriptionLevel,
    #[serde(default)]
    pub company_profile: CompanyProfile,
    #[serde(default)]
    pub practice_records: BTreeMap<String, PracticeRecord>,
    #[serde(default)]
    pub mined_practices: Vec<Practice>,
    #[serde(default)]
    pub analyzer_answers: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub saved_reports: Vec<SavedReport>,
    #[serde(default)]
    pub poam_items: Vec<PoamItem>,
    #[serde(default)]
    pub responsibility_matrix: BTreeMap<String, ResponsibilityEntry>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            subscription_level: SubscriptionLevel::default(),
            company_profile: CompanyProfile::default(),
            practice_records: BTreeMap::new(),
            mined_practices: Vec::new(),
            analyzer_answers: BTreeMap::new(),
            saved_reports: Vec::new(),
            poam_items: Vec::new(),
            responsibility_matrix: BTreeMap::new(),
        }
    }
}
