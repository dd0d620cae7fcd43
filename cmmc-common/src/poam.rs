//! POA&M (Plan of Action and Milestones) items
//!
//! Items are edited by hand, or generated for every in-scope practice that is
//! `not_met` or `partial` and has no open item yet. Generation is idempotent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::practice::Practice;
use crate::records::{PracticeRecord, PracticeStatus};
use crate::scoring::status_of;
use crate::state::{PoamItem, PoamStatus};

/// Editable fields of a POA&M item
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoamDraft {
    pub practice_id: Option<String>,
    pub weakness: Option<String>,
    pub remediation_plan: Option<String>,
    pub responsible_party: Option<String>,
    pub milestone_date: Option<NaiveDate>,
    pub status: Option<PoamStatus>,
}

impl PoamDraft {
    /// Apply the fields present in the draft
    pub fn apply_to(self, item: &mut PoamItem, now: DateTime<Utc>) {
        if let Some(practice_id) = self.practice_id {
            item.practice_id = practice_id;
        }
        if let Some(weakness) = self.weakness {
            item.weakness = weakness;
        }
        if let Some(plan) = self.remediation_plan {
            item.remediation_plan = plan;
        }
        if let Some(party) = self.responsible_party {
            item.responsible_party = party;
        }
        if self.milestone_date.is_some() {
            item.milestone_date = self.milestone_date;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        item.updated_at = now;
    }
}

/// Blank open item for a practice
pub fn new_item(practice_id: &str, now: DateTime<Utc>) -> PoamItem {
    PoamItem {
        id: Uuid::new_v4(),
        practice_id: practice_id.to_string(),
        weakness: String::new(),
        remediation_plan: String::new(),
        responsible_party: String::new(),
        milestone_date: None,
        status: PoamStatus::Open,
        created_at: now,
        updated_at: now,
    }
}

fn needs_remediation(status: PracticeStatus) -> bool {
    matches!(status, PracticeStatus::NotMet | PracticeStatus::Partial)
}

/// Items for practices that need remediation and have no unclosed item
pub fn generate_items(
    practices: &[Practice],
    records: &BTreeMap<String, PracticeRecord>,
    existing: &[PoamItem],
    now: DateTime<Utc>,
) -> Vec<PoamItem> {
    let covered: HashSet<&str> = existing
        .iter()
        .filter(|item| item.status != PoamStatus::Closed)
        .map(|item| item.practice_id.as_str())
        .collect();

    practices
        .iter()
        .filter(|p| needs_remediation(status_of(records, &p.id)))
        .filter(|p| !covered.contains(p.id.as_str()))
        .map(|p| {
            let mut item = new_item(&p.id, now);
            item.weakness = weakness_text(p, records.get(&p.id));
            item
        })
        .collect()
}

fn weakness_text(practice: &Practice, record: Option<&PracticeRecord>) -> String {
    let status = record.map(|r| r.status).unwrap_or_default();
    let mut text = format!(
        "{} {} is {}",
        practice.id,
        practice.title,
        match status {
            PracticeStatus::Partial => "partially implemented",
            _ => "not implemented",
        }
    );
    if let Some(note) = record.map(|r| r.note.trim()).filter(|n| !n.is_empty()) {
        text.push_str(": ");
        text.push_str(note);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn practice(id: &str) -> Practice {
        Practice {
            id: id.to_string(),
            domain: "Access Control".to_string(),
            title: "Title".to_string(),
            description: String::new(),
            objectives: vec![],
            references: vec![],
            further_discussion: vec![],
            examples: vec![],
            key_references: vec![],
            sprs_points: None,
        }
    }

    fn record(status: PracticeStatus, note: &str) -> PracticeRecord {
        PracticeRecord {
            status,
            note: note.to_string(),
            ..PracticeRecord::default()
        }
    }

    #[test]
    fn test_generates_for_not_met_and_partial_only() {
        let practices = vec![practice("A.L1-1"), practice("A.L1-2"), practice("A.L1-3"), practice("A.L1-4")];
        let mut records = BTreeMap::new();
        records.insert("A.L1-1".to_string(), record(PracticeStatus::NotMet, "no MFA"));
        records.insert("A.L1-2".to_string(), record(PracticeStatus::Partial, ""));
        records.insert("A.L1-3".to_string(), record(PracticeStatus::Met, ""));

        let items = generate_items(&practices, &records, &[], Utc::now());
        let ids: Vec<&str> = items.iter().map(|i| i.practice_id.as_str()).collect();
        assert_eq!(ids, vec!["A.L1-1", "A.L1-2"]);
        assert_eq!(items[0].weakness, "A.L1-1 Title is not implemented: no MFA");
        assert_eq!(items[1].weakness, "A.L1-2 Title is partially implemented");
        assert!(items.iter().all(|i| i.status == PoamStatus::Open));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let practices = vec![practice("A.L1-1")];
        let mut records = BTreeMap::new();
        records.insert("A.L1-1".to_string(), record(PracticeStatus::NotMet, ""));

        let first = generate_items(&practices, &records, &[], Utc::now());
        assert_eq!(first.len(), 1);
        let second = generate_items(&practices, &records, &first, Utc::now());
        assert!(second.is_empty());

        // A closed item does not count as coverage
        let mut closed = first.clone();
        closed[0].status = PoamStatus::Closed;
        assert_eq!(generate_items(&practices, &records, &closed, Utc::now()).len(), 1);
    }

    #[test]
    fn test_draft_applies_present_fields() {
        let now = Utc::now();
        let mut item = new_item("A.L1-1", now);
        let draft = PoamDraft {
            remediation_plan: Some("Deploy MFA".to_string()),
            status: Some(PoamStatus::InProgress),
            ..PoamDraft::default()
        };
        draft.apply_to(&mut item, now);
        assert_eq!(item.remediation_plan, "Deploy MFA");
        assert_eq!(item.status, PoamStatus::InProgress);
        assert_eq!(item.practice_id, "A.L1-1");
    }
}
