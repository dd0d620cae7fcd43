//! Assessment engine
//!
//! Owns the loaded catalogs, the merged practice map, and the mutable
//! [`PersistedState`]. Every mutation is a plain `&mut self` method applied
//! to the current snapshot; callers persist [`AssessmentEngine::state`]
//! afterwards.
//!
//! Invariants kept after every call:
//! - each practice in the merged catalog has a [`PracticeRecord`]
//! - each record has an objective entry for every catalog objective
//! - objective edits re-derive the practice status

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::loader::LoadedCatalogs;
use crate::catalog::Catalog;
use crate::merge::{CatalogView, Domain, MergedCatalog};
use crate::poam::{self, PoamDraft};
use crate::practice::Practice;
use crate::records::{ObjectiveStatus, PracticeRecord, PracticeStatus, StatusSource};
use crate::scoring::{self, ScoreSummary};
use crate::state::{
    CompanyProfile, PersistedState, PoamItem, ResponsibilityEntry, SavedReport, SubscriptionLevel,
};
use crate::{Error, Result};

/// Partial update of one assessment objective
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectiveUpdate {
    pub status: Option<ObjectiveStatus>,
    pub note: Option<String>,
    pub artifacts: Option<Vec<String>>,
}

/// Raw (unfiltered) catalog facts for diagnostics tooling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub subscription_level: SubscriptionLevel,
    pub level1_catalog_practices: usize,
    pub level2_catalog_practices: usize,
    pub mined_practices: usize,
    pub raw_practices: usize,
    pub raw_domains: usize,
    pub visible_practices: usize,
    pub visible_domains: usize,
    pub records: usize,
    /// Records whose practice is no longer in the catalog
    pub orphan_records: Vec<String>,
    pub raw_domain_names: Vec<String>,
}

pub struct AssessmentEngine {
    level1: Catalog,
    level2: Catalog,
    merged: MergedCatalog,
    state: PersistedState,
}

impl AssessmentEngine {
    pub fn new(catalogs: LoadedCatalogs, state: PersistedState) -> Self {
        let mut engine = Self {
            level1: catalogs.level1,
            level2: catalogs.level2,
            merged: MergedCatalog::default(),
            state,
        };
        engine.remerge();
        engine
    }

    /// Rebuild the merged map and make sure every practice has a record
    fn remerge(&mut self) {
        self.merged = MergedCatalog::build(&self.level2, &self.level1, &self.state.mined_practices);

        let mut created = 0usize;
        for practice in self.merged.raw_practices().values() {
            match self.state.practice_records.get_mut(&practice.id) {
                Some(record) => {
                    // Objective-driven statuses follow the new objective set
                    if record.sync_objectives(practice) && record.status_source == StatusSource::Auto {
                        record.rederive_status();
                    }
                }
                None => {
                    self.state
                        .practice_records
                        .insert(practice.id.clone(), PracticeRecord::for_practice(practice));
                    created += 1;
                }
            }
        }

        info!(
            practices = self.merged.len(),
            domains = self.merged.raw_domains().len(),
            new_records = created,
            "Practice catalog merged"
        );
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn subscription_level(&self) -> SubscriptionLevel {
        self.state.subscription_level
    }

    pub fn merged(&self) -> &MergedCatalog {
        &self.merged
    }

    /// Level-filtered domains and practices
    pub fn view(&self) -> CatalogView {
        self.merged.view(self.state.subscription_level)
    }

    pub fn domains(&self) -> Vec<Domain> {
        self.view().domains
    }

    pub fn all_practices(&self) -> Vec<Practice> {
        self.view().all_practices
    }

    pub fn practice(&self, practice_id: &str) -> Option<&Practice> {
        self.merged.get(practice_id)
    }

    pub fn record(&self, practice_id: &str) -> Option<&PracticeRecord> {
        self.state.practice_records.get(practice_id)
    }

    pub fn scores(&self) -> ScoreSummary {
        scoring::summarize(&self.view(), &self.merged, &self.state.practice_records)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let view = self.view();
        let orphan_records = self
            .state
            .practice_records
            .keys()
            .filter(|id| !self.merged.contains(id))
            .cloned()
            .collect();

        Diagnostics {
            subscription_level: self.state.subscription_level,
            level1_catalog_practices: self.level1.len(),
            level2_catalog_practices: self.level2.len(),
            mined_practices: self.state.mined_practices.len(),
            raw_practices: self.merged.len(),
            raw_domains: self.merged.raw_domains().len(),
            visible_practices: view.all_practices.len(),
            visible_domains: view.domains.len(),
            records: self.state.practice_records.len(),
            orphan_records,
            raw_domain_names: self
                .merged
                .raw_domains()
                .iter()
                .map(|d| d.name.clone())
                .collect(),
        }
    }

    // ------------------------------------------------------------------
    // Practice records
    // ------------------------------------------------------------------

    fn record_mut(&mut self, practice_id: &str) -> Result<&mut PracticeRecord> {
        if !self.merged.contains(practice_id) {
            return Err(Error::NotFound(format!("practice {}", practice_id)));
        }
        self.state
            .practice_records
            .get_mut(practice_id)
            .ok_or_else(|| Error::Internal(format!("missing record for {}", practice_id)))
    }

    /// Set a practice status directly (assessor or analyzer)
    pub fn set_practice_status(
        &mut self,
        practice_id: &str,
        status: PracticeStatus,
        source: StatusSource,
    ) -> Result<&PracticeRecord> {
        let record = self.record_mut(practice_id)?;
        record.status = status;
        record.status_source = source;
        record.touch(Utc::now());
        debug!(practice = practice_id, status = status.as_str(), "Practice status set");
        Ok(record)
    }

    pub fn set_practice_note(&mut self, practice_id: &str, note: String) -> Result<&PracticeRecord> {
        let record = self.record_mut(practice_id)?;
        record.note = note;
        record.touch(Utc::now());
        Ok(record)
    }

    /// Update one objective; a status change re-derives the practice status
    pub fn update_objective(
        &mut self,
        practice_id: &str,
        objective_id: &str,
        update: ObjectiveUpdate,
    ) -> Result<&PracticeRecord> {
        let record = self.record_mut(practice_id)?;
        let objective = record.objectives.get_mut(objective_id).ok_or_else(|| {
            Error::NotFound(format!("objective {} of practice {}", objective_id, practice_id))
        })?;

        let status_changed = update.status.is_some();
        if let Some(status) = update.status {
            objective.status = status;
        }
        if let Some(note) = update.note {
            objective.note = note;
        }
        if let Some(artifacts) = update.artifacts {
            objective.artifacts = artifacts;
        }

        if status_changed {
            record.rederive_status();
            debug!(
                practice = practice_id,
                objective = objective_id,
                status = record.status.as_str(),
                "Practice status re-derived"
            );
        }
        record.touch(Utc::now());
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Mined practices and subscription
    // ------------------------------------------------------------------

    /// Commit mined practices: they override catalog entries by identifier
    pub fn commit_mined(&mut self, practices: Vec<Practice>) -> Result<usize> {
        if let Some(bad) = practices.iter().find(|p| p.id.trim().is_empty()) {
            return Err(Error::InvalidInput(format!(
                "mined practice without identifier (title: {:?})",
                bad.title
            )));
        }

        let count = practices.len();
        for practice in practices {
            match self
                .state
                .mined_practices
                .iter_mut()
                .find(|p| p.id == practice.id)
            {
                Some(existing) => *existing = practice,
                None => self.state.mined_practices.push(practice),
            }
        }

        info!(committed = count, total = self.state.mined_practices.len(), "Mined practices committed");
        self.remerge();
        Ok(count)
    }

    /// L1 → L2. Returns true if the level changed.
    pub fn upgrade(&mut self) -> bool {
        let before = self.state.subscription_level;
        self.state.subscription_level = before.upgraded();
        let changed = before != self.state.subscription_level;
        if changed {
            info!("Subscription upgraded to {}", self.state.subscription_level.as_str());
        }
        changed
    }

    // ------------------------------------------------------------------
    // Profile, analyzer, reports, responsibility
    // ------------------------------------------------------------------

    pub fn set_company_profile(&mut self, profile: CompanyProfile) {
        self.state.company_profile = profile;
    }

    /// Merge answers into the questionnaire map; `null` removes an answer
    pub fn merge_analyzer_answers(&mut self, answers: BTreeMap<String, serde_json::Value>) {
        for (question, answer) in answers {
            if answer.is_null() {
                self.state.analyzer_answers.remove(&question);
            } else {
                self.state.analyzer_answers.insert(question, answer);
            }
        }
    }

    pub fn add_report(&mut self, report: SavedReport) -> &SavedReport {
        self.state.saved_reports.push(report);
        &self.state.saved_reports[self.state.saved_reports.len() - 1]
    }

    pub fn delete_report(&mut self, id: Uuid) -> Result<()> {
        let before = self.state.saved_reports.len();
        self.state.saved_reports.retain(|r| r.id != id);
        if self.state.saved_reports.len() == before {
            return Err(Error::NotFound(format!("report {}", id)));
        }
        Ok(())
    }

    pub fn set_responsibility(&mut self, practice_id: &str, entry: ResponsibilityEntry) -> Result<()> {
        if !self.merged.contains(practice_id) {
            return Err(Error::NotFound(format!("practice {}", practice_id)));
        }
        self.state
            .responsibility_matrix
            .insert(practice_id.to_string(), entry);
        Ok(())
    }

    // ------------------------------------------------------------------
    // POA&M
    // ------------------------------------------------------------------

    pub fn create_poam(&mut self, draft: PoamDraft) -> Result<&PoamItem> {
        let practice_id = draft
            .practice_id
            .clone()
            .ok_or_else(|| Error::InvalidInput("practiceId is required".to_string()))?;
        if !self.merged.contains(&practice_id) {
            return Err(Error::NotFound(format!("practice {}", practice_id)));
        }

        let now = Utc::now();
        let mut item = poam::new_item(&practice_id, now);
        draft.apply_to(&mut item, now);
        self.state.poam_items.push(item);
        Ok(&self.state.poam_items[self.state.poam_items.len() - 1])
    }

    pub fn update_poam(&mut self, id: Uuid, draft: PoamDraft) -> Result<&PoamItem> {
        if let Some(practice_id) = &draft.practice_id {
            if !self.merged.contains(practice_id) {
                return Err(Error::NotFound(format!("practice {}", practice_id)));
            }
        }
        let item = self
            .state
            .poam_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(format!("POA&M item {}", id)))?;
        draft.apply_to(item, Utc::now());
        Ok(item)
    }

    pub fn delete_poam(&mut self, id: Uuid) -> Result<()> {
        let before = self.state.poam_items.len();
        self.state.poam_items.retain(|i| i.id != id);
        if self.state.poam_items.len() == before {
            return Err(Error::NotFound(format!("POA&M item {}", id)));
        }
        Ok(())
    }

    /// Add open items for in-scope practices needing remediation
    pub fn generate_poam(&mut self) -> Vec<PoamItem> {
        let view = self.view();
        let generated = poam::generate_items(
            &view.all_practices,
            &self.state.practice_records,
            &self.state.poam_items,
            Utc::now(),
        );
        info!(generated = generated.len(), "POA&M items generated");
        self.state.poam_items.extend(generated.iter().cloned());
        generated
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Back to an empty assessment; the subscription level survives
    pub fn reset(&mut self) {
        let level = self.state.subscription_level;
        self.state = PersistedState {
            subscription_level: level,
            ..PersistedState::default()
        };
        self.remerge();
        info!("Assessment state reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::AssessmentObjective;
    use crate::state::PoamStatus;

    fn practice(id: &str, domain: &str, title: &str, objectives: &[&str]) -> Practice {
        Practice {
            id: id.to_string(),
            domain: domain.to_string(),
            title: title.to_string(),
            description: String::new(),
            objectives: objectives
                .iter()
                .map(|o| AssessmentObjective {
                    id: format!("{}[{}]", id, o),
                    text: o.to_string(),
                })
                .collect(),
            references: vec![],
            further_discussion: vec![],
            examples: vec![],
            key_references: vec![],
            sprs_points: None,
        }
    }

    fn engine() -> AssessmentEngine {
        let level2 = Catalog {
            practices: vec![
                practice("AC.L1-3.1.1", "Access Control", "L2 copy", &["a", "b"]),
                practice("AC.L2-3.1.3", "Access Control", "Control CUI Flow", &["a"]),
                practice("AU.L2-3.3.1", "Audit and Accountability", "System Auditing", &["a"]),
            ],
            ..Catalog::default()
        };
        let level1 = Catalog {
            practices: vec![practice("AC.L1-3.1.1", "Access Control", "Authorized Access", &["a", "b"])],
            ..Catalog::default()
        };
        AssessmentEngine::new(LoadedCatalogs { level1, level2 }, PersistedState::default())
    }

    #[test]
    fn test_records_created_for_every_practice() {
        let engine = engine();
        assert_eq!(engine.state().practice_records.len(), 3);
        assert_eq!(engine.record("AC.L1-3.1.1").unwrap().objectives.len(), 2);
        assert_eq!(engine.practice("AC.L1-3.1.1").unwrap().title, "Authorized Access");
    }

    #[test]
    fn test_default_level_filters_to_level_one() {
        let mut engine = engine();
        assert_eq!(engine.subscription_level(), SubscriptionLevel::L1);
        assert_eq!(engine.all_practices().len(), 1);
        assert_eq!(engine.domains().len(), 1);

        assert!(engine.upgrade());
        assert!(!engine.upgrade());
        assert_eq!(engine.all_practices().len(), 3);
        assert_eq!(engine.domains().len(), 2);
    }

    #[test]
    fn test_objective_updates_drive_status() {
        let mut engine = engine();
        let id = "AC.L1-3.1.1";

        let record = engine
            .update_objective(
                id,
                "AC.L1-3.1.1[a]",
                ObjectiveUpdate { status: Some(ObjectiveStatus::Met), ..ObjectiveUpdate::default() },
            )
            .unwrap();
        assert_eq!(record.status, PracticeStatus::Partial);
        assert_eq!(record.status_source, StatusSource::Auto);
        assert!(record.last_updated.is_some());

        let record = engine
            .update_objective(
                id,
                "AC.L1-3.1.1[b]",
                ObjectiveUpdate {
                    status: Some(ObjectiveStatus::NotApplicable),
                    ..ObjectiveUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(record.status, PracticeStatus::Met);
        assert_eq!(engine.scores().overall, 100);

        // Note-only update leaves status alone
        engine
            .set_practice_status(id, PracticeStatus::NotMet, StatusSource::Manual)
            .unwrap();
        let record = engine
            .update_objective(
                id,
                "AC.L1-3.1.1[a]",
                ObjectiveUpdate { note: Some("see policy".into()), ..ObjectiveUpdate::default() },
            )
            .unwrap();
        assert_eq!(record.status, PracticeStatus::NotMet);
        assert_eq!(record.status_source, StatusSource::Manual);
        assert_eq!(record.objectives["AC.L1-3.1.1[a]"].note, "see policy");
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let mut engine = engine();
        assert!(matches!(
            engine.set_practice_note("XX.L1-9", "n".into()),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            engine.update_objective("AC.L1-3.1.1", "nope", ObjectiveUpdate::default()),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            engine.set_responsibility("XX.L1-9", ResponsibilityEntry::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_commit_mined_overrides_and_adds() {
        let mut engine = engine();
        let count = engine
            .commit_mined(vec![
                practice("AC.L1-3.1.1", "Access Control", "Mined title", &["a", "b", "c"]),
                practice("SI.L1-3.14.1", "System and Information Integrity", "Flaw Remediation", &["a"]),
            ])
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(engine.practice("AC.L1-3.1.1").unwrap().title, "Mined title");
        // Existing record gains the new objective
        assert_eq!(engine.record("AC.L1-3.1.1").unwrap().objectives.len(), 3);
        assert!(engine.record("SI.L1-3.14.1").is_some());
        assert_eq!(engine.all_practices().len(), 2);

        // Re-committing the same id replaces, does not duplicate
        engine
            .commit_mined(vec![practice("SI.L1-3.14.1", "System and Information Integrity", "v2", &["a"])])
            .unwrap();
        assert_eq!(engine.state().mined_practices.len(), 2);
        assert_eq!(engine.practice("SI.L1-3.14.1").unwrap().title, "v2");

        assert!(matches!(
            engine.commit_mined(vec![practice(" ", "Access Control", "bad", &[])]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_overridden_objectives_drive_status() {
        let mut engine = engine();
        engine
            .update_objective(
                "AC.L1-3.1.1",
                "AC.L1-3.1.1[a]",
                ObjectiveUpdate { status: Some(ObjectiveStatus::Met), ..ObjectiveUpdate::default() },
            )
            .unwrap();

        // Mined version replaces [a]/[b] with a single [z]
        engine
            .commit_mined(vec![practice("AC.L1-3.1.1", "Access Control", "Mined", &["z"])])
            .unwrap();
        let keys: Vec<String> = engine.record("AC.L1-3.1.1").unwrap().objectives.keys().cloned().collect();
        assert_eq!(keys, vec!["AC.L1-3.1.1[z]".to_string()]);
        assert_eq!(engine.record("AC.L1-3.1.1").unwrap().status, PracticeStatus::NotAssessed);

        let record = engine
            .update_objective(
                "AC.L1-3.1.1",
                "AC.L1-3.1.1[z]",
                ObjectiveUpdate { status: Some(ObjectiveStatus::Met), ..ObjectiveUpdate::default() },
            )
            .unwrap();
        assert_eq!(record.status, PracticeStatus::Met);
    }

    #[test]
    fn test_state_reload_reproduces_engine() {
        let mut engine = engine();
        engine.upgrade();
        engine
            .set_practice_status("AU.L2-3.3.1", PracticeStatus::Partial, StatusSource::Manual)
            .unwrap();
        engine
            .commit_mined(vec![practice("SI.L1-3.14.1", "System and Information Integrity", "m", &[])])
            .unwrap();

        let json = serde_json::to_string(engine.state()).unwrap();
        let restored_state: PersistedState = serde_json::from_str(&json).unwrap();

        let restored = AssessmentEngine::new(
            LoadedCatalogs {
                level1: engine.level1.clone(),
                level2: engine.level2.clone(),
            },
            restored_state,
        );
        assert_eq!(restored.state(), engine.state());
        assert_eq!(restored.view(), engine.view());
        assert_eq!(restored.scores(), engine.scores());
    }

    #[test]
    fn test_poam_lifecycle() {
        let mut engine = engine();
        engine.upgrade();
        engine
            .set_practice_status("AC.L2-3.1.3", PracticeStatus::NotMet, StatusSource::Manual)
            .unwrap();

        let generated = engine.generate_poam();
        assert_eq!(generated.len(), 1);
        assert!(engine.generate_poam().is_empty());

        let id = generated[0].id;
        let item = engine
            .update_poam(
                id,
                PoamDraft { status: Some(PoamStatus::Closed), ..PoamDraft::default() },
            )
            .unwrap();
        assert_eq!(item.status, PoamStatus::Closed);

        let created = engine
            .create_poam(PoamDraft {
                practice_id: Some("AU.L2-3.3.1".to_string()),
                weakness: Some("No log review".to_string()),
                ..PoamDraft::default()
            })
            .unwrap()
            .id;
        assert_eq!(engine.state().poam_items.len(), 2);

        engine.delete_poam(created).unwrap();
        assert!(matches!(engine.delete_poam(created), Err(Error::NotFound(_))));
        assert!(matches!(engine.create_poam(PoamDraft::default()), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_analyzer_answers_merge() {
        let mut engine = engine();
        let mut answers = BTreeMap::new();
        answers.insert("q1".to_string(), serde_json::json!("yes"));
        answers.insert("q2".to_string(), serde_json::json!(3));
        engine.merge_analyzer_answers(answers);

        let mut update = BTreeMap::new();
        update.insert("q1".to_string(), serde_json::Value::Null);
        engine.merge_analyzer_answers(update);

        assert_eq!(engine.state().analyzer_answers.len(), 1);
        assert_eq!(engine.state().analyzer_answers["q2"], 3);
    }

    #[test]
    fn test_reset_keeps_level() {
        let mut engine = engine();
        engine.upgrade();
        engine
            .set_practice_note("AC.L1-3.1.1", "note".to_string())
            .unwrap();
        engine.reset();
        assert_eq!(engine.subscription_level(), SubscriptionLevel::L2);
        assert_eq!(engine.record("AC.L1-3.1.1").unwrap().note, "");
        assert_eq!(engine.state().practice_records.len(), 3);
    }

    #[test]
    fn test_diagnostics_expose_raw_sets() {
        let engine = engine();
        let diag = engine.diagnostics();
        assert_eq!(diag.raw_practices, 3);
        assert_eq!(diag.visible_practices, 1);
        assert_eq!(diag.raw_domains, 2);
        assert_eq!(diag.visible_domains, 1);
        assert!(diag.orphan_records.is_empty());
    }
}
