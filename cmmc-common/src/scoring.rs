//! Scoring engine
//!
//! Completion percentage: `round((met + 0.5 * partial) / total * 100)`.
//! "partial" is worth half credit. Rounding is `f64::round` (half away from
//! zero); the numerator is never negative, so this matches the half-up
//! behavior the dashboard has always shown. `total == 0` scores 0.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::merge::{CatalogView, MergedCatalog};
use crate::practice::Practice;
use crate::records::{PracticeRecord, PracticeStatus};

/// Maximum (perfect) SPRS score
pub const SPRS_MAX: i32 = 110;

/// SPRS deduction for practices listed as high risk without explicit points
pub const HIGH_RISK_DEDUCTION: u32 = 5;

/// SPRS deduction for every other practice without explicit points
pub const DEFAULT_DEDUCTION: u32 = 1;

/// Completion percentage with half credit for partial practices
pub fn completion_score(met: usize, partial: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let earned = met as f64 + 0.5 * partial as f64;
    (earned / total as f64 * 100.0).round() as u32
}

/// Status tallies for a set of practices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub met: usize,
    pub partial: usize,
    pub not_met: usize,
    pub not_assessed: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: PracticeStatus) {
        match status {
            PracticeStatus::Met => self.met += 1,
            PracticeStatus::Partial => self.partial += 1,
            PracticeStatus::NotMet => self.not_met += 1,
            PracticeStatus::NotAssessed => self.not_assessed += 1,
        }
        self.total += 1;
    }

    pub fn score(&self) -> u32 {
        completion_score(self.met, self.partial, self.total)
    }
}

/// Status of a practice, treating a missing record as not assessed
pub fn status_of(records: &BTreeMap<String, PracticeRecord>, practice_id: &str) -> PracticeStatus {
    records
        .get(practice_id)
        .map(|r| r.status)
        .unwrap_or_default()
}

/// Tally statuses of the given practices
pub fn count_statuses<'a, I>(practices: I, records: &BTreeMap<String, PracticeRecord>) -> StatusCounts
where
    I: IntoIterator<Item = &'a Practice>,
{
    let mut counts = StatusCounts::default();
    for practice in practices {
        counts.add(status_of(records, &practice.id));
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScore {
    pub name: String,
    pub code: Option<String>,
    pub score: u32,
    pub counts: StatusCounts,
}

/// One practice's SPRS deduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SprsDeduction {
    pub practice_id: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprsScore {
    pub score: i32,
    pub max: i32,
    pub deductions: Vec<SprsDeduction>,
}

/// Everything the dashboard shows as numbers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub overall: u32,
    pub counts: StatusCounts,
    pub domains: Vec<DomainScore>,
    pub sprs: SprsScore,
}

/// Score a level-filtered view
pub fn summarize(
    view: &CatalogView,
    merged: &MergedCatalog,
    records: &BTreeMap<String, PracticeRecord>,
) -> ScoreSummary {
    let domains = view
        .domains
        .iter()
        .map(|domain| {
            let counts = count_statuses(&domain.practices, records);
            DomainScore {
                name: domain.name.clone(),
                code: domain.code.clone(),
                score: counts.score(),
                counts,
            }
        })
        .collect();

    let counts = count_statuses(&view.all_practices, records);

    ScoreSummary {
        overall: counts.score(),
        counts,
        domains,
        sprs: sprs_score(&view.all_practices, merged, records),
    }
}

/// SPRS deduction weight of a practice
pub fn sprs_points(practice: &Practice, merged: &MergedCatalog) -> u32 {
    match practice.sprs_points {
        Some(points) => points,
        None if merged.is_high_risk(&practice.id) => HIGH_RISK_DEDUCTION,
        None => DEFAULT_DEDUCTION,
    }
}

/// SPRS score: 110 minus the weight of every in-scope practice not `met`
pub fn sprs_score(
    practices: &[Practice],
    merged: &MergedCatalog,
    records: &BTreeMap<String, PracticeRecord>,
) -> SprsScore {
    let deductions: Vec<SprsDeduction> = practices
        .iter()
        .filter(|p| status_of(records, &p.id) != PracticeStatus::Met)
        .map(|p| SprsDeduction {
            practice_id: p.id.clone(),
            points: sprs_points(p, merged),
        })
        .collect();

    let total: i64 = deductions.iter().map(|d| i64::from(d.points)).sum();
    let score = (i64::from(SPRS_MAX) - total).max(i64::from(i32::MIN)) as i32;

    SprsScore {
        score,
        max: SPRS_MAX,
        deductions,
    }
}
