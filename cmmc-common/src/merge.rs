//! Merge engine
//!
//! Layers three sources into one map keyed by practice identifier, applied in
//! this order (later wins):
//! 1. Level 2 catalog
//! 2. Level 1 catalog (more curated entries for the identifiers it covers)
//! 3. Mined practices (always override)
//!
//! Domains are grouped by canonical name. Practices within a domain sort by
//! identifier; domains sort by the fixed priority order in
//! [`crate::normalize::DOMAINS`], unknown domains last in first-seen order.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::catalog::Catalog;
use crate::normalize::{domain_priority, DOMAINS};
use crate::practice::Practice;
use crate::state::SubscriptionLevel;

/// Derived grouping of practices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Domain {
    pub name: String,
    /// Two-letter code for the 14 canonical domains
    pub code: Option<String>,
    pub practices: Vec<Practice>,
}

/// Result of layering all practice sources
#[derive(Debug, Clone, Default)]
pub struct MergedCatalog {
    practices: BTreeMap<String, Practice>,
    /// Unfiltered, ordered domains
    domains: Vec<Domain>,
    high_risk: BTreeSet<String>,
}

/// Level-filtered view of a merged catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView {
    pub level: SubscriptionLevel,
    pub domains: Vec<Domain>,
    /// Practices in domain order, then identifier order
    pub all_practices: Vec<Practice>,
}

impl MergedCatalog {
    /// Merge the three sources
    pub fn build(level2: &Catalog, level1: &Catalog, mined: &[Practice]) -> Self {
        let mut practices: BTreeMap<String, Practice> = BTreeMap::new();
        let mut first_seen: HashMap<String, usize> = HashMap::new();

        let layers = level2
            .practices
            .iter()
            .chain(level1.practices.iter())
            .chain(mined.iter());

        for practice in layers {
            let next = first_seen.len();
            first_seen.entry(practice.domain.clone()).or_insert(next);
            if practices.insert(practice.id.clone(), practice.clone()).is_some() {
                debug!(practice = %practice.id, "Practice overridden by later source");
            }
        }

        let mut grouped: HashMap<&str, Vec<Practice>> = HashMap::new();
        for practice in practices.values() {
            // BTreeMap iteration keeps each group sorted by identifier
            grouped
                .entry(practice.domain.as_str())
                .or_default()
                .push(practice.clone());
        }

        let mut domains: Vec<Domain> = grouped
            .into_iter()
            .map(|(name, practices)| Domain {
                code: domain_code(name),
                name: name.to_string(),
                practices,
            })
            .collect();

        domains.sort_by_key(|d| {
            (
                domain_priority(&d.name).unwrap_or(usize::MAX),
                first_seen.get(&d.name).copied().unwrap_or(usize::MAX),
            )
        });

        let high_risk = level2
            .high_risk
            .iter()
            .chain(level1.high_risk.iter())
            .cloned()
            .collect();

        debug!(
            practices = practices.len(),
            domains = domains.len(),
            "Merged practice catalog"
        );

        Self {
            practices,
            domains,
            high_risk,
        }
    }

    pub fn get(&self, practice_id: &str) -> Option<&Practice> {
        self.practices.get(practice_id)
    }

    pub fn contains(&self, practice_id: &str) -> bool {
        self.practices.contains_key(practice_id)
    }

    /// Every practice regardless of level, keyed by identifier
    pub fn raw_practices(&self) -> &BTreeMap<String, Practice> {
        &self.practices
    }

    /// Every domain regardless of level, in display order
    pub fn raw_domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn high_risk(&self) -> &BTreeSet<String> {
        &self.high_risk
    }

    pub fn is_high_risk(&self, practice_id: &str) -> bool {
        self.high_risk.contains(practice_id)
    }

    pub fn len(&self) -> usize {
        self.practices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.practices.is_empty()
    }

    /// Level-filtered domains and practices.
    ///
    /// In the L1 view only practices passing [`crate::is_level_one`] remain,
    /// and domains left with no practices are dropped.
    pub fn view(&self, level: SubscriptionLevel) -> CatalogView {
        let domains: Vec<Domain> = self
            .domains
            .iter()
            .filter_map(|domain| {
                let practices: Vec<Practice> = domain
                    .practices
                    .iter()
                    .filter(|p| level.includes(p))
                    .cloned()
                    .collect();
                if practices.is_empty() {
                    None
                } else {
                    Some(Domain {
                        name: domain.name.clone(),
                        code: domain.code.clone(),
                        practices,
                    })
                }
            })
            .collect();

        let all_practices = domains
            .iter()
            .flat_map(|d| d.practices.iter().cloned())
            .collect();

        CatalogView {
            level,
            domains,
            all_practices,
        }
    }
}

fn domain_code(name: &str) -> Option<String> {
    DOMAINS
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn practice(id: &str, domain: &str, title: &str) -> Practice {
        Practice {
            id: id.to_string(),
            domain: domain.to_string(),
            title: title.to_string(),
            description: String::new(),
            objectives: vec![],
            references: vec![],
            further_discussion: vec![],
            examples: vec![],
            key_references: vec![],
            sprs_points: None,
        }
    }

    fn catalog(practices: Vec<Practice>) -> Catalog {
        Catalog {
            practices,
            high_risk: BTreeSet::new(),
        }
    }

    #[test]
    fn test_mined_beats_l1_beats_l2() {
        let l2 = catalog(vec![practice("AC.L1-3.1.1", "Access Control", "from L2")]);
        let l1 = catalog(vec![practice("AC.L1-3.1.1", "Access Control", "from L1")]);
        let mined = vec![practice("AC.L1-3.1.1", "Access Control", "mined")];

        let merged = MergedCatalog::build(&l2, &l1, &mined);
        assert_eq!(merged.get("AC.L1-3.1.1").unwrap().title, "mined");

        let merged = MergedCatalog::build(&l2, &l1, &[]);
        assert_eq!(merged.get("AC.L1-3.1.1").unwrap().title, "from L1");

        let merged = MergedCatalog::build(&l2, &Catalog::default(), &[]);
        assert_eq!(merged.get("AC.L1-3.1.1").unwrap().title, "from L2");
    }

    #[test]
    fn test_domain_order_follows_priority_list() {
        let l2 = catalog(vec![
            practice("SI.L2-3.14.3", "System and Information Integrity", ""),
            practice("AU.L2-3.3.1", "Audit and Accountability", ""),
            practice("AC.L2-3.1.3", "Access Control", ""),
            practice("CA.L2-3.12.1", "Security Assessment", ""),
        ]);

        let merged = MergedCatalog::build(&l2, &Catalog::default(), &[]);
        let names: Vec<&str> = merged.raw_domains().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Access Control",
                "Audit and Accountability",
                "Security Assessment",
                "System and Information Integrity"
            ]
        );
        assert_eq!(merged.raw_domains()[0].code.as_deref(), Some("AC"));
    }

    #[test]
    fn test_unknown_domains_sort_last_in_first_seen_order() {
        let l2 = catalog(vec![
            practice("ZZ.L2-1", "Zeta Custom", ""),
            practice("SI.L2-3.14.1", "System and Information Integrity", ""),
            practice("YY.L2-1", "Alpha Custom", ""),
            practice("AC.L2-3.1.1", "Access Control", ""),
        ]);

        let merged = MergedCatalog::build(&l2, &Catalog::default(), &[]);
        let names: Vec<&str> = merged.raw_domains().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Access Control",
                "System and Information Integrity",
                "Zeta Custom",
                "Alpha Custom"
            ]
        );
        assert_eq!(merged.raw_domains()[2].code, None);
    }

    #[test]
    fn test_practices_sorted_lexicographically_within_domain() {
        let l2 = catalog(vec![
            practice("AC.L2-3.1.3", "Access Control", ""),
            practice("AC.L1-3.1.2", "Access Control", ""),
            practice("AC.L1-3.1.1", "Access Control", ""),
            practice("AC.L2-3.1.10", "Access Control", ""),
        ]);

        let merged = MergedCatalog::build(&l2, &Catalog::default(), &[]);
        let ids: Vec<&str> = merged.raw_domains()[0]
            .practices
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["AC.L1-3.1.1", "AC.L1-3.1.2", "AC.L2-3.1.10", "AC.L2-3.1.3"]);
    }

    #[test]
    fn test_l1_view_is_exactly_level_one_subset() {
        let l2 = catalog(vec![
            practice("AC.L1-3.1.1", "Access Control", ""),
            practice("AC.L2-3.1.3", "Access Control", ""),
            practice("AU.L2-3.3.1", "Audit and Accountability", ""),
            practice("PE.L1-3.10.1", "Physical Protection", ""),
        ]);
        let merged = MergedCatalog::build(&l2, &Catalog::default(), &[]);

        let view = merged.view(SubscriptionLevel::L1);
        let ids: Vec<&str> = view.all_practices.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["AC.L1-3.1.1", "PE.L1-3.10.1"]);

        // Audit and Accountability has no L1 practices left
        let names: Vec<&str> = view.domains.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Access Control", "Physical Protection"]);

        // Raw sets stay complete
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.raw_domains().len(), 3);

        let view = merged.view(SubscriptionLevel::L2);
        assert_eq!(view.all_practices.len(), 4);
    }

    #[test]
    fn test_domain_change_on_override_leaves_no_empty_group() {
        let l2 = catalog(vec![practice("XX.L2-1", "Legacy Name", "")]);
        let mined = vec![practice("XX.L2-1", "Access Control", "")];

        let merged = MergedCatalog::build(&l2, &Catalog::default(), &mined);
        assert_eq!(merged.raw_domains().len(), 1);
        assert_eq!(merged.raw_domains()[0].name, "Access Control");
    }

    #[test]
    fn test_high_risk_union() {
        let mut l2 = catalog(vec![]);
        l2.high_risk.insert("AC.L2-3.1.1".to_string());
        let mut l1 = catalog(vec![]);
        l1.high_risk.insert("IA.L1-3.5.2".to_string());

        let merged = MergedCatalog::build(&l2, &l1, &[]);
        assert!(merged.is_high_risk("AC.L2-3.1.1"));
        assert!(merged.is_high_risk("IA.L1-3.5.2"));
        assert!(!merged.is_high_risk("AU.L2-3.3.1"));
    }
}
