//! Input-shape adapters
//!
//! One serde type per historical catalog shape. Each converts into the
//! canonical [`Practice`]; nothing outside this file knows the raw field
//! names.

use serde::Deserialize;

use crate::normalize::{canonicalize_domain, code_from_practice_id, domain_name_for_code, text_block, text_list, TextField};
use crate::practice::{AssessmentObjective, Practice};

/// Top-level catalog document (both L1 and L2 prepop files)
#[derive(Debug, Deserialize)]
pub struct RawCatalogDocument {
    #[serde(default)]
    pub domains: Vec<RawDomain>,
    #[serde(default, alias = "highRiskPractices")]
    pub high_risk_practices: Vec<RawHighRisk>,
}

#[derive(Debug, Deserialize)]
pub struct RawDomain {
    #[serde(default, alias = "domainId")]
    pub domain_id: Option<String>,
    #[serde(default, alias = "domainName")]
    pub domain_name: Option<String>,
    /// Kept as untyped values so one malformed entry does not sink the document
    #[serde(default)]
    pub practices: Vec<serde_json::Value>,
}

impl RawDomain {
    /// Canonical domain name for practices listed under this entry
    ///
    /// The name wins when it canonicalizes, then the id. When neither is
    /// recognized the name passes through unchanged.
    pub fn canonical_name(&self) -> Option<String> {
        if let Some(name) = &self.domain_name {
            let canonical = canonicalize_domain(name);
            if &canonical != name {
                return Some(canonical);
            }
        }

        if let Some(id) = &self.domain_id {
            let canonical = canonicalize_domain(id);
            if &canonical != id {
                return Some(canonical);
            }
        }

        self.domain_name.clone().or_else(|| self.domain_id.clone())
    }
}

/// Entry of `high_risk_practices`: a bare identifier or an object carrying one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawHighRisk {
    Id(String),
    Entry {
        #[serde(alias = "requirementId", alias = "practice_id", alias = "practiceId")]
        id: String,
    },
}

impl RawHighRisk {
    pub fn into_id(self) -> String {
        match self {
            RawHighRisk::Id(id) | RawHighRisk::Entry { id } => id,
        }
    }
}

/// Assessment objective as object or bare text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawObjective {
    Entry {
        #[serde(default, alias = "objectiveId", alias = "objective_id")]
        id: Option<String>,
        #[serde(default, alias = "description", alias = "objective")]
        text: Option<String>,
    },
    Text(String),
}

fn convert_objectives(practice_id: &str, raw: Vec<RawObjective>) -> Vec<AssessmentObjective> {
    raw.into_iter()
        .enumerate()
        .map(|(i, objective)| {
            let (id, text) = match objective {
                RawObjective::Entry { id, text } => (id, text.unwrap_or_default()),
                RawObjective::Text(text) => (None, text),
            };
            AssessmentObjective {
                id: id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| objective_id(practice_id, i)),
                text,
            }
        })
        .collect()
}

/// `AC.L1-3.1.1` + 0 → `AC.L1-3.1.1[a]`
fn objective_id(practice_id: &str, index: usize) -> String {
    let letter = (b'a' + (index % 26) as u8) as char;
    if index < 26 {
        format!("{}[{}]", practice_id, letter)
    } else {
        format!("{}[{}{}]", practice_id, letter, index / 26)
    }
}

/// Domain for a practice: explicit value, then the enclosing domain entry,
/// then the identifier prefix
fn resolve_domain(explicit: Option<&str>, enclosing: Option<&str>, practice_id: &str) -> String {
    if let Some(domain) = explicit.filter(|d| !d.trim().is_empty()) {
        return canonicalize_domain(domain);
    }
    if let Some(domain) = enclosing {
        return domain.to_string();
    }
    code_from_practice_id(practice_id)
        .and_then(domain_name_for_code)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Level 1 prepop entry (snake_case)
#[derive(Debug, Deserialize)]
pub struct L1PrepopPractice {
    pub id: String,
    #[serde(default, alias = "requirementName")]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub description: Option<TextField>,
    #[serde(default, alias = "assessmentObjectives")]
    pub assessment_objectives: Vec<RawObjective>,
    #[serde(default, alias = "discussion", alias = "furtherDiscussion")]
    pub further_discussion: Option<TextField>,
    #[serde(default)]
    pub examples: Option<TextField>,
    #[serde(default, alias = "keyReferences")]
    pub key_references: Option<TextField>,
    #[serde(default)]
    pub references: Option<TextField>,
    #[serde(default, alias = "points", alias = "sprsPoints")]
    pub sprs_points: Option<u32>,
}

impl L1PrepopPractice {
    pub fn into_practice(self, enclosing_domain: Option<&str>) -> Practice {
        let domain = resolve_domain(self.domain.as_deref(), enclosing_domain, &self.id);
        let objectives = convert_objectives(&self.id, self.assessment_objectives);
        Practice {
            domain,
            title: self.name.unwrap_or_default(),
            description: text_block(self.description),
            objectives,
            references: text_list(self.references),
            further_discussion: text_list(self.further_discussion),
            examples: text_list(self.examples),
            key_references: text_list(self.key_references),
            sprs_points: self.sprs_points,
            id: self.id,
        }
    }
}

/// Level 2 prepop entry (camelCase)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2PrepopPractice {
    pub requirement_id: String,
    #[serde(default, alias = "name")]
    pub requirement_name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, alias = "description", alias = "requirement_text")]
    pub requirement_text: Option<TextField>,
    #[serde(default, alias = "assessment_objectives")]
    pub assessment_objectives: Vec<RawObjective>,
    #[serde(default, alias = "discussion", alias = "further_discussion")]
    pub further_discussion: Option<TextField>,
    #[serde(default)]
    pub examples: Option<TextField>,
    #[serde(default, alias = "key_references")]
    pub key_references: Option<TextField>,
    #[serde(default)]
    pub references: Option<TextField>,
    #[serde(default, alias = "points", alias = "sprs_points")]
    pub sprs_points: Option<u32>,
}

impl L2PrepopPractice {
    pub fn into_practice(self, enclosing_domain: Option<&str>) -> Practice {
        let domain = resolve_domain(self.domain.as_deref(), enclosing_domain, &self.requirement_id);
        let objectives = convert_objectives(&self.requirement_id, self.assessment_objectives);
        Practice {
            domain,
            title: self.requirement_name.unwrap_or_default(),
            description: text_block(self.requirement_text),
            objectives,
            references: text_list(self.references),
            further_discussion: text_list(self.further_discussion),
            examples: text_list(self.examples),
            key_references: text_list(self.key_references),
            sprs_points: self.sprs_points,
            id: self.requirement_id,
        }
    }
}

/// Practice object produced by the document miner
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinedPractice {
    pub id: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<TextField>,
    #[serde(default, alias = "assessmentObjectives", alias = "assessment_objectives")]
    pub objectives: Vec<RawObjective>,
    #[serde(default)]
    pub references: Option<TextField>,
    #[serde(default, alias = "further_discussion")]
    pub further_discussion: Option<TextField>,
    #[serde(default)]
    pub examples: Option<TextField>,
    #[serde(default, alias = "key_references")]
    pub key_references: Option<TextField>,
    #[serde(default, alias = "points", alias = "sprs_points")]
    pub sprs_points: Option<u32>,
}

impl MinedPractice {
    pub fn into_practice(self) -> Practice {
        let domain = resolve_domain(self.domain.as_deref(), None, &self.id);
        let objectives = convert_objectives(&self.id, self.objectives);
        Practice {
            domain,
            title: self.title.unwrap_or_default(),
            description: text_block(self.description),
            objectives,
            references: text_list(self.references),
            further_discussion: text_list(self.further_discussion),
            examples: text_list(self.examples),
            key_references: text_list(self.key_references),
            sprs_points: self.sprs_points,
            id: self.id,
        }
    }
}

/// Either prepop shape. The L2 shape is tried first because it requires
/// `requirementId`, which L1 entries never carry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawPractice {
    L2(L2PrepopPractice),
    L1(L1PrepopPractice),
}

impl RawPractice {
    pub fn into_practice(self, enclosing_domain: Option<&str>) -> Practice {
        match self {
            RawPractice::L2(p) => p.into_practice(enclosing_domain),
            RawPractice::L1(p) => p.into_practice(enclosing_domain),
        }
    }
}
