//! Practice catalogs
//!
//! A [`Catalog`] is one parsed catalog document: its practices in canonical
//! form plus the identifiers listed as high risk. Malformed practice entries
//! are skipped with a warning; a document that is not a catalog at all is an
//! error.

pub mod loader;
pub mod raw;

pub use loader::{CatalogLoader, CatalogSources};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::practice::Practice;
use crate::{Error, Result};
use raw::{RawCatalogDocument, RawHighRisk, RawPractice};

/// One parsed catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub practices: Vec<Practice>,
    pub high_risk: BTreeSet<String>,
}

impl Catalog {
    /// Parse a catalog document from raw bytes
    pub fn from_slice(label: &str, bytes: &[u8]) -> Result<Self> {
        let doc: RawCatalogDocument = serde_json::from_slice(bytes)
            .map_err(|e| Error::CatalogLoad(format!("{} catalog is not valid: {}", label, e)))?;
        Ok(Self::from_document(label, doc))
    }

    /// Parse a catalog document from an already decoded JSON value
    pub fn from_value(label: &str, value: serde_json::Value) -> Result<Self> {
        let doc: RawCatalogDocument = serde_json::from_value(value)
            .map_err(|e| Error::CatalogLoad(format!("{} catalog is not valid: {}", label, e)))?;
        Ok(Self::from_document(label, doc))
    }

    fn from_document(label: &str, doc: RawCatalogDocument) -> Self {
        let mut practices = Vec::new();
        let mut skipped = 0usize;

        for domain in doc.domains {
            let enclosing = domain.canonical_name();
            for entry in domain.practices {
                match serde_json::from_value::<RawPractice>(entry) {
                    Ok(raw) => {
                        let practice = raw.into_practice(enclosing.as_deref());
                        if practice.id.trim().is_empty() {
                            skipped += 1;
                            continue;
                        }
                        debug!(catalog = label, practice = %practice.id, "Parsed practice");
                        practices.push(practice);
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!(catalog = label, error = %e, "Skipping unrecognized practice entry");
                    }
                }
            }
        }

        if skipped > 0 {
            warn!(catalog = label, skipped, "Some catalog entries were skipped");
        }

        let high_risk = doc
            .high_risk_practices
            .into_iter()
            .map(RawHighRisk::into_id)
            .collect();

        Self { practices, high_risk }
    }

    pub fn len(&self) -> usize {
        self.practices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.practices.is_empty()
    }
}
