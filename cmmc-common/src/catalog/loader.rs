//! Catalog loader
//!
//! Fetches the Level 1 and Level 2 catalog documents at startup. Both
//! fetches are issued concurrently and awaited together; if either fails
//! (transport error, non-2xx status, unparseable body) initialization fails
//! with a single [`Error::CatalogLoad`]. There is no retry.
//!
//! Sources that are not `http://` or `https://` URLs are read from the local
//! filesystem, which is how offline installs ship their catalogs.

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::Catalog;
use crate::{Error, Result};

/// Default timeout for catalog requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("cmmc-common/", env!("CARGO_PKG_VERSION"));

/// Where the two catalog documents live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSources {
    pub level1_url: String,
    pub level2_url: String,
}

/// Both catalogs, as loaded
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalogs {
    pub level1: Catalog,
    pub level2: Catalog,
}

/// HTTP/file catalog loader
pub struct CatalogLoader {
    http_client: Client,
}

impl CatalogLoader {
    /// Create a loader with the default request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http_client })
    }

    /// Load both catalogs concurrently
    pub async fn load(&self, sources: &CatalogSources) -> Result<LoadedCatalogs> {
        info!(
            level1 = %sources.level1_url,
            level2 = %sources.level2_url,
            "Loading practice catalogs"
        );

        let (level1, level2) = tokio::try_join!(
            self.load_one("L1", &sources.level1_url),
            self.load_one("L2", &sources.level2_url),
        )?;

        info!(
            level1_practices = level1.len(),
            level2_practices = level2.len(),
            "Practice catalogs loaded"
        );

        Ok(LoadedCatalogs { level1, level2 })
    }

    async fn load_one(&self, label: &str, source: &str) -> Result<Catalog> {
        let bytes = if is_remote(source) {
            self.fetch(label, source).await?
        } else {
            debug!(catalog = label, path = %source, "Reading catalog from file");
            tokio::fs::read(source).await.map_err(|e| {
                Error::CatalogLoad(format!("{} catalog could not be read from {}: {}", label, source, e))
            })?
        };

        Catalog::from_slice(label, &bytes)
    }

    async fn fetch(&self, label: &str, url: &str) -> Result<Vec<u8>> {
        debug!(catalog = label, url = %url, "Fetching catalog");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            Error::CatalogLoad(format!("{} catalog request to {} failed: {}", label, url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CatalogLoad(format!(
                "{} catalog request to {} returned {}",
                label, url, status
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            Error::CatalogLoad(format!("{} catalog body from {} could not be read: {}", label, url, e))
        })?;

        Ok(body.to_vec())
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
