//! Response cache for generative-assistant output
//!
//! Key → value, no TTL, lives as long as the process. Keys are SHA-256
//! content hashes so identical prompts map to the same entry. Callers get
//! the cache injected as `Arc<dyn ResponseCache>`.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: String);
    async fn len(&self) -> usize;
}

/// Cache key for a piece of content within a namespace (e.g. "explain")
pub fn content_key(namespace: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();

    let mut key = String::with_capacity(namespace.len() + 1 + digest.len() * 2);
    key.push_str(namespace);
    key.push(':');
    for byte in digest {
        key.push_str(&format!("{:02x}", byte));
    }
    key
}

#[derive(Default)]
pub struct MemoryResponseCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, value: String) {
        self.entries.write().await.insert(key.to_string(), value);
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
