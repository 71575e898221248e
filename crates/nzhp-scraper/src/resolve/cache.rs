use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use nzhp_core::SiteId;

/// Resolved property URLs keyed by site and address.
///
/// Each key is written at most once; the first URL stored wins. Addresses
/// are keyed case- and whitespace-insensitively.
#[derive(Debug, Default)]
pub struct UrlCache {
    entries: RwLock<HashMap<(SiteId, String), String>>,
}

fn cache_key(site: SiteId, address: &str) -> (SiteId, String) {
    let normalized = address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    (site, normalized)
}

impl UrlCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, site: SiteId, address: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&cache_key(site, address))
            .cloned()
    }

    /// Stores `url` unless the key already has one. Returns the URL now
    /// cached for the key.
    pub fn insert_if_absent(&self, site: SiteId, address: &str, url: &str) -> String {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(cache_key(site, address))
            .or_insert_with(|| url.to_string())
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
