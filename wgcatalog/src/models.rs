//! Catalog entry model and legacy field-alias resolution
//!
//! Backend records have accumulated several field names for the same thing
//! over time. The aliases are resolved here, at the data-access boundary,
//! into one canonical [`CatalogEntry`] shape so playback code never sees
//! them.

use serde_json::Value;

/// Field names that may hold a pool of candidate audio URLs, in the order
/// they are consulted
pub const POOL_ALIASES: &[&str] = &["song_urls", "audio_urls", "urls", "songs"];

/// Field names that may hold a single audio URL, consulted when no pool
/// alias matched
pub const SINGLE_ALIASES: &[&str] = &["song_url", "audio_url", "url"];

/// A category-tagged record holding one or more candidate audio URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: Option<String>,
    pub urls: Vec<String>,
}

impl CatalogEntry {
    /// Resolve a raw backend record into a canonical entry
    ///
    /// Pool aliases win over single-URL aliases; the first matching alias is
    /// used and the rest are ignored. Non-string pool elements and empty
    /// strings are dropped. A record resolving to zero URLs still yields an
    /// entry (the caller decides whether that is an error).
    pub fn from_record(record: &Value) -> Self {
        let category = record
            .get("category")
            .and_then(Value::as_str)
            .map(str::to_string);

        for alias in POOL_ALIASES {
            if let Some(pool) = record.get(*alias).and_then(Value::as_array) {
                let urls = pool
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect();
                return CatalogEntry { category, urls };
            }
        }

        for alias in SINGLE_ALIASES {
            if let Some(url) = record.get(*alias).and_then(Value::as_str) {
                if !url.is_empty() {
                    return CatalogEntry {
                        category,
                        urls: vec![url.to_string()],
                    };
                }
            }
        }

        CatalogEntry {
            category,
            urls: Vec::new(),
        }
    }

    /// Whether the entry carries at least one candidate URL
    pub fn has_audio(&self) -> bool {
        !self.urls.is_empty()
    }
}
