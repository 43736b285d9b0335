//! Catalog provider trait and the static YAML-backed implementation

use crate::error::{Error, Result};
use crate::models::CatalogEntry;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde_json::Value;
use tracing::debug;

/// A source of category-tagged audio catalog entries
///
/// Empty results are a normal case, not an error; `entries` only fails when
/// the backend itself does.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch entries, optionally filtered to one category
    async fn entries(&self, category: Option<&str>) -> Result<Vec<CatalogEntry>>;
}

/// Pick one audio URL at random for the given category
///
/// A random entry is drawn from the matching records, then a random URL
/// from that entry's pool. The entry is committed to before its pool is
/// inspected, so a draw can fail with [`Error::NoAudioUrl`] even when
/// another entry holds audio. Zero matching records and an entry with an
/// empty pool are distinct failures, both carrying the category label (or
/// "any" when no filter was given) for display.
pub async fn pick_audio_url(
    provider: &dyn CatalogProvider,
    category: Option<&str>,
) -> Result<String> {
    let label = category.unwrap_or("any").to_string();
    let entries = provider.entries(category).await?;

    let mut rng = thread_rng();
    let Some(entry) = entries.choose(&mut rng) else {
        return Err(Error::NoTracks(label));
    };
    let url = entry
        .urls
        .choose(&mut rng)
        .cloned()
        .ok_or(Error::NoAudioUrl(label))?;

    debug!(url = %url, category = ?category, "Picked catalog audio URL");
    Ok(url)
}

/// In-memory catalog loaded from a YAML document
///
/// The document is a sequence of records in the backend's raw shape; alias
/// resolution happens at load time.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    /// Build a catalog from raw backend records
    pub fn from_records(records: &[Value]) -> Self {
        let entries = records.iter().map(CatalogEntry::from_record).collect();
        StaticCatalog { entries }
    }

    /// Parse a YAML sequence of records
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let records: Vec<Value> = serde_yaml::from_str(yaml)
            .map_err(|err| Error::InvalidDocument(err.to_string()))?;
        Ok(Self::from_records(&records))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn entries(&self, category: Option<&str>) -> Result<Vec<CatalogEntry>> {
        let matching = self
            .entries
            .iter()
            .filter(|entry| match category {
                Some(wanted) => entry.category.as_deref() == Some(wanted),
                None => true,
            })
            .cloned()
            .collect();
        Ok(matching)
    }
}
