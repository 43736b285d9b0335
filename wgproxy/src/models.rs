//! Wire models for upstream track listings
//!
//! Discovery nodes answer trending/search/user-tracks requests with a
//! `{ "data": [track, ...] }` page. Only the fields the player needs are
//! modeled; everything else is ignored on deserialization. Tracks are
//! immutable once fetched; a new query supersedes the whole list.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Artwork resolution keys published by discovery nodes
pub const ARTWORK_SMALL: &str = "150x150";
pub const ARTWORK_MEDIUM: &str = "480x480";
pub const ARTWORK_LARGE: &str = "1000x1000";

/// Sparse map from resolution key (`"150x150"`, `"480x480"`, `"1000x1000"`)
/// to artwork URL; any subset may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artwork(pub BTreeMap<String, String>);

impl Artwork {
    /// URL for an exact resolution key
    pub fn url(&self, size: &str) -> Option<&str> {
        self.0.get(size).map(String::as_str)
    }

    /// Largest available artwork URL
    pub fn best(&self) -> Option<&str> {
        [ARTWORK_LARGE, ARTWORK_MEDIUM, ARTWORK_SMALL]
            .iter()
            .find_map(|size| self.url(size))
    }

    /// Smallest available artwork URL
    pub fn thumbnail(&self) -> Option<&str> {
        [ARTWORK_SMALL, ARTWORK_MEDIUM, ARTWORK_LARGE]
            .iter()
            .find_map(|size| self.url(size))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Owning artist of a track
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// Opaque artist identifier
    #[serde(default, deserialize_with = "opaque_id")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// A single track from a trending/search/user-tracks listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Opaque track identifier; empty when the upstream record had none
    #[serde(default, deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Owning artist
    #[serde(default)]
    pub user: Artist,
    /// Artwork map; `None` when the record carried no artwork at all
    #[serde(default)]
    pub artwork: Option<Artwork>,
    /// Content identifier for the preview clip, when present
    #[serde(default)]
    pub preview_cid: Option<String>,
    /// Content identifier for the full track, when present
    #[serde(default)]
    pub track_cid: Option<String>,
}

impl Track {
    /// Whether this track can be streamed: it needs an identifier and at
    /// least one content identifier (preview or full track).
    pub fn is_streamable(&self) -> bool {
        !self.id.is_empty() && (self.preview_cid.is_some() || self.track_cid.is_some())
    }
}

/// A page of tracks as returned by a discovery node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub data: Vec<Track>,
}

impl TrackPage {
    /// Parse a page from a raw JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Consume the page, keeping only streamable tracks
    pub fn streamable(self) -> Vec<Track> {
        self.data.into_iter().filter(Track::is_streamable).collect()
    }
}

/// Upstream ids are sometimes numbers, sometimes strings; normalize to a
/// string at the boundary so playback code sees one shape.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
        Null,
    }

    match Raw::deserialize(deserializer).map_err(de::Error::custom)? {
        Raw::Str(s) => Ok(s),
        Raw::Num(n) => Ok(n.to_string()),
        Raw::Null => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn artwork_prefers_larger_sizes() {
        let artwork: Artwork = serde_json::from_value(json!({
            "150x150": "https://img/s.jpg",
            "480x480": "https://img/m.jpg",
        }))
        .unwrap();

        assert_eq!(artwork.best(), Some("https://img/m.jpg"));
        assert_eq!(artwork.thumbnail(), Some("https://img/s.jpg"));
        assert_eq!(artwork.url(ARTWORK_LARGE), None);
    }

    #[test]
    fn numeric_ids_are_normalized() {
        let track: Track = serde_json::from_value(json!({
            "id": 4217,
            "title": "Blue in Green",
            "user": { "id": "abc", "name": "Miles" },
            "track_cid": "Qm123",
        }))
        .unwrap();

        assert_eq!(track.id, "4217");
        assert!(track.is_streamable());
    }

    #[test]
    fn track_without_cid_is_not_streamable() {
        let track: Track = serde_json::from_value(json!({
            "id": "x",
            "title": "No audio",
            "user": { "id": "a", "name": "Anon" },
        }))
        .unwrap();

        assert!(!track.is_streamable());
    }

    #[test]
    fn track_without_id_is_not_streamable() {
        let track: Track = serde_json::from_value(json!({
            "title": "Orphan",
            "track_cid": "Qm123",
        }))
        .unwrap();

        assert!(track.id.is_empty());
        assert!(!track.is_streamable());
    }

    #[test]
    fn page_filters_to_streamable() {
        let page = TrackPage::from_value(json!({
            "data": [
                { "id": "a", "title": "one", "track_cid": "c1" },
                { "id": "b", "title": "two" },
                { "id": "c", "title": "three", "preview_cid": "c3" },
            ]
        }))
        .unwrap();

        let tracks = page.streamable();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "a");
        assert_eq!(tracks[1].id, "c");
    }
}
