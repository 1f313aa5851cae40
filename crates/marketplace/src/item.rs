//! Catalog item records
//!
//! `RawItem` mirrors the subset of the item payload the monitor reads.
//! `Item` is the per-delivery domain view; it is built, displayed and dropped.

use serde::Deserialize;

/// Raw item record as returned by the catalog API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub photo: Option<RawPhoto>,
    /// Fallback update timestamp (unix seconds) when no photo is present
    #[serde(default)]
    pub updated_at_ts: Option<i64>,
    #[serde(default)]
    pub user: Option<RawUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPhoto {
    #[serde(default)]
    pub high_resolution: Option<RawResolution>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawResolution {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    /// Seller reputation in `0.0..=1.0`
    #[serde(default)]
    pub feedback_reputation: Option<f64>,
}

/// Single-item endpoint wraps the record in `{"item": ...}`
#[derive(Debug, Deserialize)]
pub(crate) struct ItemEnvelope {
    pub item: RawItem,
}

/// Newest-first listing returns `{"items": [...]}`
#[derive(Debug, Deserialize)]
pub(crate) struct CatalogPage {
    #[serde(default)]
    pub items: Vec<RawItem>,
}

/// Domain view over a raw item.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: u64,
    pub title: String,
    /// Unix seconds of the most recent update
    pub updated_at: i64,
    reputation: Option<f64>,
}

impl Item {
    /// Seller rating on a five-star scale; 0.0 when the seller has no feedback.
    pub fn numeric_stars(&self) -> f64 {
        self.reputation.map(|r| r * 5.0).unwrap_or(0.0)
    }
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        let photo_ts = raw
            .photo
            .and_then(|p| p.high_resolution)
            .map(|r| r.timestamp);
        Self {
            id: raw.id,
            title: raw.title,
            updated_at: photo_ts.or(raw.updated_at_ts).unwrap_or(0),
            reputation: raw.user.and_then(|u| u.feedback_reputation),
        }
    }
}
