//! Artwork records served by the Art Institute of Chicago API

use serde::Deserialize;
use serde::Serialize;

use super::CollectionItem;

/// One artwork row.
///
/// Only `id` is guaranteed by the API; every display field may be `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    /// Stable artwork identifier.
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub place_of_origin: Option<String>,
    #[serde(default)]
    pub artist_display: Option<String>,
    #[serde(default)]
    pub inscriptions: Option<String>,
    #[serde(default)]
    pub date_start: Option<i64>,
    #[serde(default)]
    pub date_end: Option<i64>,
}

impl Artwork {
    /// Field list requested from the API, matching the struct.
    pub const FIELDS: &'static str =
        "id,title,place_of_origin,artist_display,inscriptions,date_start,date_end";

    /// Creates an artwork with only an id and a title.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            place_of_origin: None,
            artist_display: None,
            inscriptions: None,
            date_start: None,
            date_end: None,
        }
    }

    /// Returns the title, or an empty string when the API has none.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

impl CollectionItem for Artwork {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}
