//! Canonical types produced by the primary catalog client.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Kind of title. Source-specific spellings ("tv", "series") are mapped here
/// at ingestion and never compared downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Series,
}

impl ContentKind {
    /// Parse any spelling used by the upstream sources or by callers.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Some(Self::Movie),
            "tv" | "series" | "show" => Some(Self::Series),
            _ => None,
        }
    }

    /// Path segment used by the primary source ("movie" / "tv").
    pub fn catalog_segment(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "tv",
        }
    }

    /// Type parameter used by the enrichment source ("movie" / "series").
    pub fn enrichment_type(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Series => write!(f, "series"),
        }
    }
}

/// One title from the primary catalog, normalized across movies and series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRecord {
    /// Primary source ID.
    pub id: u64,
    pub title: String,
    pub kind: ContentKind,
    /// Release year (first air year for series).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Overview text, empty when the source has none.
    #[serde(default)]
    pub plot: String,
    /// Average vote (0-10).
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_count: u32,
    /// Poster path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Backdrop path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Top-billed cast names. Only filled by detail lookups.
    #[serde(default)]
    pub cast: Vec<String>,
    /// Only filled by detail lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    /// Only filled by detail lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    /// IMDb ID, when the source reports one (detail lookups).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// A page of listing results plus the source's pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
}

impl<T> Page<T> {
    /// An empty first page.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            page: 1,
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// A cast credit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
}

/// A crew credit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
}

/// Full detail lookup for one title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleDetails {
    /// The title itself, with cast/director/runtime filled in.
    pub record: CanonicalRecord,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    /// Directors, writers and producers.
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub similar: Vec<CanonicalRecord>,
}

/// A genre from one of the two taxonomies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Filters for the discover listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverFilters {
    pub kind: ContentKind,
    /// Titles must carry all of these genres.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Sort order, e.g. "popularity.desc" (the default) or "vote_average.desc".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f32>,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

impl DiscoverFilters {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            genre_ids: Vec::new(),
            year: None,
            sort_by: None,
            min_rating: None,
            page: 1,
        }
    }

    pub fn sort_by_or_default(&self) -> &str {
        self.sort_by.as_deref().unwrap_or("popularity.desc")
    }

    /// Cache key covering every filter.
    pub fn cache_key(&self) -> String {
        let genres: Vec<String> = self.genre_ids.iter().map(|g| g.to_string()).collect();
        format!(
            "discover:{}:genres={}:year={}:sort={}:min_rating={}:page={}",
            self.kind.catalog_segment(),
            genres.join(","),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            self.sort_by_or_default(),
            self.min_rating.map(|r| r.to_string()).unwrap_or_default(),
            self.page.max(1),
        )
    }
}

/// Extract the year from a "YYYY-MM-DD" date, tolerating partial dates.
pub fn year_from_date(date: &str) -> Option<i32> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.year())
        .ok()
        .or_else(|| date.get(..4).and_then(|y| y.parse().ok()))
}
