//! Types for the secondary enrichment source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::ContentKind;

/// A rating as reported by one source: numeric when the source gives a bare
/// number, otherwise the source's own notation ("8.7/10", "94%").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RatingValue {
    Number(f64),
    Text(String),
}

/// Supplementary data for one title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentRecord {
    /// IMDb ID.
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContentKind>,
    /// Numeric IMDb rating (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    /// Ratings keyed by source name ("Internet Movie Database", "Metascore", ...).
    #[serde(default)]
    pub ratings_by_source: BTreeMap<String, RatingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    /// Actor names in billing order.
    #[serde(default)]
    pub cast_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_office: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    /// Series only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_seasons: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,
    /// Content rating ("PG-13", "TV-MA").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl EnrichmentRecord {
    /// A record carrying only an external ID.
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            title: None,
            year: None,
            kind: None,
            rating: None,
            ratings_by_source: BTreeMap::new(),
            plot: None,
            cast_names: Vec::new(),
            director: None,
            writer: None,
            box_office: None,
            runtime_minutes: None,
            total_seasons: None,
            awards: None,
            rated: None,
            language: None,
            country: None,
        }
    }
}
