//! Field-level combination of a primary record with optional enrichment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{CanonicalRecord, ContentKind};
use crate::enrichment::{EnrichmentRecord, RatingValue};

/// The final entity handed to callers.
///
/// Always fully populated: without enrichment every shared field carries the
/// primary value and enrichment-only fields are empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedRecord {
    pub id: u64,
    pub title: String,
    pub kind: ContentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub genre_ids: Vec<u32>,
    pub plot: String,
    pub rating: f32,
    pub popularity: f64,
    pub vote_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_office: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default)]
    pub ratings_by_source: BTreeMap<String, RatingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_seasons: Option<u32>,
    /// Whether an enrichment record took part in the merge.
    pub enriched: bool,
}

/// Merge one primary record with zero or one enrichment record.
///
/// Each field is decided independently:
/// - rating: enrichment's numeric rating, else primary's
/// - plot: the strictly longer text, ties keep primary's
/// - cast: primary's when non-empty, else enrichment's actors
/// - director, runtime: enrichment's when present, else primary's
/// - writer, box office, awards, rated, language, country, per-source
///   ratings, season count: enrichment only
pub fn merge(primary: &CanonicalRecord, enrichment: Option<&EnrichmentRecord>) -> MergedRecord {
    let mut merged = MergedRecord {
        id: primary.id,
        title: primary.title.clone(),
        kind: primary.kind,
        year: primary.year,
        genre_ids: primary.genre_ids.clone(),
        plot: primary.plot.clone(),
        rating: primary.rating,
        popularity: primary.popularity,
        vote_count: primary.vote_count,
        poster_path: primary.poster_path.clone(),
        backdrop_path: primary.backdrop_path.clone(),
        cast: primary.cast.clone(),
        director: primary.director.clone(),
        writer: None,
        runtime_minutes: primary.runtime_minutes,
        external_id: primary.external_id.clone(),
        box_office: None,
        awards: None,
        rated: None,
        language: None,
        country: None,
        ratings_by_source: BTreeMap::new(),
        total_seasons: None,
        enriched: false,
    };

    let Some(extra) = enrichment else {
        return merged;
    };

    merged.enriched = true;

    if let Some(rating) = extra.rating {
        merged.rating = rating;
    }
    if let Some(plot) = &extra.plot {
        if plot.chars().count() > merged.plot.chars().count() {
            merged.plot = plot.clone();
        }
    }
    if merged.cast.is_empty() {
        merged.cast = extra.cast_names.clone();
    }
    if extra.director.is_some() {
        merged.director = extra.director.clone();
    }
    if extra.runtime_minutes.is_some() {
        merged.runtime_minutes = extra.runtime_minutes;
    }
    if merged.external_id.is_none() {
        merged.external_id = Some(extra.external_id.clone());
    }

    merged.writer = extra.writer.clone();
    merged.box_office = extra.box_office.clone();
    merged.awards = extra.awards.clone();
    merged.rated = extra.rated.clone();
    merged.language = extra.language.clone();
    merged.country = extra.country.clone();
    merged.ratings_by_source = extra.ratings_by_source.clone();
    merged.total_seasons = extra.total_seasons;

    merged
}
