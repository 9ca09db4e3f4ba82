//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of both source traits plus a
//! tiny canned-response HTTP server, so the whole pipeline can be exercised
//! without network access or API keys.
//!
//! # Example
//!
//! ```rust,ignore
//! use marquee_core::testing::{fixtures, MockEnrichmentSource, MockPrimaryCatalog};
//!
//! let catalog = MockPrimaryCatalog::new();
//! let enrichment = MockEnrichmentSource::new();
//!
//! catalog.set_titles(vec![fixtures::movie(603, "The Matrix", 1999)]).await;
//! enrichment
//!     .add_by_title("The Matrix", fixtures::enrichment_record("tt0133093"))
//!     .await;
//!
//! // Hand both to a CatalogService...
//! ```

mod mock_enrichment_source;
mod mock_primary_catalog;
#[cfg(any(test, feature = "testing"))]
mod stub_server;

pub use mock_enrichment_source::{MockEnrichmentSource, RecordedLookup};
pub use mock_primary_catalog::{MockPrimaryCatalog, RecordedCatalogQuery};
#[cfg(any(test, feature = "testing"))]
pub use stub_server::StubServer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{CanonicalRecord, ContentKind, Genre, TitleDetails};
    use crate::enrichment::{EnrichmentRecord, RatingValue};

    /// Create a canonical record with reasonable defaults.
    pub fn canonical_record(id: u64, title: &str, kind: ContentKind) -> CanonicalRecord {
        CanonicalRecord {
            id,
            title: title.to_string(),
            kind,
            year: None,
            genre_ids: vec![18],
            plot: format!("A story about {}.", title.to_lowercase()),
            rating: 7.0,
            popularity: 50.0,
            vote_count: 1000,
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: Some("/backdrop.jpg".to_string()),
            cast: Vec::new(),
            director: None,
            runtime_minutes: None,
            external_id: None,
        }
    }

    /// Create a test movie.
    pub fn movie(id: u64, title: &str, year: i32) -> CanonicalRecord {
        let mut record = canonical_record(id, title, ContentKind::Movie);
        record.year = Some(year);
        record
    }

    /// Create a test series.
    pub fn series(id: u64, title: &str, year: i32) -> CanonicalRecord {
        let mut record = canonical_record(id, title, ContentKind::Series);
        record.year = Some(year);
        record
    }

    /// Create an enrichment record with a rating, plot and credits.
    pub fn enrichment_record(external_id: &str) -> EnrichmentRecord {
        let mut record = EnrichmentRecord::new(external_id);
        record.rating = Some(8.5);
        record.plot = Some("An enriched plot that is noticeably longer than the default one.".to_string());
        record.cast_names = vec!["Lead Actor".to_string(), "Supporting Actor".to_string()];
        record.director = Some("Some Director".to_string());
        record.writer = Some("Some Writer".to_string());
        record.runtime_minutes = Some(121);
        record.awards = Some("Won 1 Oscar".to_string());
        record.rated = Some("PG-13".to_string());
        record.ratings_by_source.insert(
            "Internet Movie Database".to_string(),
            RatingValue::Text("8.5/10".to_string()),
        );
        record
    }

    /// Details wrapping `record`, with no credits.
    pub fn title_details(record: CanonicalRecord) -> TitleDetails {
        TitleDetails {
            record,
            genres: Vec::new(),
            cast: Vec::new(),
            crew: Vec::new(),
            tagline: None,
            status: None,
            number_of_seasons: None,
            similar: Vec::new(),
        }
    }

    pub fn genre(id: u32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    /// The usual movie taxonomy subset used across tests.
    pub fn movie_genres() -> Vec<Genre> {
        vec![
            genre(28, "Action"),
            genre(18, "Drama"),
            genre(878, "Science Fiction"),
        ]
    }

    /// The usual series taxonomy subset. Drama (18) overlaps the movie list.
    pub fn series_genres() -> Vec<Genre> {
        vec![
            genre(18, "Drama (TV)"),
            genre(10759, "Action & Adventure"),
            genre(10765, "Sci-Fi & Fantasy"),
        ]
    }
}
