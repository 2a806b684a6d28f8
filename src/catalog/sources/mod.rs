// src/catalog/sources/mod.rs
//! Concrete catalogs. A source knows its endpoints and the shape of its
//! response; the orchestrator drives it through the `CatalogSource` phases.

pub mod google_books;
pub mod nyt;
pub mod omdb;
pub mod tmdb;

use async_trait::async_trait;

use crate::catalog::{CatalogClient, CatalogQuery, FetchError, ProviderKind, RawCatalogItem};

pub use google_books::{BookField, GoogleBooksSource};
pub use nyt::NytBestsellers;
pub use omdb::{ImdbRating, OmdbRatings};
pub use tmdb::TmdbSource;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Normalizer shape for items from this source.
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str;

    /// Primary search. One outbound request.
    async fn search(
        &self,
        client: &CatalogClient,
        query: &CatalogQuery,
    ) -> Result<Vec<RawCatalogItem>, FetchError>;

    /// Optional secondary round-trip per candidate. Failed items are dropped,
    /// never the batch. Default: candidates pass through untouched.
    async fn enrich(
        &self,
        _client: &CatalogClient,
        _query: &CatalogQuery,
        candidates: Vec<RawCatalogItem>,
    ) -> Vec<RawCatalogItem> {
        candidates
    }
}
