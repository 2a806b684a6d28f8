// src/catalog/sources/google_books.rs
use async_trait::async_trait;

use super::CatalogSource;
use crate::catalog::{
    ApiKey, CatalogClient, CatalogQuery, EndpointTemplate, FetchError, ProviderKind,
    RawCatalogItem,
};
use crate::config::CatalogSettings;

pub const MAX_RESULTS: &str = "20";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
}

/// Google Books volume search, either free text or restricted to authors.
/// Volumes already carry everything the normalizer needs, so no enrichment.
pub struct GoogleBooksSource {
    field: BookField,
    volumes: EndpointTemplate,
}

impl GoogleBooksSource {
    pub fn new(settings: &CatalogSettings, field: BookField) -> Self {
        let (label, prefix) = match field {
            BookField::Title => ("books.search.title", ""),
            BookField::Author => ("books.search.author", "inauthor:"),
        };
        Self {
            field,
            volumes: EndpointTemplate::new(label, &settings.google_books_base_url, "/volumes", "key")
                .with_query_param("q")
                .with_query_prefix(prefix)
                .with_param("maxResults", MAX_RESULTS),
        }
    }
}

#[async_trait]
impl CatalogSource for GoogleBooksSource {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GoogleBooks
    }

    fn name(&self) -> &'static str {
        match self.field {
            BookField::Title => "google-books-title",
            BookField::Author => "google-books-author",
        }
    }

    async fn search(
        &self,
        client: &CatalogClient,
        query: &CatalogQuery,
    ) -> Result<Vec<RawCatalogItem>, FetchError> {
        client.fetch_by_query(query, &self.volumes, "/items").await
    }
}

/// `volumes?q=isbn:<isbn>`: first matching volume, if any.
pub struct IsbnLookup {
    volumes: EndpointTemplate,
}

impl IsbnLookup {
    pub fn new(settings: &CatalogSettings) -> Self {
        Self {
            volumes: EndpointTemplate::new("books.isbn", &settings.google_books_base_url, "/volumes", "key")
                .with_query_param("q")
                .with_query_prefix("isbn:"),
        }
    }

    pub async fn lookup(
        &self,
        client: &CatalogClient,
        isbn: &str,
        key: &ApiKey,
    ) -> Result<Option<RawCatalogItem>, FetchError> {
        let query = CatalogQuery::new(isbn, key.clone());
        let mut items = client.fetch_by_query(&query, &self.volumes, "/items").await?;
        Ok(if items.is_empty() {
            None
        } else {
            Some(items.swap_remove(0))
        })
    }
}
