use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::config::AppConfig;
use crate::error::CatalogError;
use crate::models::{News, NewsQuery};

const USER_AGENT: &str = "newsreader/0.1";

/// Client for a thenewsapi.com-style news provider. Provider failures are not
/// this crate's errors: every public call degrades to "no results" with a
/// logged warning.
#[derive(Clone, Debug)]
pub struct NewsCatalog {
    client: Client,
    base_url: Url,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    data: Vec<News>,
}

impl NewsCatalog {
    pub fn new(client: Client, base_url: Url, api_token: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            api_token: api_token.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&config.news_base_url)?;
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::new(client, base_url, config.news_api_token.clone()))
    }

    /// Top headlines. `search` on the query is ignored by this endpoint.
    pub async fn top(&self, query: &NewsQuery) -> Vec<News> {
        match self.listing("top", query).await {
            Ok(articles) => articles,
            Err(err) => {
                warn!(error = %err, "failed to fetch top headlines");
                Vec::new()
            }
        }
    }

    /// Full listing with free-text search.
    pub async fn all(&self, query: &NewsQuery) -> Vec<News> {
        match self.listing("all", query).await {
            Ok(articles) => articles,
            Err(err) => {
                warn!(error = %err, "failed to search news listing");
                Vec::new()
            }
        }
    }

    /// Article detail by uuid. Unknown ids and provider failures are `None`.
    pub async fn by_id(&self, uuid: &str) -> Option<News> {
        match self.detail(uuid).await {
            Ok(article) => article,
            Err(err) => {
                warn!(error = %err, uuid, "failed to fetch article detail");
                None
            }
        }
    }

    async fn listing(&self, endpoint: &str, query: &NewsQuery) -> Result<Vec<News>, CatalogError> {
        let url = self.base_url.join(endpoint)?;
        let response = self
            .client
            .get(url)
            .query(&self.params(query))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }
        let listing: Listing = response.json().await?;
        Ok(listing.data)
    }

    async fn detail(&self, uuid: &str) -> Result<Option<News>, CatalogError> {
        let url = self.base_url.join(&format!("uuid/{uuid}"))?;
        let response = self
            .client
            .get(url)
            .query(&[("api_token", self.api_token.as_str())])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }
        Ok(Some(response.json().await?))
    }

    fn params(&self, query: &NewsQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api_token", self.api_token.clone()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }
        if !query.categories.is_empty() {
            params.push(("categories", query.categories.join(",")));
        }
        if let Some(language) = &query.language {
            params.push(("language", language.clone()));
        }
        params
    }
}
