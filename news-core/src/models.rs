use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A pointer into the news catalog: the article uuid plus the title cached at
/// save time. Full article detail is fetched separately by id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct ArticleRef {
    pub id: String,
    pub title: String,
}

impl ArticleRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub friends: Vec<i64>,
    #[serde(default)]
    pub favorites: Vec<ArticleRef>,
    #[serde(default)]
    pub read_later: Vec<ArticleRef>,
}

impl User {
    /// A shallow record: id and name only, collections left empty.
    pub fn shallow(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            friends: Vec::new(),
            favorites: Vec::new(),
            read_later: Vec::new(),
        }
    }
}

/// Full-replace payload for `UserStore::update_user`: the stored name and all
/// three collections are overwritten with exactly what is supplied here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: String,
    #[serde(default)]
    pub friends: Vec<i64>,
    #[serde(default)]
    pub favorites: Vec<ArticleRef>,
    #[serde(default)]
    pub read_later: Vec<ArticleRef>,
}

/// A full article record as returned by the news catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct News {
    pub uuid: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub language: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsQuery {
    pub limit: u32,
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub language: Option<String>,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            search: None,
            categories: Vec::new(),
            language: None,
        }
    }
}
