use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} does not exist")]
    NotFound(i64),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("duplicate entry: {0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("catalog responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid catalog base url: {0}")]
    BaseUrl(#[from] url::ParseError),
}
