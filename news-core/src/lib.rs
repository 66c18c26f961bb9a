pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod recommend;
pub mod storage;

pub use catalog::NewsCatalog;
pub use config::AppConfig;
pub use error::{CatalogError, StoreError};
pub use models::{ArticleRef, News, NewsQuery, User, UserUpdate};
pub use recommend::Recommender;
pub use storage::UserStore;
