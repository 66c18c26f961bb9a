use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{ArticleRef, User, UserUpdate};

const FAVORITES: &str = "user_favorites";
const READ_LATER: &str = "user_read_later";

// Cascades stay ordered deletes owned by the store; the foreign keys catch
// writes against users that never existed.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_friends (
        user_id INTEGER NOT NULL REFERENCES users(id),
        friend_id INTEGER NOT NULL REFERENCES users(id),
        PRIMARY KEY (user_id, friend_id)
    )",
    "CREATE TABLE IF NOT EXISTS user_favorites (
        user_id INTEGER NOT NULL REFERENCES users(id),
        news_id TEXT NOT NULL,
        title TEXT NOT NULL,
        PRIMARY KEY (user_id, news_id)
    )",
    "CREATE TABLE IF NOT EXISTS user_read_later (
        user_id INTEGER NOT NULL REFERENCES users(id),
        news_id TEXT NOT NULL,
        title TEXT NOT NULL,
        PRIMARY KEY (user_id, news_id)
    )",
];

/// Relational store for users, bidirectional friendship edges and the two
/// saved-article collections. Cloning shares the underlying pool.
#[derive(Clone, Debug)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(opts).await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Store backed by a private in-memory database, for tests and tooling.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        // single connection: every handle must see the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        debug!("user graph schema ready");
        Ok(())
    }

    /// Every user, enriched with friend ids, favorites and read-later lists.
    pub async fn all_users(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let edges: Vec<(i64, i64)> =
            sqlx::query_as("SELECT user_id, friend_id FROM user_friends ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        let favorites: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT user_id, news_id, title FROM user_favorites ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        let read_later: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT user_id, news_id, title FROM user_read_later ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;

        let mut users: Vec<User> = rows
            .into_iter()
            .map(|(id, name)| User::shallow(id, name))
            .collect();
        let index: HashMap<i64, usize> = users
            .iter()
            .enumerate()
            .map(|(position, user)| (user.id, position))
            .collect();
        for (user_id, friend_id) in edges {
            if let Some(&position) = index.get(&user_id) {
                users[position].friends.push(friend_id);
            }
        }
        for (user_id, id, title) in favorites {
            if let Some(&position) = index.get(&user_id) {
                users[position].favorites.push(ArticleRef { id, title });
            }
        }
        for (user_id, id, title) in read_later {
            if let Some(&position) = index.get(&user_id) {
                users[position].read_later.push(ArticleRef { id, title });
            }
        }
        Ok(users)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row: Option<(i64, String)> = sqlx::query_as("SELECT id, name FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some((id, name)) = row else {
            return Ok(None);
        };
        let mut user = User::shallow(id, name);
        user.friends = self.friend_ids(id).await?;
        user.favorites = self.list_refs(FAVORITES, id).await?;
        user.read_later = self.list_refs(READ_LATER, id).await?;
        Ok(Some(user))
    }

    /// Insert a user row and return the assigned id.
    pub async fn create_user(&self, name: &str) -> Result<i64, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("user name must not be empty".into()));
        }
        let result = sqlx::query("INSERT INTO users (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        let id = result.last_insert_rowid();
        debug!(id, name, "created user");
        Ok(id)
    }

    /// Remove the user together with all dependent rows, in one transaction.
    /// Unknown ids are a no-op.
    pub async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM user_favorites WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_read_later WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_friends WHERE user_id = ? OR friend_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        if result.rows_affected() > 0 {
            debug!(id, "deleted user and dependent rows");
        }
        Ok(())
    }

    /// Replace the user's name and all three collections with the supplied
    /// state. Friend edges are rewritten in both directions; favorites and
    /// read-later are full replacements, not merges. Any failed check aborts
    /// the whole update.
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<(), StoreError> {
        let name = update.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("user name must not be empty".into()));
        }
        let mut friends = Vec::with_capacity(update.friends.len());
        for &friend_id in &update.friends {
            if friend_id == id {
                return Err(StoreError::Validation(format!(
                    "user {id} cannot friend itself"
                )));
            }
            if !friends.contains(&friend_id) {
                friends.push(friend_id);
            }
        }

        let mut tx = self.pool.begin().await?;
        if !user_exists(&mut *tx, id).await? {
            return Err(StoreError::NotFound(id));
        }
        for &friend_id in &friends {
            if !user_exists(&mut *tx, friend_id).await? {
                return Err(StoreError::Validation(format!(
                    "friend {friend_id} does not exist"
                )));
            }
        }

        sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM user_friends WHERE user_id = ? OR friend_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for &friend_id in &friends {
            sqlx::query("INSERT INTO user_friends (user_id, friend_id) VALUES (?, ?), (?, ?)")
                .bind(id)
                .bind(friend_id)
                .bind(friend_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        for (table, articles) in [(FAVORITES, &update.favorites), (READ_LATER, &update.read_later)]
        {
            let delete = format!("DELETE FROM {table} WHERE user_id = ?");
            sqlx::query(&delete).bind(id).execute(&mut *tx).await?;
            let insert = format!("INSERT INTO {table} (user_id, news_id, title) VALUES (?, ?, ?)");
            let mut seen = HashSet::new();
            for article in articles.iter() {
                if !seen.insert(article.id.as_str()) {
                    continue;
                }
                sqlx::query(&insert)
                    .bind(id)
                    .bind(&article.id)
                    .bind(&article.title)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        debug!(id, "replaced user profile");
        Ok(())
    }

    /// Friend ids resolved to shallow user records, in edge insertion order.
    pub async fn friends_of(&self, user_id: i64) -> Result<Vec<User>, StoreError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT u.id, u.name FROM user_friends f \
             JOIN users u ON u.id = f.friend_id \
             WHERE f.user_id = ? ORDER BY f.rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| User::shallow(id, name))
            .collect())
    }

    /// Create the symmetric friendship edge. Both users must exist, a user
    /// cannot friend itself, and an existing edge is a conflict.
    pub async fn add_friend(&self, user_id: i64, friend_id: i64) -> Result<(), StoreError> {
        if user_id == friend_id {
            return Err(StoreError::Validation(format!(
                "user {user_id} cannot friend itself"
            )));
        }
        let mut tx = self.pool.begin().await?;
        for id in [user_id, friend_id] {
            if !user_exists(&mut *tx, id).await? {
                return Err(StoreError::NotFound(id));
            }
        }
        sqlx::query("INSERT INTO user_friends (user_id, friend_id) VALUES (?, ?), (?, ?)")
            .bind(user_id)
            .bind(friend_id)
            .bind(friend_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                map_constraint(
                    err,
                    user_id,
                    format!("users {user_id} and {friend_id} are already friends"),
                )
            })?;
        tx.commit().await?;
        Ok(())
    }

    /// Drop both directions of the edge. Missing edges are a no-op.
    pub async fn remove_friend(&self, user_id: i64, friend_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            "DELETE FROM user_friends \
             WHERE (user_id = ? AND friend_id = ?) OR (user_id = ? AND friend_id = ?)",
        )
        .bind(user_id)
        .bind(friend_id)
        .bind(friend_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn favorites(&self, user_id: i64) -> Result<Vec<ArticleRef>, StoreError> {
        self.list_refs(FAVORITES, user_id).await
    }

    pub async fn read_later(&self, user_id: i64) -> Result<Vec<ArticleRef>, StoreError> {
        self.list_refs(READ_LATER, user_id).await
    }

    pub async fn add_favorite(&self, user_id: i64, article: &ArticleRef) -> Result<(), StoreError> {
        self.insert_ref(FAVORITES, user_id, article).await
    }

    pub async fn add_read_later(
        &self,
        user_id: i64,
        article: &ArticleRef,
    ) -> Result<(), StoreError> {
        self.insert_ref(READ_LATER, user_id, article).await
    }

    pub async fn remove_favorite(&self, user_id: i64, article_id: &str) -> Result<(), StoreError> {
        self.delete_ref(FAVORITES, user_id, article_id).await
    }

    pub async fn remove_read_later(
        &self,
        user_id: i64,
        article_id: &str,
    ) -> Result<(), StoreError> {
        self.delete_ref(READ_LATER, user_id, article_id).await
    }

    async fn friend_ids(&self, user_id: i64) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT friend_id FROM user_friends WHERE user_id = ? ORDER BY rowid")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn list_refs(&self, table: &str, user_id: i64) -> Result<Vec<ArticleRef>, StoreError> {
        let sql =
            format!("SELECT news_id AS id, title FROM {table} WHERE user_id = ? ORDER BY rowid");
        let refs = sqlx::query_as::<_, ArticleRef>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(refs)
    }

    async fn insert_ref(
        &self,
        table: &str,
        user_id: i64,
        article: &ArticleRef,
    ) -> Result<(), StoreError> {
        let sql = format!("INSERT INTO {table} (user_id, news_id, title) VALUES (?, ?, ?)");
        sqlx::query(&sql)
            .bind(user_id)
            .bind(&article.id)
            .bind(&article.title)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                map_constraint(
                    err,
                    user_id,
                    format!("article {} already saved for user {user_id}", article.id),
                )
            })?;
        Ok(())
    }

    async fn delete_ref(
        &self,
        table: &str,
        user_id: i64,
        article_id: &str,
    ) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {table} WHERE user_id = ? AND news_id = ?");
        sqlx::query(&sql)
            .bind(user_id)
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn user_exists<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row.is_some())
}

/// The one boundary where engine constraint violations become caller-facing
/// errors: unique violations are conflicts, foreign-key violations mean the
/// referenced user is gone.
fn map_constraint(err: sqlx::Error, user_id: i64, conflict: String) -> StoreError {
    let kind = err.as_database_error().map(|db| db.kind());
    match kind {
        Some(ErrorKind::UniqueViolation) => StoreError::Conflict(conflict),
        Some(ErrorKind::ForeignKeyViolation) => StoreError::NotFound(user_id),
        _ => StoreError::Storage(err),
    }
}
