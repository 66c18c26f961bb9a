use std::collections::HashSet;

use crate::error::StoreError;
use crate::models::ArticleRef;
use crate::storage::UserStore;

/// Derives "friends' favorites" recommendations by reading through the user
/// graph store.
#[derive(Clone, Debug)]
pub struct Recommender {
    store: UserStore,
}

impl Recommender {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    /// Union of the user's friends' favorite articles, deduplicated by article
    /// id. First occurrence wins: friends in edge order, then each friend's
    /// favorites in saved order. The user's own favorites are not filtered
    /// out, and a user without friends gets an empty list.
    pub async fn for_user(&self, user_id: i64) -> Result<Vec<ArticleRef>, StoreError> {
        let mut seen = HashSet::new();
        let mut recommendations = Vec::new();
        for friend in self.store.friends_of(user_id).await? {
            for article in self.store.favorites(friend.id).await? {
                if seen.insert(article.id.clone()) {
                    recommendations.push(article);
                }
            }
        }
        Ok(recommendations)
    }
}
