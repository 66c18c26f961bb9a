use news_core::{ArticleRef, StoreError, UserStore, UserUpdate};

#[tokio::test]
async fn created_user_reads_back_by_id() {
    let store = UserStore::in_memory().await.unwrap();

    let id = store.create_user("Ann").await.unwrap();
    let user = store.user_by_id(id).await.unwrap().expect("user exists");
    assert_eq!(user.id, id);
    assert_eq!(user.name, "Ann");
    assert!(user.friends.is_empty());
    assert!(user.favorites.is_empty());
    assert!(user.read_later.is_empty());

    assert!(store.user_by_id(id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn empty_name_is_rejected() {
    let store = UserStore::in_memory().await.unwrap();

    let err = store.create_user("   ").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let id = store.create_user("Ann").await.unwrap();
    let err = store
        .update_user(id, &UserUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn friendship_is_symmetric() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();
    let bo = store.create_user("Bo").await.unwrap();

    store.add_friend(ann, bo).await.unwrap();

    let ann_friends = store.friends_of(ann).await.unwrap();
    assert_eq!(ann_friends.len(), 1);
    assert_eq!(ann_friends[0].id, bo);
    assert_eq!(ann_friends[0].name, "Bo");

    let bo_friends = store.friends_of(bo).await.unwrap();
    assert_eq!(bo_friends.len(), 1);
    assert_eq!(bo_friends[0].id, ann);
    assert_eq!(bo_friends[0].name, "Ann");
}

#[tokio::test]
async fn self_friendship_is_rejected_without_an_edge() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();

    let err = store.add_friend(ann, ann).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(store.friends_of(ann).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_edge_is_a_conflict() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();
    let bo = store.create_user("Bo").await.unwrap();

    store.add_friend(ann, bo).await.unwrap();
    let err = store.add_friend(ann, bo).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    // the mirrored direction already exists as well
    let err = store.add_friend(bo, ann).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn add_friend_requires_both_users() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();

    let err = store.add_friend(ann, ann + 99).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(store.friends_of(ann).await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_friend_drops_both_directions() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();
    let bo = store.create_user("Bo").await.unwrap();
    store.add_friend(ann, bo).await.unwrap();

    store.remove_friend(bo, ann).await.unwrap();
    assert!(store.friends_of(ann).await.unwrap().is_empty());
    assert!(store.friends_of(bo).await.unwrap().is_empty());

    // removing again is a no-op
    store.remove_friend(ann, bo).await.unwrap();
}

#[tokio::test]
async fn delete_user_cascades_and_is_idempotent() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();
    let bo = store.create_user("Bo").await.unwrap();
    let cy = store.create_user("Cy").await.unwrap();
    store.add_friend(ann, bo).await.unwrap();
    store.add_friend(cy, ann).await.unwrap();
    store
        .add_favorite(ann, &ArticleRef::new("abc-uuid", "Some Title"))
        .await
        .unwrap();
    store
        .add_read_later(ann, &ArticleRef::new("def-uuid", "Later"))
        .await
        .unwrap();

    store.delete_user(ann).await.unwrap();

    assert!(store.user_by_id(ann).await.unwrap().is_none());
    assert!(store.favorites(ann).await.unwrap().is_empty());
    assert!(store.read_later(ann).await.unwrap().is_empty());
    // no dangling edges on either side
    assert!(store.friends_of(bo).await.unwrap().is_empty());
    assert!(store.friends_of(cy).await.unwrap().is_empty());

    store.delete_user(ann).await.unwrap();
}

#[tokio::test]
async fn update_replaces_name_edges_and_collections() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();
    let bo = store.create_user("Bo").await.unwrap();
    let cy = store.create_user("Cy").await.unwrap();
    store.add_friend(ann, cy).await.unwrap();
    store
        .add_favorite(ann, &ArticleRef::new("old-uuid", "Old"))
        .await
        .unwrap();

    let update = UserUpdate {
        name: "Ann B.".into(),
        friends: vec![bo],
        favorites: vec![
            ArticleRef::new("x-uuid", "X"),
            ArticleRef::new("y-uuid", "Y"),
        ],
        read_later: vec![ArticleRef::new("z-uuid", "Z")],
    };
    store.update_user(ann, &update).await.unwrap();

    let user = store.user_by_id(ann).await.unwrap().unwrap();
    assert_eq!(user.name, "Ann B.");
    assert_eq!(user.friends, vec![bo]);
    assert_eq!(
        user.favorites,
        vec![
            ArticleRef::new("x-uuid", "X"),
            ArticleRef::new("y-uuid", "Y"),
        ]
    );
    assert_eq!(user.read_later, vec![ArticleRef::new("z-uuid", "Z")]);
    // the dropped edge disappeared from the other side too
    assert!(store.friends_of(cy).await.unwrap().is_empty());
    // and the replacement edge is symmetric
    assert_eq!(store.friends_of(bo).await.unwrap()[0].id, ann);
}

#[tokio::test]
async fn update_with_no_friends_clears_all_edges() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();
    let bo = store.create_user("Bo").await.unwrap();
    let cy = store.create_user("Cy").await.unwrap();
    store.add_friend(ann, bo).await.unwrap();
    store.add_friend(ann, cy).await.unwrap();

    let update = UserUpdate {
        name: "Ann".into(),
        ..UserUpdate::default()
    };
    store.update_user(ann, &update).await.unwrap();

    assert!(store.friends_of(ann).await.unwrap().is_empty());
    assert!(store.friends_of(bo).await.unwrap().is_empty());
    assert!(store.friends_of(cy).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_validates_friends_and_aborts_whole_change() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();
    let bo = store.create_user("Bo").await.unwrap();
    store.add_friend(ann, bo).await.unwrap();
    store
        .add_favorite(ann, &ArticleRef::new("keep-uuid", "Keep"))
        .await
        .unwrap();

    let update = UserUpdate {
        name: "Renamed".into(),
        friends: vec![bo, bo + 99],
        favorites: vec![ArticleRef::new("new-uuid", "New")],
        ..UserUpdate::default()
    };
    let err = store.update_user(ann, &update).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    // nothing from the failed update stuck
    let user = store.user_by_id(ann).await.unwrap().unwrap();
    assert_eq!(user.name, "Ann");
    assert_eq!(user.friends, vec![bo]);
    assert_eq!(user.favorites, vec![ArticleRef::new("keep-uuid", "Keep")]);

    let update = UserUpdate {
        name: "Renamed".into(),
        friends: vec![ann],
        ..UserUpdate::default()
    };
    let err = store.update_user(ann, &update).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = store
        .update_user(ann + 99, &UserUpdate {
            name: "Ghost".into(),
            ..UserUpdate::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn favorites_roundtrip_and_duplicates() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();

    let article = ArticleRef::new("abc-uuid", "Some Title");
    store.add_favorite(ann, &article).await.unwrap();
    assert_eq!(store.favorites(ann).await.unwrap(), vec![article.clone()]);

    let err = store.add_favorite(ann, &article).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    // the collections are disjoint: the same article can be saved for later
    store.add_read_later(ann, &article).await.unwrap();
    assert_eq!(store.read_later(ann).await.unwrap(), vec![article.clone()]);

    store.remove_favorite(ann, "abc-uuid").await.unwrap();
    assert!(store.favorites(ann).await.unwrap().is_empty());
    // removal is idempotent
    store.remove_favorite(ann, "abc-uuid").await.unwrap();

    store.remove_read_later(ann, "abc-uuid").await.unwrap();
    assert!(store.read_later(ann).await.unwrap().is_empty());
}

#[tokio::test]
async fn saving_for_a_missing_user_is_not_found() {
    let store = UserStore::in_memory().await.unwrap();

    let err = store
        .add_favorite(42, &ArticleRef::new("abc-uuid", "Some Title"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(42)));
}

#[tokio::test]
async fn all_users_are_enriched() {
    let store = UserStore::in_memory().await.unwrap();
    let ann = store.create_user("Ann").await.unwrap();
    let bo = store.create_user("Bo").await.unwrap();
    store.add_friend(ann, bo).await.unwrap();
    store
        .add_favorite(bo, &ArticleRef::new("x-uuid", "X"))
        .await
        .unwrap();
    store
        .add_read_later(ann, &ArticleRef::new("z-uuid", "Z"))
        .await
        .unwrap();

    let users = store.all_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].friends, vec![bo]);
    assert_eq!(users[0].read_later, vec![ArticleRef::new("z-uuid", "Z")]);
    assert_eq!(users[1].friends, vec![ann]);
    assert_eq!(users[1].favorites, vec![ArticleRef::new("x-uuid", "X")]);
}
