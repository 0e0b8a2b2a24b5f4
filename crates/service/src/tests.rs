use super::*;
use async_trait::async_trait;
use domain::{CreateComment, EditComment, PageRequest};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct FakeRegistry {
    recipes: Mutex<HashSet<String>>,
    users: Mutex<HashMap<String, String>>,
    delay: Option<Duration>,
}

impl FakeRegistry {
    fn add_recipe(&self, id: &str) {
        self.recipes.lock().unwrap().insert(id.to_string());
    }

    fn add_user(&self, id: &str, name: &str) {
        self.users
            .lock()
            .unwrap()
            .insert(id.to_string(), name.to_string());
    }
}

#[async_trait]
impl RecipeRegistry for FakeRegistry {
    async fn recipe_exists(&self, recipe_id: &RecipeId) -> anyhow::Result<bool> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.recipes.lock().unwrap().contains(recipe_id.as_str()))
    }
}

#[async_trait]
impl UserDirectory for FakeRegistry {
    async fn resolve_username(&self, user_id: &UserId) -> anyhow::Result<Option<String>> {
        Ok(self.users.lock().unwrap().get(user_id.as_str()).cloned())
    }
}

async fn setup() -> (CommentService, Arc<FakeRegistry>) {
    let registry = Arc::new(FakeRegistry::default());
    registry.add_recipe("pancakes");
    registry.add_user("alice", "Alice");
    registry.add_user("bob", "Bob");

    let db = Db::new("sqlite::memory:").await.unwrap();
    let service = CommentService::new(
        db,
        registry.clone(),
        registry.clone(),
        Duration::from_secs(5),
    );
    (service, registry)
}

fn recipe(id: &str) -> RecipeId {
    RecipeId::new_unchecked(id)
}

fn user(id: &str) -> UserId {
    UserId::new_unchecked(id)
}

fn cmd(text: &str, rating: i64) -> CreateComment {
    CreateComment::new(text.to_string(), rating).unwrap()
}

#[tokio::test]
async fn test_create_returns_fresh_comment() {
    let (service, _) = setup().await;

    let c = service
        .create(&recipe("pancakes"), &user("alice"), cmd("Fluffy!", 5))
        .await
        .unwrap();

    assert!(!c.is_edited);
    assert!(c.likes.is_empty());
    assert_eq!(c.username, "Alice");
    assert_eq!(c.created_at, c.updated_at);
    assert_eq!(c.rating.value(), 5);
}

#[tokio::test]
async fn test_create_on_missing_recipe_persists_nothing() {
    let (service, registry) = setup().await;

    let err = service
        .create(&recipe("waffles"), &user("alice"), cmd("Where is it?", 3))
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::RecipeNotFound));

    registry.add_recipe("waffles");
    let page = service
        .list(&recipe("waffles"), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total_comments, 0);
}

#[tokio::test]
async fn test_create_with_unknown_user() {
    let (service, _) = setup().await;
    let err = service
        .create(&recipe("pancakes"), &user("ghost"), cmd("Boo", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::UserNotFound));
}

#[tokio::test]
async fn test_username_is_a_snapshot() {
    let (service, registry) = setup().await;
    service
        .create(&recipe("pancakes"), &user("alice"), cmd("Nice", 4))
        .await
        .unwrap();

    registry.add_user("alice", "Alice Renamed");

    let page = service
        .list(&recipe("pancakes"), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.comments[0].username, "Alice");
}

#[tokio::test]
async fn test_update_by_owner() {
    let (service, _) = setup().await;
    let c = service
        .create(&recipe("pancakes"), &user("alice"), cmd("Okay", 3))
        .await
        .unwrap();
    service.toggle_like(&c.id, &user("bob")).await.unwrap();

    let edit = EditComment::new(Some("Actually great".into()), Some(5)).unwrap();
    let updated = service.update(&c.id, &user("alice"), edit).await.unwrap();

    assert!(updated.is_edited);
    assert!(updated.updated_at > updated.created_at);
    assert_eq!(updated.created_at, c.created_at);
    assert_eq!(updated.text.as_str(), "Actually great");
    assert_eq!(updated.rating.value(), 5);
    assert_eq!(updated.username, "Alice");
    assert_eq!(updated.like_count(), 1);
}

#[tokio::test]
async fn test_update_rejects_non_owner_and_missing() {
    let (service, _) = setup().await;
    let c = service
        .create(&recipe("pancakes"), &user("alice"), cmd("Mine", 3))
        .await
        .unwrap();

    let edit = EditComment::new(None, Some(1)).unwrap();
    let err = service
        .update(&c.id, &user("bob"), edit.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::Forbidden(Action::Edit)));

    let err = service
        .update(&CommentId::new_unchecked("nope"), &user("alice"), edit)
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::CommentNotFound));

    let page = service
        .list(&recipe("pancakes"), PageRequest::default())
        .await
        .unwrap();
    assert!(!page.comments[0].is_edited);
    assert_eq!(page.comments[0].rating.value(), 3);
}

#[tokio::test]
async fn test_toggle_like_twice_restores_membership() {
    let (service, _) = setup().await;
    let c = service
        .create(&recipe("pancakes"), &user("alice"), cmd("Like me", 4))
        .await
        .unwrap();

    let first = service.toggle_like(&c.id, &user("bob")).await.unwrap();
    assert_eq!(first, LikeOutcome { is_liked: true, like_count: 1 });

    // 作者也可以给自己点赞
    let own = service.toggle_like(&c.id, &user("alice")).await.unwrap();
    assert_eq!(own, LikeOutcome { is_liked: true, like_count: 2 });

    let second = service.toggle_like(&c.id, &user("bob")).await.unwrap();
    assert_eq!(second, LikeOutcome { is_liked: false, like_count: 1 });

    let page = service
        .list(&recipe("pancakes"), PageRequest::default())
        .await
        .unwrap();
    let stored = &page.comments[0];
    assert_eq!(stored.likes.len(), 1);
    assert!(stored.is_liked_by(&user("alice")));
    assert!(!stored.is_edited);
    assert_eq!(stored.updated_at, c.updated_at);
}

#[tokio::test]
async fn test_toggle_like_on_missing_comment() {
    let (service, _) = setup().await;
    let err = service
        .toggle_like(&CommentId::new_unchecked("nope"), &user("bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::CommentNotFound));
}

#[tokio::test]
async fn test_concurrent_likes_from_different_users_all_land() {
    let (service, registry) = setup().await;
    let c = service
        .create(&recipe("pancakes"), &user("alice"), cmd("Popular", 5))
        .await
        .unwrap();

    let users: Vec<UserId> = (0..24).map(|i| user(&format!("fan-{}", i))).collect();
    for u in &users {
        registry.add_user(u.as_str(), u.as_str());
    }

    let results =
        futures::future::join_all(users.iter().map(|u| service.toggle_like(&c.id, u))).await;
    assert!(results.iter().all(|r| matches!(r, Ok(o) if o.is_liked)));

    let page = service
        .list(&recipe("pancakes"), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.comments[0].like_count(), 24);
    assert!(users.iter().all(|u| page.comments[0].is_liked_by(u)));
}

#[tokio::test]
async fn test_delete_by_owner_only() {
    let (service, _) = setup().await;
    let c = service
        .create(&recipe("pancakes"), &user("alice"), cmd("Temporary", 2))
        .await
        .unwrap();

    let err = service.delete(&c.id, &user("bob")).await.unwrap_err();
    assert!(matches!(err, CommentError::Forbidden(Action::Delete)));

    service.delete(&c.id, &user("alice")).await.unwrap();

    let err = service.delete(&c.id, &user("alice")).await.unwrap_err();
    assert!(matches!(err, CommentError::CommentNotFound));

    let page = service
        .list(&recipe("pancakes"), PageRequest::default())
        .await
        .unwrap();
    assert!(page.comments.is_empty());
    assert!(page.aggregate_rating.is_none());
}

#[tokio::test]
async fn test_list_paginates_fifteen_comments() {
    let (service, _) = setup().await;
    for i in 0..15 {
        service
            .create(&recipe("pancakes"), &user("alice"), cmd(&format!("#{}", i), 4))
            .await
            .unwrap();
    }

    let page1 = service
        .list(&recipe("pancakes"), PageRequest::new(Some(1), Some(10), 100))
        .await
        .unwrap();
    assert_eq!(page1.comments.len(), 10);
    assert_eq!(page1.pagination.total_comments, 15);
    assert_eq!(page1.pagination.total_pages, 2);
    assert!(page1.pagination.has_next);
    assert!(!page1.pagination.has_prev);

    let page2 = service
        .list(&recipe("pancakes"), PageRequest::new(Some(2), Some(10), 100))
        .await
        .unwrap();
    assert_eq!(page2.comments.len(), 5);
    assert!(!page2.pagination.has_next);
    assert!(page2.pagination.has_prev);

    // 聚合覆盖全部评论，而不是当前页
    assert_eq!(page2.aggregate_rating.unwrap().total, 15);
}

#[tokio::test]
async fn test_aggregate_rating_over_recipe() {
    let (service, _) = setup().await;
    for r in [5, 5, 4, 3, 1] {
        service
            .create(&recipe("pancakes"), &user("bob"), cmd("Rated", r))
            .await
            .unwrap();
    }

    let page = service
        .list(&recipe("pancakes"), PageRequest::new(Some(1), Some(2), 100))
        .await
        .unwrap();
    let summary = page.aggregate_rating.unwrap();
    assert_eq!(summary.average, 3.6);
    assert_eq!(summary.total, 5);
    let json = serde_json::to_value(&summary.distribution).unwrap();
    assert_eq!(json, serde_json::json!({"1": 1, "2": 0, "3": 1, "4": 1, "5": 2}));
}

#[tokio::test]
async fn test_empty_recipe_has_null_aggregate() {
    let (service, _) = setup().await;
    let page = service
        .list(&recipe("pancakes"), PageRequest::default())
        .await
        .unwrap();

    assert!(page.aggregate_rating.is_none());
    assert_eq!(page.pagination.total_comments, 0);
    assert_eq!(page.pagination.total_pages, 0);
    assert!(page.comments.is_empty());
}

#[tokio::test]
async fn test_list_missing_recipe() {
    let (service, _) = setup().await;
    let err = service
        .list(&recipe("nothing"), PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::RecipeNotFound));
}

#[tokio::test]
async fn test_slow_registry_is_unavailable() {
    let registry = Arc::new(FakeRegistry {
        delay: Some(Duration::from_millis(500)),
        ..Default::default()
    });
    registry.add_recipe("pancakes");
    let db = Db::new("sqlite::memory:").await.unwrap();
    let service = CommentService::new(
        db,
        registry.clone(),
        registry.clone(),
        Duration::from_millis(20),
    );

    let err = service
        .list(&recipe("pancakes"), PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::Unavailable(_)));
}
