use tracing::{debug, info, warn};

use super::tags::{tag_sets_differ, TagService};
use crate::error::{AppError, AppResult};
use crate::models::{
    FavoriteFilters, FavoriteForm, FavoriteList, FavoriteListParams, FavoriteResult,
    FavoriteWithTags, NewFavorite, NewFavoriteTag, PageRequest, PaginationOutput, Tag,
};
use crate::repositories::Repositories;

pub struct FavoriteService<'a> {
    repos: &'a Repositories,
}

impl<'a> FavoriteService<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        FavoriteService { repos }
    }

    pub async fn create(&self, user_id: &str, form: &FavoriteForm) -> AppResult<FavoriteResult> {
        self.ensure_user(user_id).await?;

        let favorite = self
            .repos
            .favorites
            .create(NewFavorite::from_form(user_id, form))
            .await?;
        info!("Created favorite {} for user {}", favorite.id, user_id);

        if form.tags.is_empty() {
            return Ok(FavoriteResult {
                favorite,
                tags: Vec::new(),
            });
        }

        match self.attach_tags(&favorite.id, &form.tags).await {
            Ok(tags) => Ok(FavoriteResult { favorite, tags }),
            Err(e) => {
                // Never leave a favorite behind without the tags it was created with
                if let Err(cleanup) = self.repos.favorites.delete(&favorite.id).await {
                    warn!(
                        "Failed to remove favorite {} after tag error: {}",
                        favorite.id, cleanup
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn get_by_id(&self, user_id: &str, favorite_id: &str) -> AppResult<FavoriteWithTags> {
        self.find_owned(user_id, favorite_id).await
    }

    pub async fn update(
        &self,
        user_id: &str,
        favorite_id: &str,
        form: &FavoriteForm,
    ) -> AppResult<FavoriteResult> {
        let current = self.find_owned(user_id, favorite_id).await?;

        // Tags are resolved before anything is written, so a failure here leaves the favorite as it was
        let current_names: Vec<String> = current.tags.iter().map(|t| t.name.clone()).collect();
        let tags = if tag_sets_differ(&current_names, &form.tags) {
            Some(TagService::new(self.repos).reconcile(&form.tags).await?)
        } else {
            debug!("Tags of favorite {} unchanged", favorite_id);
            None
        };
        let pairs = tags
            .as_ref()
            .map(|tags| NewFavoriteTag::for_tags(favorite_id, tags));

        let favorite = self
            .repos
            .favorites
            .update(
                favorite_id,
                NewFavorite::from_form(user_id, form),
                pairs.as_deref(),
            )
            .await?;
        info!("Updated favorite {}", favorite_id);

        let tags = match tags {
            Some(tags) => {
                debug!("Replaced tags of favorite {} with {} tags", favorite_id, tags.len());
                tags
            }
            None => current.tags,
        };

        Ok(FavoriteResult { favorite, tags })
    }

    pub async fn delete(&self, user_id: &str, favorite_id: &str) -> AppResult<()> {
        self.find_owned(user_id, favorite_id).await?;
        self.repos.favorites.delete(favorite_id).await?;
        info!("Deleted favorite {}", favorite_id);
        Ok(())
    }

    pub async fn list(&self, user_id: &str, params: FavoriteListParams) -> AppResult<FavoriteList> {
        self.ensure_user(user_id).await?;

        let page = PageRequest::resolve(params.pagination);
        let filters = FavoriteFilters::new(
            params.favorite_type,
            &params.tags,
            params.query.as_deref(),
            params.sort_order,
        );

        let total = self.repos.favorites.count_by_user_id(user_id, &filters).await?;
        let favorites = if total == 0 {
            Vec::new()
        } else {
            self.repos
                .favorites
                .find_many_by_user_id(user_id, Some(page), &filters)
                .await?
        };

        Ok(FavoriteList {
            favorites,
            pagination: PaginationOutput::new(page, total),
        })
    }

    async fn attach_tags(&self, favorite_id: &str, names: &[String]) -> AppResult<Vec<Tag>> {
        let tags = TagService::new(self.repos).reconcile(names).await?;
        if !tags.is_empty() {
            self.repos
                .favorite_tags
                .create_many(&NewFavoriteTag::for_tags(favorite_id, &tags))
                .await?;
        }
        Ok(tags)
    }

    async fn ensure_user(&self, user_id: &str) -> AppResult<()> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Loads a favorite with its tags after the user, existence and ownership checks.
    async fn find_owned(&self, user_id: &str, favorite_id: &str) -> AppResult<FavoriteWithTags> {
        self.ensure_user(user_id).await?;

        let favorite = self
            .repos
            .favorites
            .find_by_id_with_tags(favorite_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Favorite not found".to_string()))?;

        if favorite.favorite.user_id != user_id {
            return Err(AppError::Forbidden(
                "Favorite belongs to another user".to_string(),
            ));
        }

        Ok(favorite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FavoriteType, NewUser, PaginationInput, SortOrder, User};
    use crate::repositories::{InMemoryStore, TagsRepository};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryStore>, Repositories) {
        let store = Arc::new(InMemoryStore::default());
        let repos = Repositories::in_memory(store.clone());
        (store, repos)
    }

    async fn create_user(repos: &Repositories, email: &str) -> User {
        repos
            .users
            .create(NewUser {
                username: "user".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    fn form(title: &str, favorite_type: FavoriteType, tags: &[&str]) -> FavoriteForm {
        FavoriteForm {
            title: title.to_string(),
            description: format!("About {}", title),
            url: "https://example.com".to_string(),
            favorite_type,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn params(page: Option<i64>, limit: Option<i64>) -> FavoriteListParams {
        FavoriteListParams {
            pagination: PaginationInput { page, limit },
            ..Default::default()
        }
    }

    struct FailingTags;

    #[async_trait]
    impl TagsRepository for FailingTags {
        async fn find_by_name(&self, _name: &str) -> AppResult<Option<Tag>> {
            Ok(None)
        }

        async fn find_many_by_names(&self, _names: &[String]) -> AppResult<Vec<Tag>> {
            Ok(Vec::new())
        }

        async fn create(&self, _name: &str) -> AppResult<Tag> {
            Err(AppError::Internal("tag store unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_create_persists_normalized_tags_once() {
        let (store, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;

        let result = FavoriteService::new(&repos)
            .create(&user.id, &form("React Docs", FavoriteType::Sites, &["React", "react "]))
            .await
            .unwrap();

        let tag_names: Vec<_> = result.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, vec!["react"]);
        assert_eq!(store.tag_count().await, 1);
        assert_eq!(store.favorite_tag_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_without_tags_skips_association_store() {
        let (store, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;

        let result = FavoriteService::new(&repos)
            .create(&user.id, &form("Plain", FavoriteType::Articles, &[]))
            .await
            .unwrap();

        assert!(result.tags.is_empty());
        assert_eq!(store.favorite_tag_writes().await, 0);
    }

    #[tokio::test]
    async fn test_create_for_unknown_user() {
        let (_, repos) = setup();
        let result = FavoriteService::new(&repos)
            .create("missing", &form("A", FavoriteType::Sites, &[]))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_removes_favorite_when_tags_fail() {
        let (store, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let repos = Repositories {
            tags: Arc::new(FailingTags),
            ..repos
        };

        let result = FavoriteService::new(&repos)
            .create(&user.id, &form("A", FavoriteType::Sites, &["rust"]))
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(store.favorite_count().await, 0);
        assert_eq!(store.favorite_tag_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_second_page() {
        let (_, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        for title in ["F1", "F2", "F3", "F4", "F5"] {
            service
                .create(&user.id, &form(title, FavoriteType::Sites, &[]))
                .await
                .unwrap();
        }

        let list = service.list(&user.id, params(Some(2), Some(2))).await.unwrap();

        let titles: Vec<_> = list.favorites.iter().map(|f| f.favorite.title.as_str()).collect();
        assert_eq!(titles, vec!["F3", "F2"]);
        assert_eq!(
            list.pagination,
            PaginationOutput {
                page: 2,
                limit: 2,
                total: 5,
                total_pages: 3,
                has_next_page: true,
                has_prev_page: true,
            }
        );
    }

    #[tokio::test]
    async fn test_list_ascending_order() {
        let (_, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        for title in ["F1", "F2", "F3"] {
            service
                .create(&user.id, &form(title, FavoriteType::Sites, &[]))
                .await
                .unwrap();
        }

        let list = service
            .list(
                &user.id,
                FavoriteListParams {
                    sort_order: Some(SortOrder::Asc),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let titles: Vec<_> = list.favorites.iter().map(|f| f.favorite.title.as_str()).collect();
        assert_eq!(titles, vec!["F1", "F2", "F3"]);
    }

    #[tokio::test]
    async fn test_list_clamps_page_zero() {
        let (_, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        service
            .create(&user.id, &form("Only", FavoriteType::Sites, &[]))
            .await
            .unwrap();

        let list = service.list(&user.id, params(Some(0), None)).await.unwrap();

        assert_eq!(list.pagination.page, 1);
        assert_eq!(list.pagination.limit, 10);
        assert_eq!(list.favorites.len(), 1);
        assert!(!list.pagination.has_prev_page);
    }

    #[tokio::test]
    async fn test_list_tag_filter_uses_and() {
        let (_, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        service
            .create(&user.id, &form("Both", FavoriteType::Sites, &["react", "javascript"]))
            .await
            .unwrap();
        service
            .create(&user.id, &form("React only", FavoriteType::Sites, &["react"]))
            .await
            .unwrap();
        service
            .create(&user.id, &form("None", FavoriteType::Sites, &[]))
            .await
            .unwrap();

        let list = service
            .list(
                &user.id,
                FavoriteListParams {
                    tags: vec!["React".to_string(), "javascript".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(list.pagination.total, 1);
        assert_eq!(list.favorites[0].favorite.title, "Both");
    }

    #[tokio::test]
    async fn test_list_combines_type_and_search() {
        let (_, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        service
            .create(&user.id, &form("Rust Book", FavoriteType::Tutorials, &[]))
            .await
            .unwrap();
        service
            .create(&user.id, &form("Rust Blog", FavoriteType::Articles, &[]))
            .await
            .unwrap();
        service
            .create(&user.id, &form("Go Tour", FavoriteType::Tutorials, &[]))
            .await
            .unwrap();

        let list = service
            .list(
                &user.id,
                FavoriteListParams {
                    favorite_type: Some(FavoriteType::Tutorials),
                    query: Some("rust".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(list.pagination.total, 1);
        assert_eq!(list.favorites[0].favorite.title, "Rust Book");
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_user() {
        let (_, repos) = setup();
        let alice = create_user(&repos, "a@example.com").await;
        let bob = create_user(&repos, "b@example.com").await;
        let service = FavoriteService::new(&repos);
        service
            .create(&alice.id, &form("Alice's", FavoriteType::Sites, &[]))
            .await
            .unwrap();

        let list = service.list(&bob.id, params(None, None)).await.unwrap();

        assert!(list.favorites.is_empty());
        assert_eq!(list.pagination.total, 0);
        assert_eq!(list.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn test_other_users_favorite_is_forbidden() {
        let (_, repos) = setup();
        let alice = create_user(&repos, "a@example.com").await;
        let bob = create_user(&repos, "b@example.com").await;
        let service = FavoriteService::new(&repos);
        let created = service
            .create(&bob.id, &form("Bob's", FavoriteType::Sites, &[]))
            .await
            .unwrap();

        let get = service.get_by_id(&alice.id, &created.favorite.id).await;
        assert!(matches!(get, Err(AppError::Forbidden(_))));

        let delete = service.delete(&alice.id, &created.favorite.id).await;
        assert!(matches!(delete, Err(AppError::Forbidden(_))));

        let update = service
            .update(&alice.id, &created.favorite.id, &form("Mine", FavoriteType::Sites, &[]))
            .await;
        assert!(matches!(update, Err(AppError::Forbidden(_))));

        let missing = service.get_by_id(&alice.id, "missing").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_leaves_favorite_unchanged_when_tags_fail() {
        let (store, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let created = FavoriteService::new(&repos)
            .create(&user.id, &form("Original", FavoriteType::Sites, &["react"]))
            .await
            .unwrap();
        let repos = Repositories {
            tags: Arc::new(FailingTags),
            ..repos
        };
        let service = FavoriteService::new(&repos);

        let result = service
            .update(&user.id, &created.favorite.id, &form("Changed", FavoriteType::Articles, &["rust"]))
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        let stored = service.get_by_id(&user.id, &created.favorite.id).await.unwrap();
        assert_eq!(stored.favorite.title, "Original");
        assert_eq!(stored.favorite.description, "About Original");
        assert_eq!(stored.favorite.favorite_type, FavoriteType::Sites);
        assert_eq!(stored.favorite.updated_at, created.favorite.updated_at);
        let stored_names: Vec<_> = stored.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(stored_names, vec!["react"]);
        assert_eq!(store.favorite_tag_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_with_same_tags_writes_nothing() {
        let (store, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        let created = service
            .create(&user.id, &form("Guide", FavoriteType::Sites, &["react", "javascript"]))
            .await
            .unwrap();
        let writes = store.favorite_tag_writes().await;

        let updated = service
            .update(
                &user.id,
                &created.favorite.id,
                &form("Guide v2", FavoriteType::Articles, &[" JavaScript", "React"]),
            )
            .await
            .unwrap();

        assert_eq!(store.favorite_tag_writes().await, writes);
        assert_eq!(updated.favorite.title, "Guide v2");
        assert_eq!(updated.favorite.favorite_type, FavoriteType::Articles);
        assert_eq!(updated.tags.len(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_changed_tags() {
        let (store, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        let created = service
            .create(&user.id, &form("Guide", FavoriteType::Sites, &["react"]))
            .await
            .unwrap();

        let updated = service
            .update(&user.id, &created.favorite.id, &form("Guide", FavoriteType::Sites, &["Vue", "vue"]))
            .await
            .unwrap();

        let tag_names: Vec<_> = updated.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, vec!["vue"]);

        let stored = service.get_by_id(&user.id, &created.favorite.id).await.unwrap();
        let stored_names: Vec<_> = stored.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(stored_names, vec!["vue"]);
        assert_eq!(store.favorite_tag_count().await, 1);
        assert_eq!(store.tag_count().await, 2);
    }

    #[tokio::test]
    async fn test_update_clears_tags() {
        let (store, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        let created = service
            .create(&user.id, &form("Guide", FavoriteType::Sites, &["react"]))
            .await
            .unwrap();

        let updated = service
            .update(&user.id, &created.favorite.id, &form("Guide", FavoriteType::Sites, &[]))
            .await
            .unwrap();

        assert!(updated.tags.is_empty());
        assert_eq!(store.favorite_tag_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_associations() {
        let (store, repos) = setup();
        let user = create_user(&repos, "a@example.com").await;
        let service = FavoriteService::new(&repos);
        let created = service
            .create(&user.id, &form("Guide", FavoriteType::Sites, &["react", "rust"]))
            .await
            .unwrap();
        assert_eq!(store.favorite_tag_count().await, 2);

        service.delete(&user.id, &created.favorite.id).await.unwrap();

        assert_eq!(store.favorite_tag_count().await, 0);
        assert_eq!(store.tag_count().await, 2);
        let after = service.get_by_id(&user.id, &created.favorite.id).await;
        assert!(matches!(after, Err(AppError::NotFound(_))));
    }
}
