//! Persistence ports consumed by the services.
//!
//! Each store is an object-safe trait so the services can run against
//! Postgres in production and against [`InMemoryStore`] in tests.

pub mod factory;
pub mod memory;
pub mod postgres;

pub use factory::{RepositoryFactory, StorageBackend};
pub use memory::InMemoryStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::db::Database;
use crate::error::AppResult;
use crate::models::{
    Favorite, FavoriteFilters, FavoriteTag, FavoriteWithTags, NewFavorite, NewFavoriteTag,
    NewUser, PageRequest, Tag, User,
};

#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Fails with `UserAlreadyExists` when the email is taken.
    async fn create(&self, data: NewUser) -> AppResult<User>;
}

#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    async fn create(&self, data: NewFavorite) -> AppResult<Favorite>;

    /// Writes the scalar fields and, when `tags` is given, replaces the tag
    /// associations in the same write. Either both land or neither does.
    async fn update(
        &self,
        id: &str,
        data: NewFavorite,
        tags: Option<&[NewFavoriteTag]>,
    ) -> AppResult<Favorite>;

    /// Removes the favorite together with all of its tag associations.
    async fn delete(&self, id: &str) -> AppResult<()>;

    async fn find_by_id_with_tags(&self, id: &str) -> AppResult<Option<FavoriteWithTags>>;

    /// Filters, sorts by `created_at`, then pages. `None` returns every match.
    async fn find_many_by_user_id(
        &self,
        user_id: &str,
        page: Option<PageRequest>,
        filters: &FavoriteFilters,
    ) -> AppResult<Vec<FavoriteWithTags>>;

    async fn count_by_user_id(&self, user_id: &str, filters: &FavoriteFilters) -> AppResult<u64>;
}

#[async_trait]
pub trait TagsRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Tag>>;

    async fn find_many_by_names(&self, names: &[String]) -> AppResult<Vec<Tag>>;

    /// Returns the stored tag when the name is already taken.
    async fn create(&self, name: &str) -> AppResult<Tag>;

    /// Creates every name in one operation; the result holds one tag per distinct name.
    ///
    /// The default issues one `create` per name, which is only all-or-nothing
    /// for stores that cannot fail halfway.
    async fn create_many(&self, names: &[String]) -> AppResult<Vec<Tag>> {
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            tags.push(self.create(name).await?);
        }
        Ok(tags)
    }
}

#[async_trait]
pub trait FavoriteTagsRepository: Send + Sync {
    /// Pairs that already exist are skipped.
    async fn create_many(&self, pairs: &[NewFavoriteTag]) -> AppResult<()>;

    async fn find_by_favorite_id(&self, favorite_id: &str) -> AppResult<Vec<FavoriteTag>>;

    async fn delete_by_favorite_id(&self, favorite_id: &str) -> AppResult<()>;
}

/// The set of stores handed to the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UsersRepository>,
    pub favorites: Arc<dyn FavoritesRepository>,
    pub tags: Arc<dyn TagsRepository>,
    pub favorite_tags: Arc<dyn FavoriteTagsRepository>,
}

impl Repositories {
    pub fn postgres(db: &Database) -> Self {
        Repositories {
            users: Arc::new(postgres::PgUsersRepository::new(db)),
            favorites: Arc::new(postgres::PgFavoritesRepository::new(db)),
            tags: Arc::new(postgres::PgTagsRepository::new(db)),
            favorite_tags: Arc::new(postgres::PgFavoriteTagsRepository::new(db)),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Repositories {
            users: store.clone(),
            favorites: store.clone(),
            tags: store.clone(),
            favorite_tags: store,
        }
    }
}
