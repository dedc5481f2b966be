use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FavoriteTagsRepository, FavoritesRepository, TagsRepository, UsersRepository};
use crate::error::{AppError, AppResult};
use crate::models::{
    Favorite, FavoriteFilters, FavoriteTag, FavoriteWithTags, NewFavorite, NewFavoriteTag,
    NewUser, PageRequest, SortOrder, Tag, User,
};

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    favorites: Vec<Favorite>,
    tags: Vec<Tag>,
    favorite_tags: Vec<FavoriteTag>,
    last_timestamp: Option<DateTime<Utc>>,
    #[cfg(test)]
    favorite_tag_writes: usize,
}

impl MemoryState {
    /// Strictly increasing, so rows created within one clock tick still sort by creation.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn record_tag_write(&mut self) {
        #[cfg(test)]
        {
            self.favorite_tag_writes += 1;
        }
    }

    fn insert_pairs(&mut self, pairs: &[NewFavoriteTag]) {
        for pair in pairs {
            let exists = self
                .favorite_tags
                .iter()
                .any(|ft| ft.favorite_id == pair.favorite_id && ft.tag_id == pair.tag_id);
            if exists {
                continue;
            }

            let now = self.next_timestamp();
            self.favorite_tags.push(FavoriteTag {
                favorite_id: pair.favorite_id.clone(),
                tag_id: pair.tag_id.clone(),
                created_at: now,
                updated_at: now,
            });
        }
    }

    fn tags_for(&self, favorite_id: &str) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .favorite_tags
            .iter()
            .filter(|ft| ft.favorite_id == favorite_id)
            .filter_map(|ft| self.tags.iter().find(|t| t.id == ft.tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    fn matching(&self, user_id: &str, filters: &FavoriteFilters) -> Vec<FavoriteWithTags> {
        self.favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| FavoriteWithTags {
                favorite: f.clone(),
                tags: self.tags_for(&f.id),
            })
            .filter(|f| filters.matches(&f.favorite, &f.tags))
            .collect()
    }
}

/// Process-local store implementing every repository trait over one shared state.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

#[async_trait]
impl UsersRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, data: NewUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == data.email) {
            return Err(AppError::UserAlreadyExists);
        }

        let now = state.next_timestamp();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl FavoritesRepository for InMemoryStore {
    async fn create(&self, data: NewFavorite) -> AppResult<Favorite> {
        let mut state = self.state.write().await;
        let now = state.next_timestamp();
        let favorite = Favorite {
            id: Uuid::new_v4().to_string(),
            title: data.title,
            description: data.description,
            url: data.url,
            favorite_type: data.favorite_type,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };
        state.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn update(
        &self,
        id: &str,
        data: NewFavorite,
        tags: Option<&[NewFavoriteTag]>,
    ) -> AppResult<Favorite> {
        let mut state = self.state.write().await;
        let now = state.next_timestamp();
        let favorite = state
            .favorites
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::NotFound("Favorite not found".to_string()))?;

        favorite.title = data.title;
        favorite.description = data.description;
        favorite.url = data.url;
        favorite.favorite_type = data.favorite_type;
        favorite.updated_at = now;
        let favorite = favorite.clone();

        if let Some(pairs) = tags {
            state.record_tag_write();
            state.favorite_tags.retain(|ft| ft.favorite_id != id);
            state.insert_pairs(pairs);
        }

        Ok(favorite)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.favorite_tags.retain(|ft| ft.favorite_id != id);
        state.favorites.retain(|f| f.id != id);
        Ok(())
    }

    async fn find_by_id_with_tags(&self, id: &str) -> AppResult<Option<FavoriteWithTags>> {
        let state = self.state.read().await;
        Ok(state
            .favorites
            .iter()
            .find(|f| f.id == id)
            .map(|f| FavoriteWithTags {
                favorite: f.clone(),
                tags: state.tags_for(&f.id),
            }))
    }

    async fn find_many_by_user_id(
        &self,
        user_id: &str,
        page: Option<PageRequest>,
        filters: &FavoriteFilters,
    ) -> AppResult<Vec<FavoriteWithTags>> {
        let state = self.state.read().await;
        let mut favorites = state.matching(user_id, filters);

        favorites.sort_by(|a, b| {
            let ordering = a
                .favorite
                .created_at
                .cmp(&b.favorite.created_at)
                .then_with(|| a.favorite.id.cmp(&b.favorite.id));
            match filters.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(match page {
            Some(page) => favorites
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect(),
            None => favorites,
        })
    }

    async fn count_by_user_id(&self, user_id: &str, filters: &FavoriteFilters) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state.matching(user_id, filters).len() as u64)
    }
}

#[async_trait]
impl TagsRepository for InMemoryStore {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        let state = self.state.read().await;
        Ok(state.tags.iter().find(|t| t.name == name).cloned())
    }

    async fn find_many_by_names(&self, names: &[String]) -> AppResult<Vec<Tag>> {
        let state = self.state.read().await;
        Ok(state
            .tags
            .iter()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect())
    }

    async fn create(&self, name: &str) -> AppResult<Tag> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.tags.iter().find(|t| t.name == name) {
            return Ok(existing.clone());
        }

        let now = state.next_timestamp();
        let tag = Tag {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }
}

#[async_trait]
impl FavoriteTagsRepository for InMemoryStore {
    async fn create_many(&self, pairs: &[NewFavoriteTag]) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.record_tag_write();
        state.insert_pairs(pairs);
        Ok(())
    }

    async fn find_by_favorite_id(&self, favorite_id: &str) -> AppResult<Vec<FavoriteTag>> {
        let state = self.state.read().await;
        Ok(state
            .favorite_tags
            .iter()
            .filter(|ft| ft.favorite_id == favorite_id)
            .cloned()
            .collect())
    }

    async fn delete_by_favorite_id(&self, favorite_id: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.record_tag_write();
        state.favorite_tags.retain(|ft| ft.favorite_id != favorite_id);
        Ok(())
    }
}

#[cfg(test)]
impl InMemoryStore {
    pub async fn tag_count(&self) -> usize {
        self.state.read().await.tags.len()
    }

    pub async fn favorite_count(&self) -> usize {
        self.state.read().await.favorites.len()
    }

    pub async fn favorite_tag_count(&self) -> usize {
        self.state.read().await.favorite_tags.len()
    }

    /// Number of write calls received by the association store.
    pub async fn favorite_tag_writes(&self) -> usize {
        self.state.read().await.favorite_tag_writes
    }
}
