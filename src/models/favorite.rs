use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::tag::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "favorite_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FavoriteType {
    Sites,
    Articles,
    Tutorials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub favorite_type: FavoriteType,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteWithTags {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub tags: Vec<Tag>,
}

/// Scalar fields written on create and update.
#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub title: String,
    pub description: String,
    pub url: String,
    pub favorite_type: FavoriteType,
    pub user_id: String,
}

impl NewFavorite {
    pub fn from_form(user_id: &str, form: &FavoriteForm) -> Self {
        NewFavorite {
            title: form.title.clone(),
            description: form.description.clone(),
            url: form.url.clone(),
            favorite_type: form.favorite_type,
            user_id: user_id.to_string(),
        }
    }
}

/// Body of the create and update endpoints.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FavoriteForm {
    #[validate(length(min = 2))]
    pub title: String,

    #[validate(length(min = 2))]
    pub description: String,

    #[validate(url)]
    pub url: String,

    #[serde(rename = "type")]
    pub favorite_type: FavoriteType,

    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteResult {
    pub favorite: Favorite,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteDetailResponse {
    pub favorite: FavoriteWithTags,
}
