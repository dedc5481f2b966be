use serde::{Deserialize, Serialize};
use validator::Validate;

use super::favorite::{Favorite, FavoriteType, FavoriteWithTags};
use super::pagination::{PaginationInput, PaginationOutput};
use super::tag::{normalize_tag_names, Tag};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Predicates applied to a user's favorites before sorting and paging.
/// Every present predicate must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteFilters {
    pub favorite_type: Option<FavoriteType>,
    /// Normalized tag names; a favorite must carry all of them.
    pub tags: Option<Vec<String>>,
    /// Case-insensitive substring of the title or the description.
    pub query: Option<String>,
    pub sort_order: SortOrder,
}

impl FavoriteFilters {
    pub fn new(
        favorite_type: Option<FavoriteType>,
        tags: &[String],
        query: Option<&str>,
        sort_order: Option<SortOrder>,
    ) -> Self {
        let tags = normalize_tag_names(tags);
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        FavoriteFilters {
            favorite_type,
            tags: (!tags.is_empty()).then_some(tags),
            query: query.map(str::to_string),
            sort_order: sort_order.unwrap_or_default(),
        }
    }

    pub fn matches(&self, favorite: &Favorite, tags: &[Tag]) -> bool {
        if let Some(favorite_type) = self.favorite_type {
            if favorite.favorite_type != favorite_type {
                return false;
            }
        }

        if let Some(required) = &self.tags {
            let carries_all = required
                .iter()
                .all(|name| tags.iter().any(|tag| &tag.name == name));
            if !carries_all {
                return false;
            }
        }

        if let Some(query) = &self.query {
            let needle = query.to_lowercase();
            if !favorite.title.to_lowercase().contains(&needle)
                && !favorite.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }
}

/// Query string of `GET /favorites`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesQuery {
    #[validate(range(min = 1))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    #[serde(rename = "type")]
    pub favorite_type: Option<FavoriteType>,

    /// Comma-separated tag names.
    pub tags: Option<String>,

    pub search: Option<String>,

    pub sort_order: Option<SortOrder>,
}

impl FavoritesQuery {
    pub fn into_params(self) -> FavoriteListParams {
        let tags = self
            .tags
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        FavoriteListParams {
            pagination: PaginationInput {
                page: self.page,
                limit: self.limit,
            },
            favorite_type: self.favorite_type,
            tags,
            query: self.search,
            sort_order: self.sort_order,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FavoriteListParams {
    pub pagination: PaginationInput,
    pub favorite_type: Option<FavoriteType>,
    pub tags: Vec<String>,
    pub query: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteList {
    pub favorites: Vec<FavoriteWithTags>,
    pub pagination: PaginationOutput,
}
