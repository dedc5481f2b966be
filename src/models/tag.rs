use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Association row between a favorite and a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FavoriteTag {
    pub favorite_id: String,
    pub tag_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFavoriteTag {
    pub favorite_id: String,
    pub tag_id: String,
}

impl NewFavoriteTag {
    pub fn for_tags(favorite_id: &str, tags: &[Tag]) -> Vec<NewFavoriteTag> {
        tags.iter()
            .map(|tag| NewFavoriteTag {
                favorite_id: favorite_id.to_string(),
                tag_id: tag.id.clone(),
            })
            .collect()
    }
}

pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Trims and lower-cases every name, drops blanks and keeps the first occurrence of each.
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| normalize_tag_name(name.as_ref()))
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag_names() {
        let names = vec!["React", "react ", "  ", "Rust", "", " RUST", "web dev"];
        assert_eq!(normalize_tag_names(&names), vec!["react", "rust", "web dev"]);
    }

    #[test]
    fn test_normalize_empty_input() {
        let names: Vec<String> = Vec::new();
        assert!(normalize_tag_names(&names).is_empty());
    }
}
