use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::tag::normalize_tag_names;
use crate::models::Tag;
use crate::repositories::Repositories;

pub struct TagService<'a> {
    repos: &'a Repositories,
}

impl<'a> TagService<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        TagService { repos }
    }

    /// Resolves raw names to stored tags, creating only the missing ones.
    ///
    /// The result holds one tag per distinct normalized name, in first-seen order.
    pub async fn reconcile(&self, names: &[String]) -> AppResult<Vec<Tag>> {
        let normalized = normalize_tag_names(names);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.repos.tags.find_many_by_names(&normalized).await?;
        let missing: Vec<String> = normalized
            .iter()
            .filter(|name| !existing.iter().any(|tag| &tag.name == *name))
            .cloned()
            .collect();

        let created = if missing.is_empty() {
            Vec::new()
        } else {
            self.repos.tags.create_many(&missing).await?
        };

        debug!(
            "Reconciled {} tag names: {} existing, {} created",
            normalized.len(),
            existing.len(),
            created.len()
        );

        normalized
            .iter()
            .map(|name| {
                existing
                    .iter()
                    .chain(created.iter())
                    .find(|tag| &tag.name == name)
                    .cloned()
                    .ok_or_else(|| AppError::Internal(format!("Tag '{}' was not persisted", name)))
            })
            .collect()
    }
}

/// Compares two tag lists after normalization, ignoring order and duplicates.
pub fn tag_sets_differ(current: &[String], requested: &[String]) -> bool {
    let mut current = normalize_tag_names(current);
    let mut requested = normalize_tag_names(requested);
    current.sort();
    requested.sort();
    current != requested
}
