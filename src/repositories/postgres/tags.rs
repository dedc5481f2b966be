use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::db::Database;
use crate::error::AppResult;
use crate::models::Tag;
use crate::repositories::TagsRepository;

pub struct PgTagsRepository {
    pool: PgPool,
}

impl PgTagsRepository {
    pub fn new(db: &Database) -> Self {
        PgTagsRepository {
            pool: db.pool.clone(),
        }
    }
}

#[async_trait]
impl TagsRepository for PgTagsRepository {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            "SELECT id, name, created_at, updated_at FROM tags WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    async fn find_many_by_names(&self, names: &[String]) -> AppResult<Vec<Tag>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let tags = sqlx::query_as::<_, Tag>(
            "SELECT id, name, created_at, updated_at FROM tags WHERE name = ANY($1)",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn create(&self, name: &str) -> AppResult<Tag> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;

        let tag = match inserted {
            Some(tag) => tag,
            None => {
                sqlx::query_as::<_, Tag>(
                    "SELECT id, name, created_at, updated_at FROM tags WHERE name = $1",
                )
                .bind(name)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(tag)
    }

    async fn create_many(&self, names: &[String]) -> AppResult<Vec<Tag>> {
        let mut seen = HashSet::new();
        let names: Vec<String> = names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = names.iter().map(|_| Uuid::new_v4().to_string()).collect();
        let mut tx = self.pool.begin().await?;

        let mut tags = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (id, name)
            SELECT * FROM UNNEST($1::text[], $2::text[])
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(&ids)
        .bind(&names)
        .fetch_all(&mut *tx)
        .await?;

        // Names inserted concurrently by another writer are read back
        if tags.len() < names.len() {
            let missing: Vec<String> = names
                .iter()
                .filter(|name| !tags.iter().any(|tag| &tag.name == *name))
                .cloned()
                .collect();

            let existing = sqlx::query_as::<_, Tag>(
                "SELECT id, name, created_at, updated_at FROM tags WHERE name = ANY($1)",
            )
            .bind(&missing)
            .fetch_all(&mut *tx)
            .await?;
            tags.extend(existing);
        }

        tx.commit().await?;
        Ok(tags)
    }
}
