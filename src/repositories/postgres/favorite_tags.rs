use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::db::Database;
use crate::error::AppResult;
use crate::models::{FavoriteTag, NewFavoriteTag};
use crate::repositories::FavoriteTagsRepository;

pub struct PgFavoriteTagsRepository {
    pool: PgPool,
}

impl PgFavoriteTagsRepository {
    pub fn new(db: &Database) -> Self {
        PgFavoriteTagsRepository {
            pool: db.pool.clone(),
        }
    }
}

pub(super) async fn insert_pairs(tx: &mut Transaction<'_, Postgres>, pairs: &[NewFavoriteTag]) -> AppResult<()> {
    if pairs.is_empty() {
        return Ok(());
    }

    let favorite_ids: Vec<String> = pairs.iter().map(|p| p.favorite_id.clone()).collect();
    let tag_ids: Vec<String> = pairs.iter().map(|p| p.tag_id.clone()).collect();

    sqlx::query(
        r#"
        INSERT INTO favorite_tags (favorite_id, tag_id)
        SELECT * FROM UNNEST($1::text[], $2::text[])
        ON CONFLICT (favorite_id, tag_id) DO NOTHING
        "#,
    )
    .bind(&favorite_ids)
    .bind(&tag_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl FavoriteTagsRepository for PgFavoriteTagsRepository {
    async fn create_many(&self, pairs: &[NewFavoriteTag]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_pairs(&mut tx, pairs).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_favorite_id(&self, favorite_id: &str) -> AppResult<Vec<FavoriteTag>> {
        let rows = sqlx::query_as::<_, FavoriteTag>(
            r#"
            SELECT favorite_id, tag_id, created_at, updated_at
            FROM favorite_tags
            WHERE favorite_id = $1
            "#,
        )
        .bind(favorite_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete_by_favorite_id(&self, favorite_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM favorite_tags WHERE favorite_id = $1")
            .bind(favorite_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
