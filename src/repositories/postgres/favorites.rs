use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::favorite_tags::insert_pairs;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    Favorite, FavoriteFilters, FavoriteWithTags, NewFavorite, NewFavoriteTag, PageRequest, Tag,
};
use crate::repositories::FavoritesRepository;

const FAVORITE_COLUMNS: &str =
    "f.id, f.title, f.description, f.url, f.type, f.user_id, f.created_at, f.updated_at";

#[derive(FromRow)]
struct FavoriteTagRow {
    favorite_id: String,
    #[sqlx(flatten)]
    tag: Tag,
}

pub struct PgFavoritesRepository {
    pool: PgPool,
}

impl PgFavoritesRepository {
    pub fn new(db: &Database) -> Self {
        PgFavoritesRepository {
            pool: db.pool.clone(),
        }
    }

    /// Tags of every favorite in `ids`, each list ordered by name.
    async fn load_tags(&self, ids: &[String]) -> AppResult<HashMap<String, Vec<Tag>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, FavoriteTagRow>(
            r#"
            SELECT ft.favorite_id, t.id, t.name, t.created_at, t.updated_at
            FROM favorite_tags ft
            JOIN tags t ON t.id = ft.tag_id
            WHERE ft.favorite_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tags: HashMap<String, Vec<Tag>> = HashMap::new();
        for row in rows {
            tags.entry(row.favorite_id).or_default().push(row.tag);
        }
        Ok(tags)
    }
}

/// Escapes the `ILIKE` wildcards so user input only matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, user_id: &str, filters: &FavoriteFilters) {
    builder
        .push(" WHERE f.user_id = ")
        .push_bind(user_id.to_string());

    if let Some(favorite_type) = filters.favorite_type {
        builder.push(" AND f.type = ").push_bind(favorite_type);
    }

    if let Some(query) = &filters.query {
        let pattern = format!("%{}%", escape_like(query));
        builder
            .push(" AND (f.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR f.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(tags) = &filters.tags {
        builder
            .push(
                " AND f.id IN (SELECT ft.favorite_id FROM favorite_tags ft \
                 JOIN tags t ON t.id = ft.tag_id WHERE t.name = ANY(",
            )
            .push_bind(tags.clone())
            .push(") GROUP BY ft.favorite_id HAVING COUNT(DISTINCT t.name) = ")
            .push_bind(tags.len() as i64)
            .push(")");
    }
}

#[async_trait]
impl FavoritesRepository for PgFavoritesRepository {
    async fn create(&self, data: NewFavorite) -> AppResult<Favorite> {
        let favorite = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (id, title, description, url, type, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, url, type, user_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.url)
        .bind(data.favorite_type)
        .bind(&data.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(favorite)
    }

    async fn update(
        &self,
        id: &str,
        data: NewFavorite,
        tags: Option<&[NewFavoriteTag]>,
    ) -> AppResult<Favorite> {
        let mut tx = self.pool.begin().await?;

        let favorite = sqlx::query_as::<_, Favorite>(
            r#"
            UPDATE favorites
            SET title = $2, description = $3, url = $4, type = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, url, type, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.url)
        .bind(data.favorite_type)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Favorite not found".to_string()))?;

        if let Some(pairs) = tags {
            sqlx::query("DELETE FROM favorite_tags WHERE favorite_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_pairs(&mut tx, pairs).await?;
        }

        tx.commit().await?;
        Ok(favorite)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM favorite_tags WHERE favorite_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id_with_tags(&self, id: &str) -> AppResult<Option<FavoriteWithTags>> {
        let favorite = sqlx::query_as::<_, Favorite>(&format!(
            "SELECT {} FROM favorites f WHERE f.id = $1",
            FAVORITE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(favorite) = favorite else {
            return Ok(None);
        };

        let mut tags = self.load_tags(&[favorite.id.clone()]).await?;
        let tags = tags.remove(&favorite.id).unwrap_or_default();

        Ok(Some(FavoriteWithTags { favorite, tags }))
    }

    async fn find_many_by_user_id(
        &self,
        user_id: &str,
        page: Option<PageRequest>,
        filters: &FavoriteFilters,
    ) -> AppResult<Vec<FavoriteWithTags>> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM favorites f", FAVORITE_COLUMNS));
        push_filters(&mut builder, user_id, filters);

        let direction = filters.sort_order.as_sql();
        builder.push(format!(
            " ORDER BY f.created_at {}, f.id {}",
            direction, direction
        ));

        if let Some(page) = page {
            builder
                .push(" LIMIT ")
                .push_bind(page.limit as i64)
                .push(" OFFSET ")
                .push_bind(page.offset() as i64);
        }

        let favorites = builder
            .build_query_as::<Favorite>()
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<String> = favorites.iter().map(|f| f.id.clone()).collect();
        let mut tags = self.load_tags(&ids).await?;

        Ok(favorites
            .into_iter()
            .map(|favorite| {
                let tags = tags.remove(&favorite.id).unwrap_or_default();
                FavoriteWithTags { favorite, tags }
            })
            .collect())
    }

    async fn count_by_user_id(&self, user_id: &str, filters: &FavoriteFilters) -> AppResult<u64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM favorites f");
        push_filters(&mut builder, user_id, filters);

        let total: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total.max(0) as u64)
    }
}
