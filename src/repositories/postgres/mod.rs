//! Postgres implementations of the repository traits.
//!
//! Every repository holds its own clone of the pool; multi-statement writes
//! run inside a transaction.

mod favorite_tags;
mod favorites;
mod tags;
mod users;

pub use favorite_tags::PgFavoriteTagsRepository;
pub use favorites::PgFavoritesRepository;
pub use tags::PgTagsRepository;
pub use users::PgUsersRepository;

/// Connects to `DATABASE_URL` for the ignored integration tests.
#[cfg(test)]
pub(crate) async fn test_database() -> Option<crate::db::Database> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let db = crate::db::Database::new(&url).await.ok()?;
    db.run_migrations().await.ok()?;
    Some(db)
}
