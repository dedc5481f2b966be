use anyhow::anyhow;
use std::sync::Arc;
use tracing::{info, warn};

use super::{InMemoryStore, Repositories};
use crate::config::Config;
use crate::db::Database;

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    /// Parse storage backend from string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!(
                "Unsupported STORAGE_BACKEND: {}. Supported backends: postgres, memory",
                other
            )),
        }
    }
}

/// Factory for the repository set used by the running service
pub struct RepositoryFactory;

impl RepositoryFactory {
    pub async fn create(config: &Config) -> anyhow::Result<Repositories> {
        info!("Creating repositories: {:?}", config.storage_backend);

        match config.storage_backend {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("DATABASE_URL is required for the postgres backend"))?;

                let db = Database::new(database_url).await?;
                info!("Database connected");

                db.run_migrations().await?;
                info!("Database migrations completed");

                Ok(Repositories::postgres(&db))
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage, all data is lost on shutdown");
                Ok(Repositories::in_memory(Arc::new(InMemoryStore::default())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!(
            StorageBackend::from_str("postgres").unwrap(),
            StorageBackend::Postgres
        );
        assert_eq!(
            StorageBackend::from_str("MEMORY").unwrap(),
            StorageBackend::Memory
        );
        assert!(StorageBackend::from_str("sqlite").is_err());
    }

    #[tokio::test]
    async fn test_factory_memory_backend() {
        let mut config = crate::config::test_config();
        config.storage_backend = StorageBackend::Memory;

        let repos = RepositoryFactory::create(&config).await.unwrap();
        assert!(repos.users.find_by_id("missing").await.unwrap().is_none());
    }
}
