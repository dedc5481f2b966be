use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let connect_options = PgConnectOptions::from_str(database_url)?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .connect_with(connect_options)
            .await?;

        Ok(Database { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        let migrations = vec![include_str!("../migrations/postgres/001_initial.sql")];

        for (idx, migration_sql) in migrations.iter().enumerate() {
            tracing::info!("Running migration {}", idx + 1);

            for statement in migration_sql.split(';') {
                let trimmed = strip_sql_comments(statement);
                if trimmed.is_empty() {
                    continue;
                }

                if let Err(e) = sqlx::query(&trimmed).execute(&self.pool).await {
                    // Re-running against an initialized schema is expected
                    if e.to_string().contains("already exists") {
                        tracing::debug!("Skipping existing object in migration {}: {}", idx + 1, e);
                    } else {
                        return Err(anyhow::anyhow!(
                            "Migration {} failed on statement `{}`: {}",
                            idx + 1,
                            trimmed,
                            e
                        ));
                    }
                }
            }
        }

        tracing::info!("All migrations completed");
        Ok(())
    }
}

fn strip_sql_comments(statement: &str) -> String {
    statement
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
