//! Postgres-backed repository implementations.

mod pages;
mod settings;
mod util;

pub use util::map_sqlx_error;

use std::{str::FromStr, sync::Arc};

use sqlx::{
    Executor,
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
    query,
};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{DatabaseSettings, DatabaseTarget};
use crate::infra::error::InfraError;

/// Run on every new physical connection.
const SESSION_INIT_SQL: &str = "SET client_encoding = 'UTF8'; SET TIME ZONE 'UTC';";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
    ) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute(SESSION_INIT_SQL).await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}

/// Lazily connected, process-wide handle to the store.
///
/// The pool is opened on the first call to [`StoreAccessor::get`] and reused
/// afterwards. A failed attempt leaves the accessor empty so the next call
/// tries again.
pub struct StoreAccessor {
    options: PgConnectOptions,
    max_connections: u32,
    repositories: OnceCell<PostgresRepositories>,
}

impl StoreAccessor {
    pub fn new(settings: &DatabaseSettings) -> Result<Self, InfraError> {
        Ok(Self {
            options: connect_options(&settings.target)?,
            max_connections: settings.max_connections.get(),
            repositories: OnceCell::new(),
        })
    }

    pub async fn get(&self) -> Result<&PostgresRepositories, InfraError> {
        self.repositories
            .get_or_try_init(|| async {
                info!(
                    host = self.options.get_host(),
                    database = self.options.get_database().unwrap_or_default(),
                    "opening store connection"
                );
                let pool = PostgresRepositories::connect(self.options.clone(), self.max_connections)
                    .await
                    .map_err(|err| {
                        InfraError::store_unavailable(format!("failed to connect: {err}"))
                    })?;
                Ok(PostgresRepositories::new(pool))
            })
            .await
    }

    /// Repositories for read queries.
    pub async fn reader(&self) -> Result<&PostgresRepositories, InfraError> {
        self.get().await
    }

    /// Repositories for writes. Shares the read pool until the two are split.
    pub async fn writer(&self) -> Result<&PostgresRepositories, InfraError> {
        self.get().await
    }

    pub fn is_connected(&self) -> bool {
        self.repositories.initialized()
    }
}

fn connect_options(target: &DatabaseTarget) -> Result<PgConnectOptions, InfraError> {
    match target {
        DatabaseTarget::Url(url) => PgConnectOptions::from_str(url)
            .map_err(|err| InfraError::configuration(format!("invalid database url: {err}"))),
        DatabaseTarget::Parts {
            host,
            port,
            username,
            password,
            name,
        } => {
            let mut options = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(username)
                .database(name);
            if let Some(password) = password {
                options = options.password(password);
            }
            Ok(options)
        }
    }
}
