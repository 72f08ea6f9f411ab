//! Postgres-backed repository implementations.

mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{HealthProbe, RepoError};
use crate::config::DatabaseSettings;
use crate::infra::error::InfraError;

const DEFAULT_DATABASE_NAME: &str = "anagrafe";

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

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl HealthProbe for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}

/// Connection credentials as stored in a secret payload: one JSON object with
/// the fields the server needs to reach its database.
#[derive(Debug, Deserialize)]
struct DatabaseCredentials {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    user: String,
    password: String,
    database: Option<String>,
}

fn default_port() -> u16 {
    5432
}

/// Resolve the connection URL from the settings: an explicit URL wins,
/// otherwise the credentials file is read once and assembled into one.
pub fn resolve_connection_url(settings: &DatabaseSettings) -> Result<String, InfraError> {
    if let Some(url) = settings.url.as_ref() {
        return Ok(url.clone());
    }

    let path = settings.credentials_file.as_ref().ok_or_else(|| {
        InfraError::configuration(
            "either database.url or database.credentials_file must be configured",
        )
    })?;

    let raw = std::fs::read_to_string(path).map_err(|err| {
        InfraError::configuration(format!(
            "failed to read credentials file `{}`: {err}",
            path.display()
        ))
    })?;

    let credentials: DatabaseCredentials = serde_json::from_str(&raw).map_err(|err| {
        InfraError::configuration(format!(
            "failed to parse credentials file `{}`: {err}",
            path.display()
        ))
    })?;

    let database = credentials
        .database
        .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        credentials.user, credentials.password, credentials.host, credentials.port, database
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    fn settings(url: Option<&str>, file: Option<PathBuf>) -> DatabaseSettings {
        DatabaseSettings {
            url: url.map(str::to_string),
            credentials_file: file,
            max_connections: std::num::NonZeroU32::new(10).unwrap(),
        }
    }

    #[test]
    fn explicit_url_wins_over_credentials_file() {
        let resolved = resolve_connection_url(&settings(
            Some("postgres://direct"),
            Some(PathBuf::from("/does/not/exist.json")),
        ))
        .expect("resolve");
        assert_eq!(resolved, "postgres://direct");
    }

    #[test]
    fn missing_url_and_file_is_a_configuration_error() {
        let err = resolve_connection_url(&settings(None, None)).unwrap_err();
        assert!(matches!(err, InfraError::Configuration { .. }));
    }

    #[test]
    fn credentials_file_is_assembled_into_a_url() {
        let file = tempfile_path("creds.json");
        let mut handle = std::fs::File::create(&file.0).expect("create temp file");
        handle
            .write_all(
                br#"{"host":"db.internal","port":5433,"user":"svc","password":"pw","database":"people"}"#,
            )
            .expect("write temp file");

        let resolved =
            resolve_connection_url(&settings(None, Some(file.0.clone()))).expect("resolve");
        assert_eq!(resolved, "postgres://svc:pw@db.internal:5433/people");
    }

    #[test]
    fn credentials_file_falls_back_to_default_port_and_database() {
        let file = tempfile_path("creds-defaults.json");
        let mut handle = std::fs::File::create(&file.0).expect("create temp file");
        handle
            .write_all(br#"{"host":"db.internal","user":"svc","password":"pw"}"#)
            .expect("write temp file");

        let resolved =
            resolve_connection_url(&settings(None, Some(file.0.clone()))).expect("resolve");
        assert_eq!(resolved, "postgres://svc:pw@db.internal:5432/anagrafe");
    }

    struct CleanupPath(PathBuf);

    impl Drop for CleanupPath {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn tempfile_path(name: &str) -> CleanupPath {
        let mut path = std::env::temp_dir();
        path.push(format!("anagrafe-test-{}-{name}", std::process::id()));
        CleanupPath(path)
    }
}
