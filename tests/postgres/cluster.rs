//! Server selection for `PostgreSQL` integration tests.

use super::helpers::{BoxError, TEST_DATABASE_URL_ENV};
use pg_embedded_setup_unpriv::{ExecutionPrivileges, detect_execution_privileges};
use postgresql_embedded::{PostgreSQL, Settings};
use std::sync::OnceLock;
use tokio::runtime::Runtime;

/// Embedded server kept alive for the whole test binary.
struct EmbeddedServer {
    url: String,
    _postgres: PostgreSQL,
    _runtime: Runtime,
}

static EMBEDDED: OnceLock<Result<EmbeddedServer, String>> = OnceLock::new();

/// Returns a superuser URL for the `postgres` database.
///
/// Uses `TASKLANE_TEST_DATABASE_URL` when set. Otherwise starts one embedded
/// server per test binary and reuses it.
///
/// # Errors
///
/// Returns an error naming the environment variable when no server is
/// available.
pub fn admin_url() -> Result<String, BoxError> {
    if let Ok(url) = std::env::var(TEST_DATABASE_URL_ENV) {
        return Ok(url);
    }
    let server = EMBEDDED.get_or_init(|| {
        std::thread::spawn(start_embedded)
            .join()
            .map_err(|_| "embedded server start-up panicked".to_owned())
            .and_then(|started| started.map_err(|err| err.to_string()))
    });
    server.as_ref().map(|started| started.url.clone()).map_err(|reason| {
        format!(
            "no PostgreSQL server for integration tests: {reason}; \
             set {TEST_DATABASE_URL_ENV} to a server URL"
        )
        .into()
    })
}

// Runs on a fresh thread so the server's runtime is not nested in the test's.
fn start_embedded() -> Result<EmbeddedServer, BoxError> {
    if matches!(detect_execution_privileges(), ExecutionPrivileges::Root) {
        return Err("the embedded server cannot run as root".into());
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let mut postgres = PostgreSQL::new(Settings::default());
    runtime.block_on(async {
        postgres.setup().await?;
        postgres.start().await
    })?;
    let url = postgres.settings().url("postgres");
    Ok(EmbeddedServer {
        url,
        _postgres: postgres,
        _runtime: runtime,
    })
}
