//! `drive-photos-migrator`: copy every image and video from Google Drive
//! into Google Photos.
//!
//! Takes no flags. Paths, ports and log settings come from `MIGRATOR_*`
//! environment variables with defaults for a run from the working directory.

use anyhow::Context;
use bridge_desktop::{FileSecureStore, LoopbackCallbackListener, ReqwestHttpClient, TokioFileSystem};
use bridge_traits::http::RetryPolicy;
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::HttpClient;
use core_auth::{CredentialProvider, TokenStore};
use core_migrate::{ConsoleProgress, Migration, MigrationError, RunOutcome};
use core_runtime::logging::{init_logging, LoggingConfig};
use core_runtime::MigrationConfig;
use provider_google_drive::GoogleDriveConnector;
use provider_google_photos::GooglePhotosConnector;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Long-lived services shared by the credential and migration stages
struct Services {
    http: Arc<dyn HttpClient>,
    fs: Arc<dyn FileSystemAccess>,
    token_store: TokenStore,
    listener: Arc<LoopbackCallbackListener>,
}

impl Services {
    fn build(config: &MigrationConfig) -> anyhow::Result<Self> {
        let policy = RetryPolicy {
            max_attempts: config.http_max_attempts,
            ..RetryPolicy::default()
        };
        let http = ReqwestHttpClient::with_policy(policy).context("Failed to create HTTP client")?;

        let (token_dir, token_key) = split_token_path(&config.token_path)?;
        let token_store = TokenStore::new(Arc::new(FileSecureStore::new(token_dir)), token_key);

        Ok(Self {
            http: Arc::new(http),
            fs: Arc::new(TokioFileSystem::new(&config.scratch_dir)),
            token_store,
            listener: Arc::new(LoopbackCallbackListener::new(config.callback_port)),
        })
    }
}

/// Token file location as (store directory, key)
fn split_token_path(path: &Path) -> anyhow::Result<(&Path, String)> {
    let key = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Token path {} has no usable file name", path.display()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    Ok((dir, key.to_string()))
}

async fn migrate(config: &MigrationConfig, services: Services) -> Result<RunOutcome, MigrationError> {
    let credentials = CredentialProvider::new(
        config,
        services.token_store,
        services.http.clone(),
        services.fs.clone(),
        services.listener,
    );
    let tokens = credentials.obtain().await?;
    debug!("Credentials ready");

    let migration = Migration::new(
        config,
        Arc::new(GoogleDriveConnector::new(services.http.clone())),
        Arc::new(GooglePhotosConnector::new(services.http)),
        services.fs,
        Arc::new(ConsoleProgress),
    );

    migration.run(&tokens).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MigrationConfig::from_env().context("Invalid configuration")?;

    init_logging(
        LoggingConfig::default()
            .with_format(config.log_format)
            .with_level(config.log_level),
    )
    .context("Failed to initialize logging")?;

    info!(
        scratch_dir = %config.scratch_dir.display(),
        report = %config.report_path.display(),
        policy = %config.download_failure_policy,
        "Starting migration"
    );

    let services = Services::build(&config)?;

    // Service failures are printed and the process still exits normally.
    match migrate(&config, services).await {
        Ok(outcome) => debug!(?outcome, "Migration ended"),
        Err(err) => println!("An error occurred: {}", err),
    }

    Ok(())
}
