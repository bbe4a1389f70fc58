use std::sync::Arc;
use std::time::Duration;

use estoque_core::access::SharedPasswordPolicy;
use estoque_core::config::{AppConfig, ConfigError, LoadOptions, StoreBackend};
use estoque_store::{
    DatasetLoader, MemoryStore, PersistenceWriter, RecordStore, RemoteSheetStore, StoreError,
};
use thiserror::Error;
use tracing::info;

use crate::web::AppState;

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<dyn RecordStore>,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("record store client failed to initialize: {0}")]
    StoreInit(#[source] StoreError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let store: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Remote => {
            let (base_url, access_token) =
                match (config.store.base_url.clone(), config.store.access_token.clone()) {
                    (Some(base_url), Some(access_token)) => (base_url, access_token),
                    _ => {
                        return Err(BootstrapError::Config(ConfigError::Validation(
                            "store.backend = \"remote\" requires store.base_url and store.access_token"
                                .to_string(),
                        )));
                    }
                };

            let remote = RemoteSheetStore::new(
                base_url,
                access_token,
                Duration::from_secs(config.store.timeout_secs),
            )
            .map_err(BootstrapError::StoreInit)?;
            Arc::new(remote)
        }
    };
    info!(
        event_name = "system.bootstrap.store_ready",
        backend = %config.store.backend,
        "record store client initialized"
    );

    let loader = Arc::new(DatasetLoader::new(
        store.clone(),
        config.store.entries_table.clone(),
        config.store.sales_table.clone(),
        Duration::from_secs(config.store.cache_ttl_secs),
    ));
    let writer = Arc::new(PersistenceWriter::new(
        store.clone(),
        loader.clone(),
        config.store.entries_table.clone(),
        config.store.sales_table.clone(),
    ));
    let access = Arc::new(SharedPasswordPolicy::new(config.auth.password.clone()));

    let state = AppState::new(loader, writer, access);

    Ok(Application { config, store, state })
}

#[cfg(test)]
mod tests {
    use estoque_core::config::{ConfigOverrides, LoadOptions, StoreBackend};

    use super::bootstrap;

    #[tokio::test]
    async fn bootstrap_fails_fast_without_a_password() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                store_backend: Some(StoreBackend::Memory),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("bootstrap should fail").to_string();
        assert!(message.contains("auth.password"));
    }

    #[tokio::test]
    async fn memory_backend_bootstraps_with_a_password_override() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                store_backend: Some(StoreBackend::Memory),
                auth_password: Some("segredo".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed");

        assert_eq!(app.config.store.backend, StoreBackend::Memory);
        // A fresh memory backend has no tables yet.
        let read = app.store.read_table("registro_estoque").await.expect("read");
        assert!(read.is_none());
    }
}
