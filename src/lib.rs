#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod telemetry;
pub mod workers;

#[cfg(test)]
pub(crate) mod test_support;

use crate::adapters::database;
use crate::adapters::firestore::FirestoreSubmissionStore;
use crate::config::{Config, StoreBackend, StoreConfig};
use crate::core::{
    ControllerRegistry, NotificationDispatcher, NotificationProvider, OutcomeReducer, SubmissionPipeline,
    SubmissionStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Connects the configured submission backend, applying migrations for Postgres.
///
/// # Errors
/// Returns an error if the backend settings are incomplete or the database is unreachable.
pub async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn SubmissionStore>> {
    match config.backend {
        StoreBackend::Firestore => Ok(Arc::new(FirestoreSubmissionStore::from_config(config)?)),
        StoreBackend::Postgres => {
            let pool = database::init_pool(config).await?;
            database::run_migrations(&pool).await?;
            Ok(Arc::new(database::PgSubmissionStore::new(pool)))
        }
    }
}

/// Wires the store and provider into the shared pipeline and the per-client registry.
#[must_use]
pub fn build_registry(
    config: &Config,
    store: Arc<dyn SubmissionStore>,
    provider: Arc<dyn NotificationProvider>,
) -> ControllerRegistry {
    let dispatcher = NotificationDispatcher::new(provider, Duration::from_millis(config.email.timeout_ms));
    let reducer = OutcomeReducer::new(config.submission.owner_email.clone());
    let pipeline = SubmissionPipeline::new(
        store,
        dispatcher,
        reducer,
        config.submission.source_tag.clone(),
        Duration::from_millis(config.store.timeout_ms),
    );
    ControllerRegistry::new(Arc::new(pipeline))
}

/// Routes panics through tracing so they reach the structured log.
pub fn setup_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(panic.location = %location, panic.payload = %payload, "Panic occurred");
        default_hook(info);
    }));
}

/// Flips `shutdown_tx` on Ctrl+C or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });
}
