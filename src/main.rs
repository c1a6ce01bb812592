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

use portfolio_contact::adapters::emailjs::EmailJsProvider;
use portfolio_contact::api::MgmtState;
use portfolio_contact::config::Config;
use portfolio_contact::telemetry;
use portfolio_contact::workers::ControllerGcWorker;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    portfolio_contact::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (api_listener, mgmt_listener, app_router, mgmt_app, registry) = async {
        // Phase 1: Infrastructure
        let store = portfolio_contact::build_store(&config.store).await?;
        let provider = Arc::new(EmailJsProvider::new(&config.email)?);

        // Phase 2: Wiring
        let registry = portfolio_contact::build_registry(&config, Arc::clone(&store), provider);
        let app_router = portfolio_contact::api::app_router(&config, registry.clone());
        let mgmt_app = portfolio_contact::api::mgmt_router(MgmtState {
            store,
            check_timeout: Duration::from_millis(config.store.timeout_ms),
        });

        // Phase 3: Listeners
        let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;

        let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
        let mgmt_listener = tokio::net::TcpListener::bind(mgmt_addr).await?;

        tracing::info!(address = %api_addr, backend = ?config.store.backend, "listening");
        tracing::info!(address = %mgmt_addr, "management server listening");

        Ok::<_, anyhow::Error>((api_listener, mgmt_listener, app_router, mgmt_app, registry))
    }
    .instrument(boot_span)
    .await?;

    // Phase 4: Runtime
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    portfolio_contact::spawn_signal_handler(shutdown_tx.clone());

    let gc_worker =
        ControllerGcWorker::new(registry, Duration::from_secs(config.submission.registry_gc_interval_secs));
    let gc_task = tokio::spawn(gc_worker.run(shutdown_rx.clone()));

    let mut api_rx = shutdown_rx.clone();
    let api_server = axum::serve(api_listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = api_rx.wait_for(|&s| s).await;
        });

    let mut mgmt_rx = shutdown_rx.clone();
    let mgmt_server = axum::serve(mgmt_listener, mgmt_app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = mgmt_rx.wait_for(|&s| s).await;
        });

    if let Err(e) = tokio::try_join!(api_server, mgmt_server) {
        tracing::error!(error = %e, "Server error");
    }

    // Phase 5: Shutdown
    let _ = shutdown_tx.send(true);
    tokio::select! {
        _ = gc_task => {
            tracing::info!("Background tasks finished.");
        }
        () = tokio::time::sleep(Duration::from_secs(config.server.shutdown_timeout_secs)) => {
            tracing::warn!("Timeout waiting for background tasks to finish.");
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
