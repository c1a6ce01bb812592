use crate::core::ControllerRegistry;
use std::time::Duration;
use tokio::sync::watch;

/// Periodically drops idle per-client controllers so the registry does not grow with
/// every visitor the site has ever seen.
#[derive(Debug)]
pub struct ControllerGcWorker {
    registry: ControllerRegistry,
    interval: Duration,
}

impl ControllerGcWorker {
    #[must_use]
    pub const fn new(registry: ControllerRegistry, interval: Duration) -> Self {
        Self { registry, interval }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    self.registry.perform_gc();
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Controller GC loop shutting down...");
    }
}
