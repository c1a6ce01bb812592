use crate::core::controller::{SubmissionController, SubmissionPipeline};
use dashmap::DashMap;
use opentelemetry::{global, metrics::Counter};
use std::net::IpAddr;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    reclaimed_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("portfolio-contact");
        Self {
            reclaimed_total: meter
                .u64_counter("contact_controllers_reclaimed_total")
                .with_description("Idle submission controllers reclaimed by GC")
                .build(),
        }
    }
}

/// One [`SubmissionController`] per visitor, so the one-in-flight rule applies per client
/// rather than to the whole site.
#[derive(Clone, Debug)]
pub struct ControllerRegistry {
    pipeline: Arc<SubmissionPipeline>,
    controllers: Arc<DashMap<IpAddr, Arc<SubmissionController>>>,
    metrics: Metrics,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new(pipeline: Arc<SubmissionPipeline>) -> Self {
        Self { pipeline, controllers: Arc::new(DashMap::new()), metrics: Metrics::new() }
    }

    #[must_use]
    pub fn controller_for(&self, client: IpAddr) -> Arc<SubmissionController> {
        let controller = self
            .controllers
            .entry(client)
            .or_insert_with(|| Arc::new(SubmissionController::new(Arc::clone(&self.pipeline))));
        Arc::clone(controller.value())
    }

    #[must_use]
    pub fn is_submitting(&self, client: IpAddr) -> bool {
        self.controllers.get(&client).is_some_and(|c| c.is_submitting())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Drops controllers that are idle and not held by any request.
    pub fn perform_gc(&self) -> u64 {
        let mut reclaimed = 0;
        self.controllers.retain(|_, controller| {
            let keep = Arc::strong_count(controller) > 1 || controller.is_submitting();
            if !keep {
                reclaimed += 1;
            }
            keep
        });

        if reclaimed > 0 {
            self.metrics.reclaimed_total.add(reclaimed, &[]);
            tracing::debug!(reclaimed, remaining = self.controllers.len(), "Reclaimed idle submission controllers");
        }
        reclaimed
    }
}
