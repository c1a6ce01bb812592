//! In-memory doubles for the store and provider seams, shared by unit tests.
#![allow(clippy::unwrap_used, clippy::panic)]

use crate::core::dispatcher::{DispatchError, NotificationPayload, NotificationProvider};
use crate::core::store::{PersistenceError, StoreResult, SubmissionStore};
use crate::core::validator;
use crate::domain::outcome::Channel;
use crate::domain::submission::{ClientContext, SubmissionId, SubmissionInput, SubmissionRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub(crate) fn valid_record() -> SubmissionRecord {
    let valid = validator::validate(&SubmissionInput::new("Alex", "alex@test.com", "Hi")).unwrap();
    SubmissionRecord::new(valid, ClientContext::default(), "portfolio-website")
}

#[derive(Debug, Default)]
enum StoreBehavior {
    #[default]
    Succeed,
    Fail,
    Hang,
    Gated(Arc<Notify>),
}

#[derive(Debug, Default)]
pub(crate) struct FakeStore {
    behavior: StoreBehavior,
    calls: AtomicUsize,
    records: Mutex<Vec<SubmissionRecord>>,
}

impl FakeStore {
    pub(crate) fn failing() -> Self {
        Self { behavior: StoreBehavior::Fail, ..Self::default() }
    }

    pub(crate) fn hanging() -> Self {
        Self { behavior: StoreBehavior::Hang, ..Self::default() }
    }

    /// Blocks every `persist` until the returned handle is notified.
    pub(crate) fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (Self { behavior: StoreBehavior::Gated(gate.clone()), ..Self::default() }, gate)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionStore for FakeStore {
    async fn persist(&self, record: &SubmissionRecord) -> StoreResult {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            StoreBehavior::Succeed => {}
            StoreBehavior::Fail => return Err(PersistenceError::Unavailable("offline".into())),
            StoreBehavior::Hang => futures::future::pending::<()>().await,
            StoreBehavior::Gated(gate) => gate.notified().await,
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(SubmissionId::new(format!("doc-{n}")))
    }
}

#[derive(Debug, Clone)]
enum SendBehavior {
    Fail(DispatchError),
    Hang,
    Panic,
}

#[derive(Debug, Default)]
pub(crate) struct FakeProvider {
    behaviors: HashMap<Channel, SendBehavior>,
    calls: Mutex<HashMap<Channel, usize>>,
    payloads: Mutex<Vec<NotificationPayload>>,
}

impl FakeProvider {
    pub(crate) fn failing(mut self, channel: Channel, error: DispatchError) -> Self {
        self.behaviors.insert(channel, SendBehavior::Fail(error));
        self
    }

    pub(crate) fn hanging(mut self, channel: Channel) -> Self {
        self.behaviors.insert(channel, SendBehavior::Hang);
        self
    }

    pub(crate) fn panicking(mut self, channel: Channel) -> Self {
        self.behaviors.insert(channel, SendBehavior::Panic);
        self
    }

    pub(crate) fn calls(&self, channel: Channel) -> usize {
        self.calls.lock().unwrap().get(&channel).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub(crate) fn payloads(&self) -> Vec<NotificationPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationProvider for FakeProvider {
    async fn send(&self, channel: Channel, payload: &NotificationPayload) -> Result<(), DispatchError> {
        *self.calls.lock().unwrap().entry(channel).or_default() += 1;
        self.payloads.lock().unwrap().push(payload.clone());

        match self.behaviors.get(&channel).cloned() {
            None => Ok(()),
            Some(SendBehavior::Fail(e)) => Err(e),
            Some(SendBehavior::Hang) => futures::future::pending().await,
            Some(SendBehavior::Panic) => panic!("provider blew up"),
        }
    }
}
