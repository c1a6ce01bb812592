pub mod controller;
pub mod dispatcher;
pub mod reducer;
pub mod registry;
pub mod store;
pub mod validator;

pub use controller::{SubmissionController, SubmissionPipeline, SubmissionState, SubmitError};
pub use dispatcher::{DispatchError, DispatchReport, DispatchResult, NotificationDispatcher, NotificationProvider};
pub use reducer::OutcomeReducer;
pub use registry::ControllerRegistry;
pub use store::{PersistenceError, StoreResult, SubmissionStore};
