use crate::core::dispatcher::DispatchReport;
use crate::core::store::StoreResult;
use crate::domain::outcome::{Outcome, OutcomeKind};

const SENT_TITLE: &str = "Message Sent!";
const SENT_MESSAGE: &str = "Thank you for your message. I'll get back to you soon!";
const PARTIAL_TITLE: &str = "Message Received";
const PARTIAL_MESSAGE: &str = "Your message was saved, but some email notifications could not be delivered. \
                               I'll still see it and get back to you.";
const FAILURE_TITLE: &str = "Error";

/// Folds the store and dispatch results into the single outcome shown to the visitor.
#[derive(Clone, Debug, Default)]
pub struct OutcomeReducer {
    owner_contact: Option<String>,
}

impl OutcomeReducer {
    /// `owner_contact` is offered as a fallback address when a submission is lost.
    #[must_use]
    pub const fn new(owner_contact: Option<String>) -> Self {
        Self { owner_contact }
    }

    /// Store failure wins over everything, then both notifications must succeed for a
    /// full success.
    #[must_use]
    pub fn reduce(&self, store: &StoreResult, dispatch: Option<&DispatchReport>) -> Outcome {
        let id = match store {
            Err(_) => {
                return Outcome {
                    kind: OutcomeKind::Failure,
                    title: FAILURE_TITLE.to_string(),
                    message: self.failure_message(),
                    submission_id: None,
                };
            }
            Ok(id) => id.clone(),
        };

        let (kind, title, message) = match dispatch {
            Some(report) if report.all_ok() => (OutcomeKind::FullSuccess, SENT_TITLE, SENT_MESSAGE),
            _ => (OutcomeKind::PartialSuccess, PARTIAL_TITLE, PARTIAL_MESSAGE),
        };

        Outcome { kind, title: title.to_string(), message: message.to_string(), submission_id: Some(id) }
    }

    fn failure_message(&self) -> String {
        match &self.owner_contact {
            Some(contact) => format!("Failed to send message. Please try again or contact me directly at {contact}."),
            None => "Failed to send message. Please try again or contact me directly.".to_string(),
        }
    }
}
