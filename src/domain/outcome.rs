use crate::domain::submission::SubmissionId;
use serde::Serialize;
use std::fmt;

/// The two outbound notifications sent for every persisted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    /// Tells the site owner a message arrived.
    OperatorAlert,
    /// Confirms receipt to the visitor.
    SubmitterAck,
}

impl Channel {
    pub const ALL: [Self; 2] = [Self::OperatorAlert, Self::SubmitterAck];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OperatorAlert => "operator_alert",
            Self::SubmitterAck => "submitter_ack",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeKind {
    FullSuccess,
    PartialSuccess,
    Failure,
}

impl OutcomeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullSuccess => "FullSuccess",
            Self::PartialSuccess => "PartialSuccess",
            Self::Failure => "Failure",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one submission, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub title: String,
    pub message: String,
    /// Present iff the record was persisted.
    pub submission_id: Option<SubmissionId>,
}

impl Outcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.kind, OutcomeKind::FullSuccess | OutcomeKind::PartialSuccess)
    }
}
