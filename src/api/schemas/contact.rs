use crate::domain::outcome::{Outcome, OutcomeKind};
use crate::domain::submission::SubmissionId;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeResponse {
    pub kind: OutcomeKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<SubmissionId>,
}

impl From<Outcome> for OutcomeResponse {
    fn from(outcome: Outcome) -> Self {
        Self { kind: outcome.kind, title: outcome.title, message: outcome.message, submission_id: outcome.submission_id }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub submitting: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_response_shape() {
        let response = OutcomeResponse::from(Outcome {
            kind: OutcomeKind::PartialSuccess,
            title: "Message Received".into(),
            message: "saved".into(),
            submission_id: Some(SubmissionId::new("doc-1")),
        });

        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["kind"], "PartialSuccess");
        assert_eq!(json["submissionId"], "doc-1");
    }

    #[test]
    fn test_failure_omits_submission_id() {
        let response = OutcomeResponse::from(Outcome {
            kind: OutcomeKind::Failure,
            title: "Error".into(),
            message: "lost".into(),
            submission_id: None,
        });

        let json = serde_json::to_value(response).unwrap();
        assert!(json.get("submissionId").is_none());
    }
}
