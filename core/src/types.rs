//! Wire types for the Quick Setup REST API.
//!
//! # Design
//! Stage form data and action result payloads have server-owned schemas
//! that vary per quick setup, so they are carried as `serde_json` values
//! and passed through verbatim. Everything with a stable shape — stage
//! overviews, job handles, job status — gets a typed DTO. These types are
//! defined independently of the mock-server crate; integration tests catch
//! schema drift.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// The `domainType` tag marking a response as a deferred background job.
pub const BACKGROUND_JOB_DOMAIN: &str = "background_job";

/// Arbitrary form data for one wizard stage. The schema is owned by the
/// server-side stage definition.
pub type StageData = serde_json::Map<String, Value>;

/// One stage's form data as it appears in action request bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEntry {
    pub form_data: StageData,
}

fn wrap_stages(form_data: Vec<StageData>) -> Vec<StageEntry> {
    form_data.into_iter().map(|form_data| StageEntry { form_data }).collect()
}

/// Body of a final `save`/`edit` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalActionRequest {
    pub button_id: String,
    pub stages: Vec<StageEntry>,
}

impl FinalActionRequest {
    pub fn new(button_id: impl Into<String>, form_data: Vec<StageData>) -> Self {
        Self {
            button_id: button_id.into(),
            stages: wrap_stages(form_data),
        }
    }
}

/// Body of a per-stage action (validate-and-recap).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageActionRequest {
    pub stage_action_id: String,
    pub stages: Vec<StageEntry>,
}

impl StageActionRequest {
    pub fn new(stage_action_id: impl Into<String>, form_data: Vec<StageData>) -> Self {
        Self {
            stage_action_id: stage_action_id.into(),
            stages: wrap_stages(form_data),
        }
    }
}

/// Title line for one stage in the wizard's stage list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOverview {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
}

/// Renderable structure of a single stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStructure {
    #[serde(default)]
    pub components: Vec<Value>,
    #[serde(default)]
    pub actions: Vec<Value>,
}

/// Guided-mode response: all stage overviews plus the first stage's
/// structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidedResponse {
    pub quick_setup_id: String,
    pub overviews: Vec<StageOverview>,
    pub stage: StageStructure,
    #[serde(default)]
    pub actions: Vec<Value>,
}

/// Overview-mode response: the structure of every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewResponse {
    pub quick_setup_id: String,
    pub overviews: Vec<StageOverview>,
    pub stages: Vec<StageStructure>,
}

/// Handle to a server-side background job, decoded from
/// `{ "domainType": "background_job", "id": … }`. Lives only until the
/// job is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
}

/// Snapshot of a background job's state as reported by the status
/// endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    pub extensions: JobExtensions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobExtensions {
    /// Missing field means not active, matching the server's omission of
    /// `active` once a job is gone.
    #[serde(default)]
    pub active: bool,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        self.extensions.active
    }
}

/// Outcome of an action request, decoded exactly once at the response
/// boundary.
///
/// A response is `Deferred` if and only if its `domainType` equals
/// [`BACKGROUND_JOB_DOMAIN`]; any other shape, including a missing
/// `domainType`, is a `Direct` final payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action ran synchronously; this is the final payload.
    Direct(Value),
    /// The action was handed to a background job that must be polled to
    /// completion.
    Deferred(JobHandle),
}

impl ActionOutcome {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        if value.get("domainType").and_then(Value::as_str) != Some(BACKGROUND_JOB_DOMAIN) {
            return Ok(ActionOutcome::Direct(value));
        }
        let id = match value.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => {
                return Err(ApiError::Deserialization(
                    "background_job response without an id".to_string(),
                ))
            }
        };
        Ok(ActionOutcome::Deferred(JobHandle { id }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn background_job_tag_is_deferred() {
        let outcome =
            ActionOutcome::from_value(json!({"domainType": "background_job", "id": "job-42"}))
                .unwrap();
        assert_eq!(outcome, ActionOutcome::Deferred(JobHandle { id: "job-42".to_string() }));
    }

    #[test]
    fn other_domain_type_is_direct() {
        let value = json!({"domainType": "quick_setup", "stages": []});
        let outcome = ActionOutcome::from_value(value.clone()).unwrap();
        assert_eq!(outcome, ActionOutcome::Direct(value));
    }

    #[test]
    fn missing_domain_type_is_direct() {
        let value = json!({"status": "ok"});
        let outcome = ActionOutcome::from_value(value.clone()).unwrap();
        assert_eq!(outcome, ActionOutcome::Direct(value));
    }

    #[test]
    fn non_string_domain_type_is_direct() {
        let value = json!({"domainType": 7});
        let outcome = ActionOutcome::from_value(value.clone()).unwrap();
        assert_eq!(outcome, ActionOutcome::Direct(value));
    }

    #[test]
    fn numeric_job_id_is_stringified() {
        let outcome =
            ActionOutcome::from_value(json!({"domainType": "background_job", "id": 42})).unwrap();
        assert_eq!(outcome, ActionOutcome::Deferred(JobHandle { id: "42".to_string() }));
    }

    #[test]
    fn background_job_without_id_is_an_error() {
        let err = ActionOutcome::from_value(json!({"domainType": "background_job"})).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn job_status_reads_nested_active_flag() {
        let status: JobStatus =
            serde_json::from_value(json!({"extensions": {"active": true}})).unwrap();
        assert!(status.is_active());
    }

    #[test]
    fn job_status_missing_active_means_inactive() {
        let status: JobStatus = serde_json::from_value(json!({"extensions": {}})).unwrap();
        assert!(!status.is_active());
    }

    #[test]
    fn final_action_request_wraps_form_data() {
        let mut stage = StageData::new();
        stage.insert("host".to_string(), json!("example.com"));
        let request = FinalActionRequest::new("save", vec![stage]);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({"button_id": "save", "stages": [{"form_data": {"host": "example.com"}}]})
        );
    }

    #[test]
    fn stage_action_request_wraps_form_data() {
        let request = StageActionRequest::new("validate", vec![StageData::new(), StageData::new()]);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "stage_action_id": "validate",
                "stages": [{"form_data": {}}, {"form_data": {}}]
            })
        );
    }
}
