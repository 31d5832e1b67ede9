//! Stateless HTTP request builder and response parser for the Quick Setup
//! REST API.
//!
//! # Design
//! `QuickSetupApi` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`; the caller (normally [`QuickSetupClient`]) executes the
//! round-trip in between, keeping this layer deterministic and free of I/O.
//!
//! [`QuickSetupClient`]: crate::QuickSetupClient

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    ActionOutcome, FinalActionRequest, GuidedResponse, JobStatus, OverviewResponse,
    StageActionRequest, StageStructure,
};

// Endpoint templates, with the same placeholder convention the server's own
// docs use.
const QUICK_SETUP_URL: &str = "/api/v1/objects/quick_setup/{QUICK_SETUP_ID}";
const STAGE_STRUCTURE_URL: &str =
    "/api/v1/objects/quick_setup/{QUICK_SETUP_ID}/quick_setup_stage/{STAGE_INDEX}";
const SAVE_URL: &str = "/api/v1/objects/quick_setup/{QUICK_SETUP_ID}/actions/save/invoke";
const EDIT_URL: &str = "/api/v1/objects/quick_setup/{QUICK_SETUP_ID}/actions/edit/invoke";
const STAGE_ACTION_URL: &str =
    "/api/v1/objects/quick_setup/{QUICK_SETUP_ID}/actions/run-stage-action/invoke";
const JOB_STATUS_URL: &str = "/api/v1/objects/background_job/{JOB_ID}";
const JOB_RESULT_URL: &str = "/api/v1/objects/background_job/{JOB_ID}/result";

/// Stateless builder/parser pair for every Quick Setup endpoint.
#[derive(Debug, Clone)]
pub struct QuickSetupApi {
    base_url: String,
}

impl QuickSetupApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, template: &str, substitutions: &[(&str, &str)], query: &[(&str, &str)]) -> String {
        let mut path = template.to_string();
        for (placeholder, value) in substitutions {
            path = path.replace(placeholder, value);
        }
        let mut url = format!("{}{}", self.base_url, path);
        for (i, (key, value)) in query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            url.push(sep);
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }

    fn get(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: url,
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<B: serde::Serialize>(
        &self,
        method: HttpMethod,
        url: String,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: url,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_overview(&self, quick_setup_id: &str, object_id: Option<&str>) -> HttpRequest {
        let mut query = Vec::new();
        if let Some(object_id) = object_id {
            query.push(("object_id", object_id));
        }
        self.get(self.url(QUICK_SETUP_URL, &[("{QUICK_SETUP_ID}", quick_setup_id)], &query))
    }

    pub fn build_all_stages(&self, quick_setup_id: &str, object_id: Option<&str>) -> HttpRequest {
        let mut query = vec![("mode", "overview")];
        if let Some(object_id) = object_id {
            query.push(("object_id", object_id));
        }
        self.get(self.url(QUICK_SETUP_URL, &[("{QUICK_SETUP_ID}", quick_setup_id)], &query))
    }

    pub fn build_stage_structure(
        &self,
        quick_setup_id: &str,
        stage_index: usize,
        object_id: Option<&str>,
    ) -> HttpRequest {
        let index = stage_index.to_string();
        let mut query = Vec::new();
        if let Some(object_id) = object_id {
            query.push(("object_id", object_id));
        }
        self.get(self.url(
            STAGE_STRUCTURE_URL,
            &[("{QUICK_SETUP_ID}", quick_setup_id), ("{STAGE_INDEX}", &index)],
            &query,
        ))
    }

    pub fn build_save(
        &self,
        quick_setup_id: &str,
        request: &FinalActionRequest,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.url(SAVE_URL, &[("{QUICK_SETUP_ID}", quick_setup_id)], &[]);
        self.json_request(HttpMethod::Post, url, request)
    }

    pub fn build_edit(
        &self,
        quick_setup_id: &str,
        request: &FinalActionRequest,
        object_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.url(
            EDIT_URL,
            &[("{QUICK_SETUP_ID}", quick_setup_id)],
            &[("object_id", object_id)],
        );
        self.json_request(HttpMethod::Put, url, request)
    }

    pub fn build_stage_action(
        &self,
        quick_setup_id: &str,
        request: &StageActionRequest,
        object_id: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let mut query = Vec::new();
        if let Some(object_id) = object_id {
            query.push(("object_id", object_id));
        }
        let url = self.url(STAGE_ACTION_URL, &[("{QUICK_SETUP_ID}", quick_setup_id)], &query);
        self.json_request(HttpMethod::Post, url, request)
    }

    pub fn build_job_status(&self, job_id: &str) -> HttpRequest {
        self.get(self.url(JOB_STATUS_URL, &[("{JOB_ID}", job_id)], &[]))
    }

    pub fn build_job_result(&self, job_id: &str) -> HttpRequest {
        self.get(self.url(JOB_RESULT_URL, &[("{JOB_ID}", job_id)], &[]))
    }

    pub fn parse_overview(&self, response: HttpResponse) -> Result<GuidedResponse, ApiError> {
        check_success(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_all_stages(&self, response: HttpResponse) -> Result<OverviewResponse, ApiError> {
        check_success(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_stage_structure(&self, response: HttpResponse) -> Result<StageStructure, ApiError> {
        check_success(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Decode an action response into its direct-or-deferred outcome.
    pub fn parse_action_response(&self, response: HttpResponse) -> Result<ActionOutcome, ApiError> {
        check_success(&response)?;
        let value: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        ActionOutcome::from_value(value)
    }

    pub fn parse_job_status(&self, response: HttpResponse) -> Result<JobStatus, ApiError> {
        check_success(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Interpret a background job result.
    ///
    /// A non-empty `background_job_exception` field marks the job as failed
    /// no matter what the HTTP status says, so it is checked before the
    /// status code. Otherwise the payload is returned verbatim.
    pub fn parse_job_result(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let value: Value = match serde_json::from_str(&response.body) {
            Ok(value) => value,
            Err(e) => {
                check_success(&response)?;
                return Err(ApiError::Deserialization(e.to_string()));
            }
        };
        if let Some(exception) = value.get("background_job_exception").and_then(Value::as_str) {
            if !exception.is_empty() {
                return Err(ApiError::JobFailed(exception.to_string()));
            }
        }
        check_success(&response)?;
        Ok(value)
    }
}

/// Map non-2xx status codes to `ApiError::Http`.
fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
