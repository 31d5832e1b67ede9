//! High-level async client for the Quick Setup wizard API.
//!
//! # Design
//! `QuickSetupClient` glues the stateless [`QuickSetupApi`] builders to a
//! [`Transport`] and owns the one non-trivial behavior: when an action
//! response turns out to be a deferred background job, the call transparently
//! hands off to [`job::resolve`](crate::job) and suspends until the job's
//! final payload is available. The caller sees the same thing either way —
//! one `await`, one final payload.

use serde_json::Value;
use tracing::debug;

use crate::api::QuickSetupApi;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::job::{self, PollConfig};
use crate::types::{
    ActionOutcome, FinalActionRequest, GuidedResponse, OverviewResponse, StageActionRequest,
    StageData, StageStructure,
};

/// Async client for one Quick Setup server.
///
/// All operations return `Result` and propagate every failure to the
/// caller; there is no local recovery, retry, or suppression.
#[derive(Debug)]
pub struct QuickSetupClient<T> {
    transport: T,
    api: QuickSetupApi,
    poll: PollConfig,
}

impl<T: Transport> QuickSetupClient<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            transport,
            api: QuickSetupApi::new(base_url),
            poll: PollConfig::default(),
        }
    }

    /// Replace the default polling behavior (1s interval, unbounded wait).
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Retrieve all stage overviews together with the first stage's
    /// structure.
    pub async fn get_overview(
        &self,
        quick_setup_id: &str,
        object_id: Option<&str>,
    ) -> Result<GuidedResponse, ApiError> {
        let request = self.api.build_overview(quick_setup_id, object_id);
        let response = self.transport.execute(request).await?;
        self.api.parse_overview(response)
    }

    /// Retrieve the structure of every stage.
    pub async fn get_all_stages(
        &self,
        quick_setup_id: &str,
        object_id: Option<&str>,
    ) -> Result<OverviewResponse, ApiError> {
        let request = self.api.build_all_stages(quick_setup_id, object_id);
        let response = self.transport.execute(request).await?;
        self.api.parse_all_stages(response)
    }

    /// Retrieve the structure of a single stage.
    pub async fn get_stage_structure(
        &self,
        quick_setup_id: &str,
        stage_index: usize,
        object_id: Option<&str>,
    ) -> Result<StageStructure, ApiError> {
        let request = self.api.build_stage_structure(quick_setup_id, stage_index, object_id);
        let response = self.transport.execute(request).await?;
        self.api.parse_stage_structure(response)
    }

    /// Save a new quick setup configuration, waiting out a background job
    /// if the server runs the save asynchronously.
    pub async fn save(
        &self,
        quick_setup_id: &str,
        button_id: &str,
        form_data: Vec<StageData>,
    ) -> Result<Value, ApiError> {
        let body = FinalActionRequest::new(button_id, form_data);
        let request = self.api.build_save(quick_setup_id, &body)?;
        self.run_action(request).await
    }

    /// Save changes to an existing quick setup configuration.
    pub async fn edit(
        &self,
        quick_setup_id: &str,
        button_id: &str,
        form_data: Vec<StageData>,
        object_id: &str,
    ) -> Result<Value, ApiError> {
        let body = FinalActionRequest::new(button_id, form_data);
        let request = self.api.build_edit(quick_setup_id, &body, object_id)?;
        self.run_action(request).await
    }

    /// Execute a stage validation action and return the recap.
    pub async fn validate_and_recap(
        &self,
        quick_setup_id: &str,
        action_id: &str,
        form_data: Vec<StageData>,
        object_id: Option<&str>,
    ) -> Result<Value, ApiError> {
        let body = StageActionRequest::new(action_id, form_data);
        let request = self.api.build_stage_action(quick_setup_id, &body, object_id)?;
        self.run_action(request).await
    }

    /// Issue an action request and resolve its outcome: a direct payload is
    /// returned as-is, a deferred job is polled to completion.
    async fn run_action(&self, request: HttpRequest) -> Result<Value, ApiError> {
        let response = self.transport.execute(request).await?;
        match self.api.parse_action_response(response)? {
            ActionOutcome::Direct(value) => Ok(value),
            ActionOutcome::Deferred(handle) => {
                debug!(job_id = %handle.id, "action deferred to background job");
                job::resolve(&self.transport, &self.api, &handle.id, &self.poll).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpResponse};

    /// Scripted transport: pops pre-canned responses in order and records
    /// every request it saw.
    struct ScriptedTransport {
        responses: Mutex<Vec<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<HttpResponse, TransportError>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn paths(&self) -> Vec<String> {
            self.requests.lock().unwrap().iter().map(|r| r.path.clone()).collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError("script exhausted".to_string())))
        }
    }

    fn ok(body: serde_json::Value) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn job_handle(id: &str) -> Result<HttpResponse, TransportError> {
        ok(json!({"domainType": "background_job", "id": id}))
    }

    fn job_status(active: bool) -> Result<HttpResponse, TransportError> {
        ok(json!({"domainType": "background_job", "extensions": {"active": active}}))
    }

    fn client(transport: ScriptedTransport) -> QuickSetupClient<ScriptedTransport> {
        QuickSetupClient::new("http://test", transport).with_poll_config(PollConfig {
            interval: Duration::from_secs(1),
            timeout: None,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_save_polls_to_completion() {
        let transport = ScriptedTransport::new(vec![
            job_handle("job-42"),
            job_status(true),
            job_status(true),
            job_status(false),
            ok(json!({"status": "ok", "redirect_url": "/view"})),
        ]);
        let client = client(transport);

        let started = tokio::time::Instant::now();
        let value = client.save("aws", "save", vec![StageData::new()]).await.unwrap();
        assert_eq!(value, json!({"status": "ok", "redirect_url": "/view"}));

        // Two active polls means exactly two interval waits.
        assert_eq!(started.elapsed(), Duration::from_secs(2));

        let paths = client.transport.paths();
        assert_eq!(paths.len(), 5);
        assert!(paths[0].ends_with("/actions/save/invoke"));
        for poll in &paths[1..4] {
            assert!(poll.ends_with("/background_job/job-42"), "unexpected poll url {poll}");
        }
        assert!(paths[4].ends_with("/background_job/job-42/result"));
    }

    #[tokio::test(start_paused = true)]
    async fn immediately_finished_job_never_waits() {
        let transport = ScriptedTransport::new(vec![
            job_handle("job-1"),
            job_status(false),
            ok(json!({"status": "ok"})),
        ]);
        let client = client(transport);

        let started = tokio::time::Instant::now();
        client.save("aws", "save", Vec::new()).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn direct_response_skips_the_resolver() {
        let recap = json!({"domainType": "quick_setup", "stage_recap": ["looks good"]});
        let transport = ScriptedTransport::new(vec![ok(recap.clone())]);
        let client = client(transport);

        let value = client.validate_and_recap("aws", "validate", Vec::new(), None).await.unwrap();
        assert_eq!(value, recap);
        assert_eq!(client.transport.paths().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn job_exception_rejects_the_call() {
        let transport = ScriptedTransport::new(vec![
            job_handle("job-9"),
            job_status(false),
            ok(json!({"background_job_exception": "ValidationError: field X required"})),
        ]);
        let client = client(transport);

        let err = client.save("aws", "save", Vec::new()).await.unwrap_err();
        assert!(
            matches!(err, ApiError::JobFailed(ref m) if m == "ValidationError: field X required"),
            "got {err:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_mid_poll_aborts_immediately() {
        let transport = ScriptedTransport::new(vec![
            job_handle("job-5"),
            job_status(true),
            Err(TransportError("connection reset".to_string())),
        ]);
        let client = client(transport);

        let err = client.save("aws", "save", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        // Initial call, one poll, the failed poll — and nothing after.
        assert_eq!(client.transport.paths().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn optional_timeout_bounds_the_wait() {
        // Status never goes inactive; the script keeps answering active.
        let transport = ScriptedTransport::new(
            std::iter::once(job_handle("job-3"))
                .chain(std::iter::repeat_with(|| job_status(true)).take(100))
                .collect(),
        );
        let client = QuickSetupClient::new("http://test", transport).with_poll_config(PollConfig {
            interval: Duration::from_secs(1),
            timeout: Some(Duration::from_secs(5)),
        });

        let err = client.save("aws", "save", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::JobTimeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn overview_request_and_parse_round_trip() {
        let transport = ScriptedTransport::new(vec![ok(json!({
            "quick_setup_id": "aws",
            "overviews": [{"title": "Prepare"}, {"title": "Review", "sub_title": "Check"}],
            "stage": {"components": [{"widget_type": "text"}], "actions": []}
        }))]);
        let client = client(transport);

        let overview = client.get_overview("aws", Some("site-1")).await.unwrap();
        assert_eq!(overview.quick_setup_id, "aws");
        assert_eq!(overview.overviews.len(), 2);
        assert_eq!(overview.stage.components.len(), 1);

        let paths = client.transport.paths();
        assert!(paths[0].ends_with("/quick_setup/aws?object_id=site-1"));
        let requests = client.transport.requests.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Get);
    }
}
