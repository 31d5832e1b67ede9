//! In-memory Quick Setup server for integration tests.
//!
//! Serves one demo quick setup (`aws_quick_setup`) with three stages.
//! Action endpoints look at the submitted button/action id: ids starting
//! with `async` are answered with a background-job handle whose status
//! must be polled, everything else is answered synchronously. Job
//! completion is deterministic rather than timed — each status read
//! consumes one "remaining poll", so tests control exactly how many
//! `active: true` responses a client sees.
//!
//! Special ids: `async_fail` (and `async_fail_*`) produce a job whose
//! result carries `background_job_exception`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// The only quick setup this server knows.
pub const QUICK_SETUP_ID: &str = "aws_quick_setup";

/// Number of `active: true` status responses a fresh job hands out before
/// reporting inactive.
pub const JOB_POLLS_UNTIL_DONE: u32 = 2;

#[derive(Debug)]
struct Job {
    remaining_polls: u32,
    result: Value,
}

#[derive(Default)]
pub struct AppState {
    jobs: RwLock<HashMap<String, Job>>,
}

pub type SharedState = Arc<AppState>;

pub fn app() -> Router {
    let state: SharedState = Arc::new(AppState::default());
    Router::new()
        .route("/api/v1/objects/quick_setup/{id}", get(get_quick_setup))
        .route(
            "/api/v1/objects/quick_setup/{id}/quick_setup_stage/{index}",
            get(get_stage_structure),
        )
        .route(
            "/api/v1/objects/quick_setup/{id}/actions/save/invoke",
            post(save_quick_setup),
        )
        .route(
            "/api/v1/objects/quick_setup/{id}/actions/edit/invoke",
            put(edit_quick_setup),
        )
        .route(
            "/api/v1/objects/quick_setup/{id}/actions/run-stage-action/invoke",
            post(run_stage_action),
        )
        .route("/api/v1/objects/background_job/{id}", get(job_status))
        .route("/api/v1/objects/background_job/{id}/result", get(job_result))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Deserialize)]
struct QuickSetupQuery {
    mode: Option<String>,
    #[allow(dead_code)]
    object_id: Option<String>,
}

#[derive(Deserialize)]
struct FinalActionBody {
    button_id: String,
    #[serde(default)]
    stages: Vec<Value>,
}

#[derive(Deserialize)]
struct StageActionBody {
    stage_action_id: String,
    #[serde(default)]
    stages: Vec<Value>,
}

fn stage_overviews() -> Value {
    json!([
        {"title": "Prepare AWS for Checkmk"},
        {"title": "Configure host and regions", "sub_title": "Select what to monitor"},
        {"title": "Review and test configuration"}
    ])
}

fn stage_structure(index: usize) -> Value {
    json!({
        "components": [
            {"widget_type": "text", "id": format!("stage-{index}-form")}
        ],
        "actions": [
            {"id": "validate", "button": {"label": "Next"}}
        ]
    })
}

async fn get_quick_setup(
    Path(id): Path<String>,
    Query(query): Query<QuickSetupQuery>,
) -> Result<Json<Value>, StatusCode> {
    if id != QUICK_SETUP_ID {
        return Err(StatusCode::NOT_FOUND);
    }
    let body = if query.mode.as_deref() == Some("overview") {
        json!({
            "quick_setup_id": QUICK_SETUP_ID,
            "overviews": stage_overviews(),
            "stages": [stage_structure(0), stage_structure(1), stage_structure(2)]
        })
    } else {
        json!({
            "quick_setup_id": QUICK_SETUP_ID,
            "overviews": stage_overviews(),
            "stage": stage_structure(0),
            "actions": [{"id": "save", "button": {"label": "Save"}}]
        })
    };
    Ok(Json(body))
}

async fn get_stage_structure(
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<Value>, StatusCode> {
    if id != QUICK_SETUP_ID || index > 2 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(stage_structure(index)))
}

/// Register a background job and answer with its handle.
async fn defer(state: &SharedState, result: Value) -> Json<Value> {
    let job_id = Uuid::new_v4().to_string();
    state.jobs.write().await.insert(
        job_id.clone(),
        Job {
            remaining_polls: JOB_POLLS_UNTIL_DONE,
            result,
        },
    );
    tracing::debug!(%job_id, "spawned background job");
    Json(json!({"domainType": "background_job", "id": job_id}))
}

fn job_outcome(action_id: &str, result: Value) -> Value {
    if action_id.starts_with("async_fail") {
        json!({"background_job_exception": format!("ValidationError: action {action_id} rejected")})
    } else {
        result
    }
}

async fn final_action(
    state: SharedState,
    id: String,
    body: FinalActionBody,
) -> Result<Json<Value>, StatusCode> {
    if id != QUICK_SETUP_ID {
        return Err(StatusCode::NOT_FOUND);
    }
    let complete = json!({
        "redirect_url": format!("/view/{QUICK_SETUP_ID}"),
        "all_stage_errors": [],
        "stages_submitted": body.stages.len()
    });
    if body.button_id.starts_with("async") {
        Ok(defer(&state, job_outcome(&body.button_id, complete)).await)
    } else {
        Ok(Json(complete))
    }
}

async fn save_quick_setup(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<FinalActionBody>,
) -> Result<Json<Value>, StatusCode> {
    final_action(state, id, body).await
}

async fn edit_quick_setup(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<FinalActionBody>,
) -> Result<Json<Value>, StatusCode> {
    final_action(state, id, body).await
}

async fn run_stage_action(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<StageActionBody>,
) -> Result<Json<Value>, StatusCode> {
    if id != QUICK_SETUP_ID {
        return Err(StatusCode::NOT_FOUND);
    }
    let recap = json!({
        "domainType": "quick_setup",
        "stage_recap": [{"widget_type": "text", "text": "Connection OK"}],
        "validation_errors": null,
        "stages_submitted": body.stages.len()
    });
    if body.stage_action_id.starts_with("async") {
        Ok(defer(&state, job_outcome(&body.stage_action_id, recap)).await)
    } else {
        Ok(Json(recap))
    }
}

/// Each status read consumes one remaining poll; the job reports inactive
/// once they are used up.
async fn job_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let mut jobs = state.jobs.write().await;
    let job = jobs.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let active = job.remaining_polls > 0;
    if active {
        job.remaining_polls -= 1;
    }
    Ok(Json(json!({
        "domainType": "background_job",
        "id": id,
        "extensions": {"active": active}
    })))
}

async fn job_result(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let jobs = state.jobs.read().await;
    let job = jobs.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(job.result.clone()))
}
