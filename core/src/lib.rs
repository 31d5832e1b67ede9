//! Async client for the Quick Setup wizard REST API.
//!
//! # Overview
//! Quick Setup is a multi-stage guided configuration wizard. This crate
//! fetches stage definitions, submits form data for validation and recap,
//! and persists final configurations. Actions the server chooses to run
//! asynchronously come back as a background-job handle; the client owns
//! polling that job to completion and unwrapping the eventual result or
//! error, so every call looks synchronous to its caller.
//!
//! # Design
//! - [`QuickSetupApi`] builds `HttpRequest` values and parses
//!   `HttpResponse` values without touching the network.
//! - I/O goes through the [`Transport`] trait; the crate links no HTTP
//!   stack of its own.
//! - [`JobPoller`] is the background-job protocol as a sans-IO state
//!   machine; [`QuickSetupClient`] drives it with real sleeps between
//!   polls.
//! - A job result carrying a `background_job_exception` field fails with
//!   [`ApiError::JobFailed`] regardless of HTTP status.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod job;
pub mod types;

pub use api::QuickSetupApi;
pub use client::QuickSetupClient;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use job::{JobPoller, PollConfig, PollState, Step, DEFAULT_POLL_INTERVAL};
pub use types::{
    ActionOutcome, FinalActionRequest, GuidedResponse, JobHandle, JobStatus, OverviewResponse,
    StageActionRequest, StageData, StageEntry, StageOverview, StageStructure,
};
