//! Submission request DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    constants::MAX_SOURCE_CODE_SIZE,
    handlers::common::PageQuery,
    models::{ExecutionStatus, Simulation, TestCaseResult},
    services::submission_service::{ExecutionReport, SubmissionQuery, SubmitCode},
    utils::validation::validate_language,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCodeRequest {
    pub challenge_id: Uuid,

    #[validate(length(min = 1, max = MAX_SOURCE_CODE_SIZE, message = "Code must be between 1 byte and 1 MiB"))]
    pub code: String,

    #[validate(custom(function = "validate_language"))]
    pub language: String,

    #[serde(default)]
    pub simulation: Simulation,

    pub started_at: Option<DateTime<Utc>>,
}

impl From<SubmitCodeRequest> for SubmitCode {
    fn from(req: SubmitCodeRequest) -> Self {
        Self {
            challenge_id: req.challenge_id,
            language: req.language,
            code: req.code,
            simulation: req.simulation,
            started_at: req.started_at,
        }
    }
}

/// Client-reported execution results. A `score` field, if sent, is ignored.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "passed_within_total"))]
pub struct ExecutionResultsRequest {
    pub status: ExecutionStatus,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub total_tests: i32,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub passed_tests: i32,

    /// Milliseconds
    #[validate(range(min = 0))]
    pub execution_time: Option<i64>,

    /// Kilobytes
    #[validate(range(min = 0))]
    pub memory_usage: Option<i64>,

    pub output: Option<String>,
    pub error: Option<String>,

    #[serde(default)]
    pub test_results: Vec<TestCaseResult>,

    pub browser_environment: Option<Value>,
}

fn passed_within_total(req: &ExecutionResultsRequest) -> Result<(), ValidationError> {
    if req.passed_tests > req.total_tests {
        let mut err = ValidationError::new("passed_tests");
        err.message = Some("passedTests cannot exceed totalTests".into());
        return Err(err);
    }
    Ok(())
}

impl From<ExecutionResultsRequest> for ExecutionReport {
    fn from(req: ExecutionResultsRequest) -> Self {
        Self {
            status: req.status,
            total_tests: req.total_tests,
            passed_tests: req.passed_tests,
            execution_time_ms: req.execution_time,
            memory_usage_kb: req.memory_usage,
            output: req.output,
            error: req.error,
            test_results: req.test_results,
            browser_environment: req.browser_environment,
        }
    }
}

/// `GET /submissions` query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubmissionsQuery {
    pub user_id: Option<Uuid>,
    pub challenge_id: Option<Uuid>,
    pub language: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListSubmissionsQuery {
    pub fn into_parts(self) -> (SubmissionQuery, PageQuery) {
        (
            SubmissionQuery {
                user_id: self.user_id,
                challenge_id: self.challenge_id,
                language: self.language,
                status: self.status,
            },
            PageQuery {
                page: self.page,
                limit: self.limit,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}
