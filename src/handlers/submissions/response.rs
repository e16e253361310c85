//! Submission response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    handlers::achievements::AchievementResponse,
    models::{Simulation, Submission, TestCaseResult},
    services::submission_service::GradedSubmission,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub language: String,
    pub code: String,
    pub execution: ExecutionResponse,
    pub simulation: Simulation,
    pub metadata: MetadataResponse,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub status: String,
    pub score: i32,
    pub total_tests: i32,
    pub passed_tests: i32,
    pub execution_time: Option<i64>,
    pub memory_usage: Option<i64>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub test_results: Vec<TestCaseResult>,
    pub browser_environment: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            challenge_id: s.challenge_id,
            language: s.language,
            code: s.code,
            execution: ExecutionResponse {
                status: s.status,
                score: s.score,
                total_tests: s.total_tests,
                passed_tests: s.passed_tests,
                execution_time: s.execution_time_ms,
                memory_usage: s.memory_usage_kb,
                output: s.output,
                error: s.error,
                test_results: s.test_results.0,
                browser_environment: s.browser_environment.map(|b| b.0),
            },
            simulation: s.simulation.0,
            metadata: MetadataResponse {
                started_at: s.started_at,
                submitted_at: s.submitted_at,
                is_completed: s.is_completed,
            },
            created_at: s.created_at,
        }
    }
}

/// Result of grading: the submission plus what it earned
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedSubmissionResponse {
    pub submission: SubmissionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_awarded: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    pub leveled_up: bool,
    pub achievements: Vec<AchievementResponse>,
}

impl From<GradedSubmission> for GradedSubmissionResponse {
    fn from(graded: GradedSubmission) -> Self {
        Self {
            submission: graded.submission.into(),
            xp_awarded: graded.xp.map(|xp| xp.awarded),
            level: graded.xp.map(|xp| xp.level),
            leveled_up: graded.xp.is_some_and(|xp| xp.leveled_up()),
            achievements: graded.achievements.into_iter().map(Into::into).collect(),
        }
    }
}
