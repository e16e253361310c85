//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::constants::statuses;

/// Submission database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub language: String,
    pub code: String,

    // Execution block
    pub status: String,
    pub score: i32,
    pub total_tests: i32,
    pub passed_tests: i32,
    pub execution_time_ms: Option<i64>,
    pub memory_usage_kb: Option<i64>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub test_results: Json<Vec<TestCaseResult>>,
    pub browser_environment: Option<Json<serde_json::Value>>,

    pub simulation: Json<Simulation>,

    // Metadata block
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub is_completed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn execution_status(&self) -> Option<ExecutionStatus> {
        ExecutionStatus::from_str(&self.status)
    }

    pub fn is_pending(&self) -> bool {
        self.status == statuses::PENDING
    }
}

/// Execution status. `Pending` moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Completed,
    Failed,
    Timeout,
}

impl ExecutionStatus {
    /// Get status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => statuses::PENDING,
            Self::Completed => statuses::COMPLETED,
            Self::Failed => statuses::FAILED,
            Self::Timeout => statuses::TIMEOUT,
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            statuses::PENDING => Some(Self::Pending),
            statuses::COMPLETED => Some(Self::Completed),
            statuses::FAILED => Some(Self::Failed),
            statuses::TIMEOUT => Some(Self::Timeout),
            _ => None,
        }
    }

    /// Check if this is a final status (no further transitions)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a single test case as reported by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCaseResult {
    pub input: Option<String>,
    pub expected_output: Option<String>,
    pub actual_output: Option<String>,
    pub passed: bool,
    pub execution_time: Option<i64>,
    pub error: Option<String>,
}

/// Workplace-pressure context the attempt was made under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Simulation {
    pub mode: String,
    pub distraction_level: i32,
    pub focus_score: Option<i32>,
    pub stress_level: Option<i32>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            mode: "practice".to_string(),
            distraction_level: 0,
            focus_score: None,
            stress_level: None,
        }
    }
}

/// Fields needed to insert a pending submission
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub language: String,
    pub code: String,
    pub simulation: Simulation,
    pub started_at: DateTime<Utc>,
}

/// Terminal execution block written once by the scoring pipeline
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    pub score: i32,
    pub total_tests: i32,
    pub passed_tests: i32,
    pub execution_time_ms: Option<i64>,
    pub memory_usage_kb: Option<i64>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub test_results: Vec<TestCaseResult>,
    pub browser_environment: Option<serde_json::Value>,
    pub submitted_at: DateTime<Utc>,
}

/// Submission listing filters
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub user_id: Option<Uuid>,
    pub challenge_id: Option<Uuid>,
    pub language: Option<String>,
    pub status: Option<String>,
}
