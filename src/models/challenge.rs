//! Challenge model

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

/// Time limit in milliseconds, the unit execution times are reported in
pub fn time_limit_ms(minutes: i32) -> i64 {
    i64::from(minutes) * 60 * 1000
}

/// Challenge database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub challenge_type: String,
    pub difficulty: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub content: Json<ChallengeContent>,
    pub code: Json<ChallengeCode>,
    pub scenario: Json<Scenario>,
    pub time_limit_minutes: i32,

    // Aggregate stats
    pub total_attempts: i32,
    pub successful_attempts: i32,
    /// Successful attempts that reported an execution time
    pub timed_attempts: i32,
    pub average_time: f64,
    pub average_score: f64,
    pub popularity_score: f64,

    pub author_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    /// Share of attempts that succeeded, 0 when nobody tried yet
    pub fn completion_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.successful_attempts as f64 / self.total_attempts as f64
        }
    }

    /// Whether the viewer may see the solution and hidden test cases
    pub fn is_visible_in_full_to(&self, viewer_id: Option<Uuid>, is_admin: bool) -> bool {
        is_admin || viewer_id == Some(self.author_id)
    }
}

/// Problem statement and learning material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeContent {
    pub problem_statement: String,
    pub examples: Vec<ChallengeExample>,
    pub hints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeExample {
    pub input: String,
    pub output: String,
    pub explanation: Option<String>,
}

/// Starter code, test cases and validation rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeCode {
    /// Starter code keyed by language identifier
    pub starter_code: HashMap<String, String>,
    pub test_cases: Vec<ChallengeTestCase>,
    pub validation_rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeTestCase {
    pub input: String,
    pub expected_output: String,
    pub is_hidden: bool,
    pub weight: f64,
}

impl Default for ChallengeTestCase {
    fn default() -> Self {
        Self {
            input: String::new(),
            expected_output: String::new(),
            is_hidden: false,
            weight: 1.0,
        }
    }
}

/// Simulated workplace scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    pub context: Option<String>,
    pub distractions: Vec<String>,
    pub stakeholders: Vec<String>,
}

/// Fields needed to insert a challenge
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub challenge_type: String,
    pub difficulty: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub content: ChallengeContent,
    pub code: ChallengeCode,
    pub scenario: Scenario,
    pub time_limit_minutes: i32,
    pub author_id: Uuid,
}

/// Partial challenge update
#[derive(Debug, Clone, Default)]
pub struct ChallengeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub content: Option<ChallengeContent>,
    pub code: Option<ChallengeCode>,
    pub scenario: Option<Scenario>,
    pub time_limit_minutes: Option<i32>,
}

/// Challenge listing filters
#[derive(Debug, Clone, Default)]
pub struct ChallengeFilter {
    pub challenge_type: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Derive a URL slug from a title: lowercase, runs of other characters
/// collapsed into one hyphen, no leading or trailing hyphen.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
