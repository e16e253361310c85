//! Unlock rules evaluated after a successful submission.
//!
//! Each rule pairs a condition over [`UnlockContext`] with the catalog entry it
//! unlocks. Conditions are plain predicates so the battery can be built and
//! tested without a store.

use std::sync::Arc;

use crate::{
    constants::{achievements, criteria_types, languages, scoring},
    models::{ExecutionStatus, Submission},
};

/// Facts about a user right after one of their submissions was graded
#[derive(Debug, Clone)]
pub struct UnlockContext {
    pub status: Option<ExecutionStatus>,
    pub score: i32,
    pub language: String,
    pub execution_time_ms: Option<i64>,
    /// Completed submissions of the user, this one included
    pub completed_count: i64,
    /// Completed submissions of the user in `language`, this one included
    pub language_count: i64,
    pub streak: i32,
}

impl UnlockContext {
    pub fn new(submission: &Submission, completed_count: i64, language_count: i64, streak: i32) -> Self {
        Self {
            status: submission.execution_status(),
            score: submission.score,
            language: submission.language.clone(),
            execution_time_ms: submission.execution_time_ms,
            completed_count,
            language_count,
            streak,
        }
    }

    fn is_completed(&self) -> bool {
        self.status == Some(ExecutionStatus::Completed)
    }
}

/// A predicate over the unlock context
pub trait Condition: Send + Sync {
    fn is_satisfied_by(&self, ctx: &UnlockContext) -> bool;
}

pub type BoxedCondition = Arc<dyn Condition>;

/// How a rule finds its achievement in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogKey {
    Name(String),
    Criteria { criteria_type: &'static str, target: i64 },
}

/// One entry of the rule battery
#[derive(Clone)]
pub struct UnlockRule {
    pub label: &'static str,
    pub condition: BoxedCondition,
    pub key: CatalogKey,
}

impl UnlockRule {
    fn new(label: &'static str, condition: impl Condition + 'static, key: CatalogKey) -> Self {
        Self {
            label,
            condition: Arc::new(condition),
            key,
        }
    }
}

/// At least `n` completed submissions
pub struct CompletedAtLeast(pub i64);

impl Condition for CompletedAtLeast {
    fn is_satisfied_by(&self, ctx: &UnlockContext) -> bool {
        ctx.completed_count >= self.0
    }
}

/// The graded score is the maximum
pub struct PerfectScore;

impl Condition for PerfectScore {
    fn is_satisfied_by(&self, ctx: &UnlockContext) -> bool {
        ctx.score == scoring::MAX_SCORE
    }
}

/// The current streak reached `n` days
pub struct StreakAtLeast(pub i64);

impl Condition for StreakAtLeast {
    fn is_satisfied_by(&self, ctx: &UnlockContext) -> bool {
        i64::from(ctx.streak) >= self.0
    }
}

/// At least `n` completed submissions in the submission's language
pub struct LanguageCountAtLeast(pub i64);

impl Condition for LanguageCountAtLeast {
    fn is_satisfied_by(&self, ctx: &UnlockContext) -> bool {
        ctx.language_count >= self.0
    }
}

/// A completed run faster than `ms`
pub struct FasterThan(pub i64);

impl Condition for FasterThan {
    fn is_satisfied_by(&self, ctx: &UnlockContext) -> bool {
        ctx.is_completed() && ctx.execution_time_ms.is_some_and(|t| t < self.0)
    }
}

/// Name of the mastery achievement for a language, e.g. "Python Master"
pub fn language_master_name(language: &str) -> String {
    format!(
        "{} {}",
        languages::display_name(language),
        achievements::LANGUAGE_MASTER_SUFFIX
    )
}

/// The fixed battery of submission rules for a context
pub fn submission_rules(ctx: &UnlockContext) -> Vec<UnlockRule> {
    let mut rules = vec![UnlockRule::new(
        "first_completion",
        CompletedAtLeast(1),
        CatalogKey::Name(achievements::FIRST_STEPS.to_string()),
    )];

    rules.extend(achievements::CHALLENGE_MILESTONES.iter().map(|&target| {
        UnlockRule::new(
            "challenge_milestone",
            CompletedAtLeast(target),
            CatalogKey::Criteria {
                criteria_type: criteria_types::CHALLENGE_COUNT,
                target,
            },
        )
    }));

    rules.push(UnlockRule::new(
        "perfect_score",
        PerfectScore,
        CatalogKey::Name(achievements::PERFECT_SCORE.to_string()),
    ));

    rules.extend(achievements::STREAK_MILESTONES.iter().map(|&target| {
        UnlockRule::new(
            "streak_milestone",
            StreakAtLeast(target),
            CatalogKey::Criteria {
                criteria_type: criteria_types::STREAK,
                target,
            },
        )
    }));

    rules.push(UnlockRule::new(
        "language_mastery",
        LanguageCountAtLeast(achievements::LANGUAGE_MASTERY_COUNT),
        CatalogKey::Name(language_master_name(&ctx.language)),
    ));

    rules.push(UnlockRule::new(
        "speed",
        FasterThan(achievements::SPEED_DEMON_MS),
        CatalogKey::Name(achievements::SPEED_DEMON.to_string()),
    ));

    rules
}

/// Rules of the battery whose condition holds
pub fn satisfied_rules(ctx: &UnlockContext) -> Vec<UnlockRule> {
    submission_rules(ctx)
        .into_iter()
        .filter(|rule| rule.condition.is_satisfied_by(ctx))
        .collect()
}
