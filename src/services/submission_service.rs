//! Submission service
//!
//! Creates pending submissions and grades them from client-reported
//! execution results. Grading writes the terminal execution block first, then
//! runs the success side effects (counters, XP, streak, achievements) on a
//! best-effort basis.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    constants::{languages, DEFAULT_RECENT_SUBMISSIONS, MAX_RECENT_SUBMISSIONS},
    db::repositories::{ChallengeRepository, SubmissionRepository, UserRepository},
    error::{AppError, AppResult, FieldError},
    models::{
        time_limit_ms, Achievement, ExecutionOutcome, ExecutionStatus, NewSubmission, Simulation,
        Submission, SubmissionFilter, TestCaseResult, XpAward,
    },
    services::{scoring, AchievementService, BestEffort, Requester, UserService},
};

/// A new attempt at a challenge
#[derive(Debug, Clone)]
pub struct SubmitCode {
    pub challenge_id: Uuid,
    pub language: String,
    pub code: String,
    pub simulation: Simulation,
    pub started_at: Option<DateTime<Utc>>,
}

/// Execution results as reported by the client. Any score the client
/// computed itself is not part of this and is never trusted.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub status: ExecutionStatus,
    pub total_tests: i32,
    pub passed_tests: i32,
    pub execution_time_ms: Option<i64>,
    pub memory_usage_kb: Option<i64>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub test_results: Vec<TestCaseResult>,
    pub browser_environment: Option<Value>,
}

/// A graded submission and what grading earned
#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub submission: Submission,
    pub xp: Option<XpAward>,
    pub achievements: Vec<Achievement>,
}

/// Submission listing query
#[derive(Debug, Clone, Default)]
pub struct SubmissionQuery {
    pub user_id: Option<Uuid>,
    pub challenge_id: Option<Uuid>,
    pub language: Option<String>,
    pub status: Option<String>,
}

/// Submission lifecycle and grading
pub struct SubmissionService {
    submissions: Arc<dyn SubmissionRepository>,
    challenges: Arc<dyn ChallengeRepository>,
    user_store: Arc<dyn UserRepository>,
    users: Arc<UserService>,
    achievements: Arc<AchievementService>,
}

impl SubmissionService {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        challenges: Arc<dyn ChallengeRepository>,
        user_store: Arc<dyn UserRepository>,
        users: Arc<UserService>,
        achievements: Arc<AchievementService>,
    ) -> Self {
        Self {
            submissions,
            challenges,
            user_store,
            users,
            achievements,
        }
    }

    /// Record a pending attempt. The attempt counts towards the user's and
    /// the challenge's totals before it is graded.
    ///
    /// The pending row is written first and is the result. The two counters
    /// follow as best-effort updates, so a counter failure never reports an
    /// error for a submission that was stored.
    pub async fn submit_code(&self, user_id: Uuid, request: SubmitCode) -> AppResult<Submission> {
        if !languages::ALL.contains(&request.language.as_str()) {
            return Err(AppError::Validation(vec![FieldError {
                field: "language".to_string(),
                message: format!("Unsupported language: {}", request.language),
            }]));
        }

        self.users.get_user(user_id).await?;
        let challenge = self
            .challenges
            .find_by_id(request.challenge_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

        let submission = self
            .submissions
            .create(NewSubmission {
                user_id,
                challenge_id: challenge.id,
                language: request.language,
                code: request.code,
                simulation: request.simulation,
                started_at: request.started_at.unwrap_or_else(Utc::now),
            })
            .await?;

        self.challenges
            .increment_attempts(challenge.id)
            .await
            .best_effort("challenge attempt counter");
        self.user_store
            .increment_total_challenges(user_id)
            .await
            .best_effort("user attempt counter");

        tracing::info!(
            submission_id = %submission.id,
            user_id = %user_id,
            challenge_id = %challenge.id,
            language = %submission.language,
            "Submission created"
        );

        Ok(submission)
    }

    /// Grade a pending submission from its reported execution results.
    ///
    /// Fails only on lookup, ownership or state errors. Once the execution
    /// block is stored, side-effect failures are logged and grading succeeds.
    pub async fn process_execution_results(
        &self,
        submission_id: Uuid,
        requester_id: Uuid,
        report: ExecutionReport,
    ) -> AppResult<GradedSubmission> {
        let submission = self.find(submission_id).await?;

        if submission.user_id != requester_id {
            return Err(AppError::Forbidden(
                "Cannot report results for another user's submission".to_string(),
            ));
        }
        if !submission.is_pending() {
            return Err(AppError::Conflict("Submission has already been graded".to_string()));
        }
        if !report.status.is_terminal() {
            return Err(AppError::InvalidInput(
                "Reported status must be completed, failed or timeout".to_string(),
            ));
        }

        // a challenge deactivated while the submission was pending still grades against its limit
        let time_limit_ms = match self.challenges.find_time_limit(submission.challenge_id).await? {
            Some(minutes) => time_limit_ms(minutes),
            None => {
                tracing::debug!(challenge_id = %submission.challenge_id, "Challenge gone, grading without time limit");
                0
            }
        };

        let score = scoring::compute_score(
            report.status,
            report.total_tests,
            report.passed_tests,
            report.execution_time_ms,
            time_limit_ms,
        );

        let outcome = ExecutionOutcome {
            status: report.status,
            score,
            total_tests: report.total_tests.max(0),
            passed_tests: report.passed_tests.clamp(0, report.total_tests.max(0)),
            execution_time_ms: report.execution_time_ms,
            memory_usage_kb: report.memory_usage_kb,
            output: report.output,
            error: report.error,
            test_results: report.test_results,
            browser_environment: report.browser_environment,
            submitted_at: Utc::now(),
        };

        let submission = self
            .submissions
            .complete(submission_id, outcome)
            .await?
            .ok_or_else(|| AppError::Conflict("Submission has already been graded".to_string()))?;

        tracing::info!(
            submission_id = %submission.id,
            user_id = %submission.user_id,
            status = %report.status,
            score,
            "Submission graded"
        );

        if !scoring::is_success(report.status, score) {
            return Ok(GradedSubmission {
                submission,
                xp: None,
                achievements: Vec::new(),
            });
        }

        let (xp, achievements) = self.apply_success(&submission).await;

        Ok(GradedSubmission {
            submission,
            xp,
            achievements,
        })
    }

    /// Success side effects. Nothing here can fail the grading.
    async fn apply_success(&self, submission: &Submission) -> (Option<XpAward>, Vec<Achievement>) {
        let user_id = submission.user_id;

        self.user_store
            .increment_completed_challenges(user_id)
            .await
            .best_effort("completed challenge counter");
        self.challenges
            .record_success(
                submission.challenge_id,
                submission.execution_time_ms,
                submission.score,
            )
            .await
            .best_effort("challenge success stats");

        let (award, mut achievements) = self
            .achievements
            .award_xp(user_id, scoring::xp_for_score(submission.score))
            .await;

        self.users
            .update_streak(user_id, Utc::now())
            .await
            .best_effort("streak update");

        achievements.extend(
            self.achievements
                .check_submission_achievements(user_id, submission)
                .await,
        );

        (award, achievements)
    }

    async fn find(&self, id: Uuid) -> AppResult<Submission> {
        self.submissions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }

    /// Get a submission visible to the requester (owner or admin)
    pub async fn get(&self, id: Uuid, requester: Requester) -> AppResult<Submission> {
        let submission = self.find(id).await?;
        if submission.user_id != requester.id && !requester.is_admin {
            return Err(AppError::Forbidden("Cannot view another user's submission".to_string()));
        }
        Ok(submission)
    }

    /// List submissions. Regular users only ever see their own; admins see
    /// everyone's unless they filter by user.
    pub async fn list(
        &self,
        requester: Requester,
        query: SubmissionQuery,
        page: u32,
        per_page: u32,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let user_id = if requester.is_admin {
            query.user_id
        } else {
            Some(requester.id)
        };

        let filter = SubmissionFilter {
            user_id,
            challenge_id: query.challenge_id,
            language: query.language,
            status: query.status,
        };
        let offset = (page.saturating_sub(1) * per_page) as i64;

        self.submissions.list(filter, offset, per_page as i64).await
    }

    /// The requester's latest submissions
    pub async fn recent(&self, user_id: Uuid, limit: Option<u32>) -> AppResult<Vec<Submission>> {
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_SUBMISSIONS)
            .clamp(1, MAX_RECENT_SUBMISSIONS);
        self.submissions.recent_for_user(user_id, i64::from(limit)).await
    }

    /// Delete a submission. Only its owner may do so.
    pub async fn delete(&self, id: Uuid, requester_id: Uuid) -> AppResult<()> {
        let submission = self.find(id).await?;
        if submission.user_id != requester_id {
            return Err(AppError::Forbidden("Cannot delete another user's submission".to_string()));
        }

        self.submissions.delete(id).await?;
        tracing::info!(submission_id = %id, user_id = %requester_id, "Submission deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::repositories::{achievement_repo::MockAchievementRepository, challenge_repo::MockChallengeRepository},
        models::{Challenge, User},
        services::NotificationService,
        test_utils::InMemoryStore,
    };

    fn service_with(store: &Arc<InMemoryStore>, achievements: Arc<dyn crate::db::repositories::AchievementRepository>) -> SubmissionService {
        let users = Arc::new(UserService::new(store.clone()));
        let notifications = Arc::new(NotificationService::with_default_channels(store.clone(), store.clone()));
        let achievements = Arc::new(AchievementService::new(
            achievements,
            store.clone(),
            users.clone(),
            notifications,
        ));
        SubmissionService::new(store.clone(), store.clone(), store.clone(), users, achievements)
    }

    fn service(store: &Arc<InMemoryStore>) -> SubmissionService {
        service_with(store, store.clone())
    }

    fn setup() -> (Arc<InMemoryStore>, User, Challenge) {
        let store = InMemoryStore::seeded();
        let user = store.insert_user("coder");
        let challenge = store.insert_challenge(user.id, 60);
        (store, user, challenge)
    }

    fn request(challenge_id: Uuid, language: &str) -> SubmitCode {
        SubmitCode {
            challenge_id,
            language: language.to_string(),
            code: "print(42)".to_string(),
            simulation: Simulation::default(),
            started_at: None,
        }
    }

    fn report(status: ExecutionStatus, total: i32, passed: i32, time_ms: Option<i64>) -> ExecutionReport {
        ExecutionReport {
            status,
            total_tests: total,
            passed_tests: passed,
            execution_time_ms: time_ms,
            memory_usage_kb: Some(2048),
            output: None,
            error: None,
            test_results: Vec::new(),
            browser_environment: None,
        }
    }

    const HOUR_MS: i64 = 60 * 60 * 1000;

    #[tokio::test]
    async fn test_submit_counts_the_attempt() {
        let (store, user, challenge) = setup();

        let submission = service(&store)
            .submit_code(user.id, request(challenge.id, "python"))
            .await
            .unwrap();

        assert!(submission.is_pending());
        assert_eq!(store.challenge(challenge.id).total_attempts, 1);
        assert_eq!(store.user(user.id).total_challenges, 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_challenge_and_language() {
        let (store, user, challenge) = setup();
        let submissions = service(&store);

        let missing = submissions
            .submit_code(user.id, request(Uuid::new_v4(), "python"))
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let cobol = submissions
            .submit_code(user.id, request(challenge.id, "cobol"))
            .await
            .unwrap_err();
        assert!(matches!(cobol, AppError::Validation(fields) if fields[0].field == "language"));
        assert_eq!(store.challenge(challenge.id).total_attempts, 0);
    }

    #[tokio::test]
    async fn test_fast_nine_of_ten_run() {
        let (store, user, challenge) = setup();
        let submissions = service(&store);
        let pending = submissions
            .submit_code(user.id, request(challenge.id, "python"))
            .await
            .unwrap();

        let graded = submissions
            .process_execution_results(
                pending.id,
                user.id,
                report(ExecutionStatus::Completed, 10, 9, Some(HOUR_MS / 5)),
            )
            .await
            .unwrap();

        assert_eq!(graded.submission.score, 99);
        assert!(graded.submission.is_completed);
        assert!(graded.submission.submitted_at.is_some());
        assert_eq!(graded.xp.map(|a| a.awarded), Some(100));

        let unlocked: Vec<_> = graded.achievements.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(unlocked, vec!["First Steps"]);

        let stored = store.user(user.id);
        assert_eq!(stored.completed_challenges, 1);
        assert_eq!(stored.streak, 1);
        // 100 for the score plus 50 for First Steps
        assert_eq!(stored.xp, 150);
        assert_eq!(stored.level, 1);

        let stats = store.challenge(challenge.id);
        assert_eq!(stats.successful_attempts, 1);
        assert_eq!(stats.average_score, 99.0);
    }

    #[tokio::test]
    async fn test_timeout_scores_zero_without_side_effects() {
        let (store, user, challenge) = setup();
        let submissions = service(&store);
        let pending = submissions
            .submit_code(user.id, request(challenge.id, "go"))
            .await
            .unwrap();

        let graded = submissions
            .process_execution_results(pending.id, user.id, report(ExecutionStatus::Timeout, 10, 10, Some(100)))
            .await
            .unwrap();

        assert_eq!(graded.submission.score, 0);
        assert_eq!(graded.submission.status, "timeout");
        assert!(graded.xp.is_none());
        assert!(graded.achievements.is_empty());

        let stored = store.user(user.id);
        assert_eq!((stored.total_challenges, stored.completed_challenges, stored.xp), (1, 0, 0));
        assert!(store.unlocks_for(user.id).is_empty());
    }

    #[tokio::test]
    async fn test_below_threshold_earns_nothing() {
        let (store, user, challenge) = setup();
        let submissions = service(&store);
        let pending = submissions
            .submit_code(user.id, request(challenge.id, "c"))
            .await
            .unwrap();

        let graded = submissions
            .process_execution_results(
                pending.id,
                user.id,
                report(ExecutionStatus::Completed, 10, 6, Some(HOUR_MS * 3 / 4)),
            )
            .await
            .unwrap();

        assert_eq!(graded.submission.score, 60);
        assert!(graded.xp.is_none());
        assert_eq!(store.user(user.id).xp, 0);
    }

    #[tokio::test]
    async fn test_grading_happens_once() {
        let (store, user, challenge) = setup();
        let submissions = service(&store);
        let pending = submissions
            .submit_code(user.id, request(challenge.id, "rust"))
            .await
            .unwrap();
        let done = report(ExecutionStatus::Completed, 5, 5, None);

        submissions
            .process_execution_results(pending.id, user.id, done.clone())
            .await
            .unwrap();
        let again = submissions
            .process_execution_results(pending.id, user.id, done)
            .await
            .unwrap_err();

        assert!(matches!(again, AppError::Conflict(_)));
        assert_eq!(store.user(user.id).completed_challenges, 1);
    }

    #[tokio::test]
    async fn test_results_require_owner_and_existing_submission() {
        let (store, user, challenge) = setup();
        let intruder = store.insert_user("intruder");
        let submissions = service(&store);
        let pending = submissions
            .submit_code(user.id, request(challenge.id, "java"))
            .await
            .unwrap();

        let forbidden = submissions
            .process_execution_results(pending.id, intruder.id, report(ExecutionStatus::Completed, 1, 1, None))
            .await
            .unwrap_err();
        assert!(matches!(forbidden, AppError::Forbidden(_)));

        let missing = submissions
            .process_execution_results(Uuid::new_v4(), user.id, report(ExecutionStatus::Completed, 1, 1, None))
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let pending_report = submissions
            .process_execution_results(pending.id, user.id, report(ExecutionStatus::Pending, 1, 1, None))
            .await
            .unwrap_err();
        assert!(matches!(pending_report, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_achievement_failures_do_not_fail_grading() {
        let (store, user, challenge) = setup();
        let mut broken = MockAchievementRepository::new();
        broken
            .expect_find_by_name()
            .returning(|_| Err(AppError::Database("down".to_string())));
        broken
            .expect_find_by_criteria()
            .returning(|_, _| Err(AppError::Database("down".to_string())));
        broken
            .expect_list_by_criteria_type()
            .returning(|_| Err(AppError::Database("down".to_string())));
        let submissions = service_with(&store, Arc::new(broken));

        let pending = submissions
            .submit_code(user.id, request(challenge.id, "python"))
            .await
            .unwrap();
        let graded = submissions
            .process_execution_results(pending.id, user.id, report(ExecutionStatus::Completed, 4, 4, None))
            .await
            .unwrap();

        assert_eq!(graded.submission.score, 100);
        assert!(graded.achievements.is_empty());
        assert_eq!(store.user(user.id).xp, 100);
    }

    #[tokio::test]
    async fn test_level_up_unlocks_level_achievement() {
        let (store, user, challenge) = setup();
        store.update_user(user.id, |u| {
            u.xp = 3950;
            u.level = 4;
        });
        let submissions = service(&store);
        let pending = submissions
            .submit_code(user.id, request(challenge.id, "typescript"))
            .await
            .unwrap();

        let graded = submissions
            .process_execution_results(pending.id, user.id, report(ExecutionStatus::Completed, 10, 10, None))
            .await
            .unwrap();

        let award = graded.xp.unwrap();
        assert!(award.leveled_up());
        assert_eq!(award.level, 5);
        assert!(graded.achievements.iter().any(|a| a.name == "Rising Star"));
    }

    #[tokio::test]
    async fn test_queries_respect_ownership() {
        let (store, user, challenge) = setup();
        let other = store.insert_user("other");
        let submissions = service(&store);
        let mine = submissions
            .submit_code(user.id, request(challenge.id, "python"))
            .await
            .unwrap();
        submissions
            .submit_code(other.id, request(challenge.id, "go"))
            .await
            .unwrap();

        let me = Requester { id: user.id, is_admin: false };
        let admin = Requester { id: other.id, is_admin: true };

        let (own, total) = submissions.list(me, SubmissionQuery::default(), 1, 20).await.unwrap();
        assert_eq!((own.len(), total), (1, 1));
        let (all, total) = submissions.list(admin, SubmissionQuery::default(), 1, 20).await.unwrap();
        assert_eq!((all.len(), total), (2, 2));

        let peek = submissions
            .get(mine.id, Requester { id: other.id, is_admin: false })
            .await
            .unwrap_err();
        assert!(matches!(peek, AppError::Forbidden(_)));
        assert!(submissions.get(mine.id, admin).await.is_ok());

        assert_eq!(submissions.recent(user.id, Some(500)).await.unwrap().len(), 1);

        let steal = submissions.delete(mine.id, other.id).await.unwrap_err();
        assert!(matches!(steal, AppError::Forbidden(_)));
        submissions.delete(mine.id, user.id).await.unwrap();
        assert!(matches!(submissions.get(mine.id, me).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reward_xp_level_up_unlocks_level_achievement() {
        let (store, user, challenge) = setup();
        store.update_user(user.id, |u| {
            u.xp = 3920;
            u.level = 4;
        });
        let submissions = service(&store);
        let pending = submissions
            .submit_code(user.id, request(challenge.id, "python"))
            .await
            .unwrap();

        // 50 XP for the score keeps level 4; First Steps' 50 XP crosses 4000
        let graded = submissions
            .process_execution_results(pending.id, user.id, report(ExecutionStatus::Completed, 10, 7, None))
            .await
            .unwrap();

        assert_eq!(graded.submission.score, 70);
        assert_eq!(graded.xp.map(|a| a.leveled_up()), Some(false));

        let unlocked: Vec<_> = graded.achievements.iter().map(|a| a.name.as_str()).collect();
        assert!(unlocked.contains(&"First Steps"), "{unlocked:?}");
        assert!(unlocked.contains(&"Rising Star"), "{unlocked:?}");

        let stored = store.user(user.id);
        assert_eq!(stored.xp, 4020);
        assert_eq!(stored.level, 5);
    }

    #[tokio::test]
    async fn test_deactivated_challenge_keeps_its_time_limit() {
        let (store, user, challenge) = setup();
        let submissions = service(&store);
        let pending = submissions
            .submit_code(user.id, request(challenge.id, "python"))
            .await
            .unwrap();
        ChallengeRepository::deactivate(&*store, challenge.id).await.unwrap();

        let graded = submissions
            .process_execution_results(
                pending.id,
                user.id,
                report(ExecutionStatus::Completed, 10, 9, Some(HOUR_MS / 5)),
            )
            .await
            .unwrap();

        assert_eq!(graded.submission.score, 99);
    }

    #[tokio::test]
    async fn test_untimed_success_leaves_average_time_alone() {
        let (store, user, challenge) = setup();
        let submissions = service(&store);

        for time_ms in [Some(1200), None] {
            let pending = submissions
                .submit_code(user.id, request(challenge.id, "go"))
                .await
                .unwrap();
            submissions
                .process_execution_results(pending.id, user.id, report(ExecutionStatus::Completed, 2, 2, time_ms))
                .await
                .unwrap();
        }

        let stats = store.challenge(challenge.id);
        assert_eq!(stats.successful_attempts, 2);
        assert_eq!(stats.timed_attempts, 1);
        assert_eq!(stats.average_time, 1200.0);
    }

    #[tokio::test]
    async fn test_counter_failure_keeps_the_stored_submission() {
        let (store, user, challenge) = setup();
        let mut challenges = MockChallengeRepository::new();
        let found = challenge.clone();
        challenges
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        challenges
            .expect_increment_attempts()
            .returning(|_| Err(AppError::Database("down".to_string())));

        let users = Arc::new(UserService::new(store.clone()));
        let notifications = Arc::new(NotificationService::with_default_channels(store.clone(), store.clone()));
        let achievements = Arc::new(AchievementService::new(
            store.clone(),
            store.clone(),
            users.clone(),
            notifications,
        ));
        let submissions = SubmissionService::new(
            store.clone(),
            Arc::new(challenges),
            store.clone(),
            users,
            achievements,
        );

        let submission = submissions
            .submit_code(user.id, request(challenge.id, "python"))
            .await
            .unwrap();

        assert!(submission.is_pending());
        assert_eq!(store.user(user.id).total_challenges, 1);
        assert!(submissions
            .get(submission.id, Requester { id: user.id, is_admin: false })
            .await
            .is_ok());
    }
}
