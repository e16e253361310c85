//! In-memory repositories for service and handler tests
//!
//! One store implements every repository trait, enforcing the same unique
//! keys and row filters as the PostgreSQL queries.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    constants::{languages, roles, statuses},
    db::repositories::{
        AchievementRepository, ChallengeRepository, NotificationRepository, Repositories,
        SubmissionRepository, UserRepository,
    },
    error::{AppError, AppResult},
    models::{
        level_for_xp, Achievement, AchievementChanges, AchievementFilter, Challenge, ChallengeChanges,
        ChallengeCode, ChallengeContent, ChallengeFilter, ExecutionOutcome, NewAchievement, NewChallenge,
        NewNotification, NewSubmission, NewUser, Notification, NotificationFilter, NotificationStats,
        Preferences, Profile, Scenario, Simulation, Submission, SubmissionFilter, User, UserAchievement,
    },
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    challenges: Vec<Challenge>,
    submissions: Vec<Submission>,
    achievements: Vec<Achievement>,
    unlocks: Vec<UserAchievement>,
    notifications: Vec<Notification>,
}

/// Rows are kept in insertion order, which stands in for `created_at`
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

fn not_found() -> AppError {
    AppError::NotFound("Resource not found".to_string())
}

fn page<T: Clone>(rows: Vec<&T>, offset: i64, limit: i64) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let rows = rows
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect();
    (rows, total)
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store holding the default achievement catalog
    pub fn seeded() -> Arc<Self> {
        let store = Self::new();
        {
            let mut state = store.lock();
            for seed in default_catalog() {
                state.achievements.push(achievement_from(seed));
            }
        }
        store
    }

    /// Repository bundle backed by this store
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            challenges: self.clone(),
            submissions: self.clone(),
            achievements: self.clone(),
            notifications: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store mutex poisoned")
    }

    pub fn insert_user(&self, username: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash: "unusable".to_string(),
            profile: Json(Profile::default()),
            preferences: Json(Preferences::default()),
            role: roles::USER.to_string(),
            level: 1,
            xp: 0,
            total_challenges: 0,
            completed_challenges: 0,
            streak: 0,
            last_active_date: None,
            login_attempts: 0,
            lock_until: None,
            is_email_verified: false,
            email_verification_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.lock().users.push(user.clone());
        user
    }

    pub fn update_user(&self, id: Uuid, change: impl FnOnce(&mut User)) {
        let mut state = self.lock();
        let user = state.users.iter_mut().find(|u| u.id == id).expect("unknown user");
        change(user);
    }

    pub fn user(&self, id: Uuid) -> User {
        self.lock()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .expect("unknown user")
    }

    pub fn insert_challenge(&self, author_id: Uuid, time_limit_minutes: i32) -> Challenge {
        let mut state = self.lock();
        let n = state.challenges.len() + 1;
        let challenge = challenge_from(
            NewChallenge {
                title: format!("Challenge {}", n),
                slug: format!("challenge-{}", n),
                description: "Solve it".to_string(),
                challenge_type: "dsa".to_string(),
                difficulty: "easy".to_string(),
                category: None,
                tags: Vec::new(),
                content: ChallengeContent::default(),
                code: ChallengeCode::default(),
                scenario: Scenario::default(),
                time_limit_minutes,
                author_id,
            },
            Utc::now(),
        );
        state.challenges.push(challenge.clone());
        challenge
    }

    pub fn challenge(&self, id: Uuid) -> Challenge {
        self.lock()
            .challenges
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("unknown challenge")
    }

    pub fn insert_submission(&self, submission: Submission) -> Submission {
        self.lock().submissions.push(submission.clone());
        submission
    }

    pub fn unlocks_for(&self, user_id: Uuid) -> Vec<UserAchievement> {
        self.lock()
            .unlocks
            .iter()
            .filter(|u| u.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn achievement(&self, id: Uuid) -> Achievement {
        self.lock()
            .achievements
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .expect("unknown achievement")
    }

    pub fn achievement_named(&self, name: &str) -> Achievement {
        self.lock()
            .achievements
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .expect("unknown achievement")
    }

    /// Every stored notification of a user, expired ones included
    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.lock()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == user_id)
            .cloned()
            .collect()
    }
}

/// A graded, completed submission
pub fn completed_submission(
    user_id: Uuid,
    challenge_id: Uuid,
    language: &str,
    score: i32,
    execution_time_ms: Option<i64>,
) -> Submission {
    let now = Utc::now();
    Submission {
        id: Uuid::new_v4(),
        user_id,
        challenge_id,
        language: language.to_string(),
        code: "solve()".to_string(),
        status: statuses::COMPLETED.to_string(),
        score,
        total_tests: 10,
        passed_tests: 10,
        execution_time_ms,
        memory_usage_kb: None,
        output: None,
        error: None,
        test_results: Json(Vec::new()),
        browser_environment: None,
        simulation: Json(Simulation::default()),
        started_at: now,
        submitted_at: Some(now),
        is_completed: true,
        created_at: now,
        updated_at: now,
    }
}

struct Seed {
    name: String,
    description: String,
    category: &'static str,
    criteria_type: &'static str,
    target: i64,
    conditions: Value,
    reward_xp: i32,
    rarity: &'static str,
}

fn seed(
    name: &str,
    category: &'static str,
    criteria_type: &'static str,
    target: i64,
    conditions: Value,
    reward_xp: i32,
    rarity: &'static str,
) -> Seed {
    Seed {
        name: name.to_string(),
        description: format!("{} achievement", name),
        category,
        criteria_type,
        target,
        conditions,
        reward_xp,
        rarity,
    }
}

/// Mirrors migrations/0002_seed_achievements.sql
fn default_catalog() -> Vec<Seed> {
    let mut catalog = vec![
        seed("First Steps", "milestone", "challenge_count", 1, json!({}), 50, "common"),
        seed("Getting Started", "milestone", "challenge_count", 10, json!({}), 100, "common"),
        seed("Dedicated", "milestone", "challenge_count", 50, json!({}), 250, "uncommon"),
        seed("Centurion", "milestone", "challenge_count", 100, json!({}), 500, "rare"),
        seed("Relentless", "milestone", "challenge_count", 500, json!({}), 1000, "epic"),
        seed("Legend", "milestone", "challenge_count", 1000, json!({}), 2500, "legendary"),
        seed("Perfect Score", "skill", "score", 100, json!({}), 100, "uncommon"),
        seed("Week Warrior", "streak", "streak", 7, json!({}), 150, "uncommon"),
        seed("Monthly Grinder", "streak", "streak", 30, json!({}), 500, "rare"),
        seed("Unstoppable", "streak", "streak", 100, json!({}), 1500, "legendary"),
        seed("Speed Demon", "speed", "time", 1000, json!({}), 100, "rare"),
    ];

    catalog.extend(languages::ALL.iter().map(|language| {
        seed(
            &format!("{} Master", languages::display_name(language)),
            "skill",
            "challenge_count",
            10,
            json!({ "language": language }),
            200,
            "rare",
        )
    }));

    catalog.extend([
        seed("Rising Star", "special", "special", 5, json!({ "level": 5 }), 0, "uncommon"),
        seed("Veteran", "special", "special", 10, json!({ "level": 10 }), 0, "rare"),
        seed("Elite", "special", "special", 25, json!({ "level": 25 }), 0, "epic"),
    ]);

    catalog
}

fn achievement_from(seed: Seed) -> Achievement {
    let now = Utc::now();
    Achievement {
        id: Uuid::new_v4(),
        name: seed.name,
        description: seed.description,
        icon: None,
        category: seed.category.to_string(),
        criteria_type: seed.criteria_type.to_string(),
        criteria_target: seed.target,
        criteria_conditions: Json(seed.conditions),
        reward_xp: seed.reward_xp,
        reward_badge: None,
        reward_title: None,
        rarity: seed.rarity.to_string(),
        is_hidden: false,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn challenge_from(new: NewChallenge, now: DateTime<Utc>) -> Challenge {
    Challenge {
        id: Uuid::new_v4(),
        title: new.title,
        slug: new.slug,
        description: new.description,
        challenge_type: new.challenge_type,
        difficulty: new.difficulty,
        category: new.category,
        tags: new.tags,
        content: Json(new.content),
        code: Json(new.code),
        scenario: Json(new.scenario),
        time_limit_minutes: new.time_limit_minutes,
        total_attempts: 0,
        successful_attempts: 0,
        timed_attempts: 0,
        average_time: 0.0,
        average_score: 0.0,
        popularity_score: 0.0,
        author_id: new.author_id,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn is_live(notification: &Notification, now: DateTime<Utc>) -> bool {
    !notification.is_expired(now)
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == new.username) {
            return Err(AppError::AlreadyExists("users_username_key".to_string()));
        }
        if state.users.iter().any(|u| u.email == new.email) {
            return Err(AppError::AlreadyExists("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            profile: Json(new.profile),
            preferences: Json(Preferences::default()),
            role: roles::USER.to_string(),
            level: 1,
            xp: 0,
            total_challenges: 0,
            completed_challenges: 0,
            streak: 0,
            last_active_date: None,
            login_attempts: 0,
            lock_until: None,
            is_email_verified: false,
            email_verification_token: new.email_verification_token,
            password_reset_token: None,
            password_reset_expires: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id && u.is_active).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let email = identifier.to_lowercase();
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.is_active && (u.username == identifier || u.email == email))
            .cloned())
    }

    async fn find_by_verification_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.is_active && u.email_verification_token.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| {
                u.is_active
                    && u.password_reset_token.as_deref() == Some(token_hash)
                    && u.password_reset_expires.is_some_and(|at| at > now)
            })
            .cloned())
    }

    async fn increment_login_attempts(&self, id: Uuid) -> AppResult<i32> {
        let mut state = self.lock();
        let user = state.users.iter_mut().find(|u| u.id == id).ok_or_else(not_found)?;
        user.login_attempts += 1;
        Ok(user.login_attempts)
    }

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        self.with_user(id, |u| u.lock_until = Some(until));
        Ok(())
    }

    async fn reset_login_attempts(&self, id: Uuid) -> AppResult<()> {
        self.with_user(id, |u| {
            u.login_attempts = 0;
            u.lock_until = None;
        });
        Ok(())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        self.with_user(id, |u| {
            u.login_attempts = 0;
            u.lock_until = None;
            u.last_login_at = Some(at);
        });
        Ok(())
    }

    async fn increment_total_challenges(&self, id: Uuid) -> AppResult<()> {
        self.with_user(id, |u| u.total_challenges += 1);
        Ok(())
    }

    async fn increment_completed_challenges(&self, id: Uuid) -> AppResult<()> {
        self.with_user(id, |u| u.completed_challenges += 1);
        Ok(())
    }

    async fn add_xp(&self, id: Uuid, amount: i64) -> AppResult<i64> {
        let mut state = self.lock();
        let user = state.users.iter_mut().find(|u| u.id == id).ok_or_else(not_found)?;
        user.xp = (user.xp + amount).max(0);
        user.level = level_for_xp(user.xp);
        Ok(user.xp)
    }

    async fn update_streak(&self, id: Uuid, streak: i32, last_active: DateTime<Utc>) -> AppResult<()> {
        self.with_user(id, |u| {
            u.streak = streak;
            u.last_active_date = Some(last_active);
        });
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, profile: Profile, preferences: Preferences) -> AppResult<User> {
        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id && u.is_active)
            .ok_or_else(not_found)?;
        user.profile = Json(profile);
        user.preferences = Json(preferences);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        self.with_user(id, |u| {
            u.password_hash = password_hash.to_string();
            u.password_reset_token = None;
            u.password_reset_expires = None;
            u.login_attempts = 0;
            u.lock_until = None;
        });
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expires: DateTime<Utc>) -> AppResult<()> {
        self.with_user(id, |u| {
            u.password_reset_token = Some(token_hash.to_string());
            u.password_reset_expires = Some(expires);
        });
        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> AppResult<()> {
        self.with_user(id, |u| {
            u.is_email_verified = true;
            u.email_verification_token = None;
        });
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        self.with_user(id, |u| u.is_active = false);
        Ok(())
    }
}

impl InMemoryStore {
    /// Like an `UPDATE ... WHERE id = $1`: a missing row is not an error
    fn with_user(&self, id: Uuid, change: impl FnOnce(&mut User)) {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == id) {
            change(user);
            user.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl ChallengeRepository for InMemoryStore {
    async fn create(&self, new: NewChallenge) -> AppResult<Challenge> {
        let mut state = self.lock();
        if state.challenges.iter().any(|c| c.slug == new.slug) {
            return Err(AppError::AlreadyExists("challenges_slug_key".to_string()));
        }
        let challenge = challenge_from(new, Utc::now());
        state.challenges.push(challenge.clone());
        Ok(challenge)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Challenge>> {
        Ok(self.lock().challenges.iter().find(|c| c.id == id && c.is_active).cloned())
    }

    async fn find_time_limit(&self, id: Uuid) -> AppResult<Option<i32>> {
        Ok(self
            .lock()
            .challenges
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.time_limit_minutes))
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Challenge>> {
        Ok(self
            .lock()
            .challenges
            .iter()
            .find(|c| c.slug == slug && c.is_active)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        Ok(self.lock().challenges.iter().any(|c| c.slug == slug))
    }

    async fn list(&self, filter: ChallengeFilter, offset: i64, limit: i64) -> AppResult<(Vec<Challenge>, i64)> {
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let state = self.lock();
        let rows = state
            .challenges
            .iter()
            .rev()
            .filter(|c| c.is_active)
            .filter(|c| filter.challenge_type.as_ref().is_none_or(|t| &c.challenge_type == t))
            .filter(|c| filter.difficulty.as_ref().is_none_or(|d| &c.difficulty == d))
            .filter(|c| filter.category.is_none() || c.category == filter.category)
            .filter(|c| search.as_ref().is_none_or(|s| c.title.to_lowercase().contains(s)))
            .collect();
        Ok(page(rows, offset, limit))
    }

    async fn update(&self, id: Uuid, changes: ChallengeChanges) -> AppResult<Challenge> {
        let mut state = self.lock();
        let c = state
            .challenges
            .iter_mut()
            .find(|c| c.id == id && c.is_active)
            .ok_or_else(not_found)?;

        if let Some(title) = changes.title {
            c.title = title;
        }
        if let Some(description) = changes.description {
            c.description = description;
        }
        if let Some(difficulty) = changes.difficulty {
            c.difficulty = difficulty;
        }
        if changes.category.is_some() {
            c.category = changes.category;
        }
        if let Some(tags) = changes.tags {
            c.tags = tags;
        }
        if let Some(content) = changes.content {
            c.content = Json(content);
        }
        if let Some(code) = changes.code {
            c.code = Json(code);
        }
        if let Some(scenario) = changes.scenario {
            c.scenario = Json(scenario);
        }
        if let Some(minutes) = changes.time_limit_minutes {
            c.time_limit_minutes = minutes;
        }
        c.updated_at = Utc::now();
        Ok(c.clone())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        if let Some(c) = self.lock().challenges.iter_mut().find(|c| c.id == id) {
            c.is_active = false;
        }
        Ok(())
    }

    async fn increment_attempts(&self, id: Uuid) -> AppResult<()> {
        if let Some(c) = self.lock().challenges.iter_mut().find(|c| c.id == id) {
            c.total_attempts += 1;
            c.popularity_score += 1.0;
        }
        Ok(())
    }

    async fn record_success(&self, id: Uuid, execution_time_ms: Option<i64>, score: i32) -> AppResult<()> {
        if let Some(c) = self.lock().challenges.iter_mut().find(|c| c.id == id) {
            if let Some(ms) = execution_time_ms {
                c.timed_attempts += 1;
                c.average_time += (ms as f64 - c.average_time) / f64::from(c.timed_attempts);
            }
            let n = f64::from(c.successful_attempts + 1);
            c.average_score += (f64::from(score) - c.average_score) / n;
            c.successful_attempts += 1;
            c.popularity_score += 2.0;
        }
        Ok(())
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryStore {
    async fn create(&self, new: NewSubmission) -> AppResult<Submission> {
        let now = Utc::now();
        let submission = Submission {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            challenge_id: new.challenge_id,
            language: new.language,
            code: new.code,
            status: statuses::PENDING.to_string(),
            score: 0,
            total_tests: 0,
            passed_tests: 0,
            execution_time_ms: None,
            memory_usage_kb: None,
            output: None,
            error: None,
            test_results: Json(Vec::new()),
            browser_environment: None,
            simulation: Json(new.simulation),
            started_at: new.started_at,
            submitted_at: None,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };
        self.lock().submissions.push(submission.clone());
        Ok(submission)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Submission>> {
        Ok(self.lock().submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn complete(&self, id: Uuid, outcome: ExecutionOutcome) -> AppResult<Option<Submission>> {
        let mut state = self.lock();
        let Some(s) = state.submissions.iter_mut().find(|s| s.id == id && s.is_pending()) else {
            return Ok(None);
        };

        s.status = outcome.status.as_str().to_string();
        s.score = outcome.score;
        s.total_tests = outcome.total_tests;
        s.passed_tests = outcome.passed_tests;
        s.execution_time_ms = outcome.execution_time_ms;
        s.memory_usage_kb = outcome.memory_usage_kb;
        s.output = outcome.output;
        s.error = outcome.error;
        s.test_results = Json(outcome.test_results);
        s.browser_environment = outcome.browser_environment.map(Json);
        s.submitted_at = Some(outcome.submitted_at);
        s.is_completed = true;
        s.updated_at = Utc::now();
        Ok(Some(s.clone()))
    }

    async fn list(&self, filter: SubmissionFilter, offset: i64, limit: i64) -> AppResult<(Vec<Submission>, i64)> {
        let state = self.lock();
        let rows = state
            .submissions
            .iter()
            .rev()
            .filter(|s| filter.user_id.is_none_or(|id| s.user_id == id))
            .filter(|s| filter.challenge_id.is_none_or(|id| s.challenge_id == id))
            .filter(|s| filter.language.as_ref().is_none_or(|l| &s.language == l))
            .filter(|s| filter.status.as_ref().is_none_or(|st| &s.status == st))
            .collect();
        Ok(page(rows, offset, limit))
    }

    async fn recent_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Submission>> {
        let state = self.lock();
        let rows = state.submissions.iter().rev().filter(|s| s.user_id == user_id).collect();
        Ok(page(rows, 0, limit).0)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.lock().submissions.retain(|s| s.id != id);
        Ok(())
    }

    async fn count_completed(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .lock()
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id && s.status == statuses::COMPLETED)
            .count() as i64)
    }

    async fn count_completed_in_language(&self, user_id: Uuid, language: &str) -> AppResult<i64> {
        Ok(self
            .lock()
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id && s.language == language && s.status == statuses::COMPLETED)
            .count() as i64)
    }
}

#[async_trait]
impl AchievementRepository for InMemoryStore {
    async fn list(&self, filter: AchievementFilter) -> AppResult<Vec<Achievement>> {
        let mut rows: Vec<Achievement> = self
            .lock()
            .achievements
            .iter()
            .filter(|a| a.is_active)
            .filter(|a| filter.category.as_ref().is_none_or(|c| &a.category == c))
            .filter(|a| filter.rarity.as_ref().is_none_or(|r| &a.rarity == r))
            .filter(|a| filter.include_hidden || !a.is_hidden)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (&a.category, a.criteria_target, &a.name).cmp(&(&b.category, b.criteria_target, &b.name))
        });
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Achievement>> {
        Ok(self.lock().achievements.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Achievement>> {
        Ok(self
            .lock()
            .achievements
            .iter()
            .find(|a| a.name == name && a.is_active)
            .cloned())
    }

    async fn find_by_criteria(&self, criteria_type: &str, target: i64) -> AppResult<Option<Achievement>> {
        Ok(self
            .lock()
            .achievements
            .iter()
            .find(|a| {
                a.is_active
                    && a.criteria_type == criteria_type
                    && a.criteria_target == target
                    && a.criteria_conditions.get("language").is_none()
            })
            .cloned())
    }

    async fn list_by_criteria_type(&self, criteria_type: &str) -> AppResult<Vec<Achievement>> {
        let mut rows: Vec<Achievement> = self
            .lock()
            .achievements
            .iter()
            .filter(|a| a.is_active && a.criteria_type == criteria_type)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.criteria_target);
        Ok(rows)
    }

    async fn create(&self, new: NewAchievement) -> AppResult<Achievement> {
        let mut state = self.lock();
        if state.achievements.iter().any(|a| a.name == new.name) {
            return Err(AppError::AlreadyExists("achievements_name_key".to_string()));
        }

        let now = Utc::now();
        let achievement = Achievement {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            icon: new.icon,
            category: new.category,
            criteria_type: new.criteria_type,
            criteria_target: new.criteria_target,
            criteria_conditions: Json(new.criteria_conditions),
            reward_xp: new.reward_xp,
            reward_badge: new.reward_badge,
            reward_title: new.reward_title,
            rarity: new.rarity,
            is_hidden: new.is_hidden,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.achievements.push(achievement.clone());
        Ok(achievement)
    }

    async fn update(&self, id: Uuid, changes: AchievementChanges) -> AppResult<Achievement> {
        let mut state = self.lock();
        let a = state.achievements.iter_mut().find(|a| a.id == id).ok_or_else(not_found)?;

        if let Some(description) = changes.description {
            a.description = description;
        }
        if changes.icon.is_some() {
            a.icon = changes.icon;
        }
        if let Some(category) = changes.category {
            a.category = category;
        }
        if let Some(target) = changes.criteria_target {
            a.criteria_target = target;
        }
        if let Some(conditions) = changes.criteria_conditions {
            a.criteria_conditions = Json(conditions);
        }
        if let Some(xp) = changes.reward_xp {
            a.reward_xp = xp;
        }
        if changes.reward_badge.is_some() {
            a.reward_badge = changes.reward_badge;
        }
        if changes.reward_title.is_some() {
            a.reward_title = changes.reward_title;
        }
        if let Some(rarity) = changes.rarity {
            a.rarity = rarity;
        }
        if let Some(hidden) = changes.is_hidden {
            a.is_hidden = hidden;
        }
        if let Some(active) = changes.is_active {
            a.is_active = active;
        }
        a.updated_at = Utc::now();
        Ok(a.clone())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        if let Some(a) = self.lock().achievements.iter_mut().find(|a| a.id == id) {
            a.is_active = false;
        }
        Ok(())
    }

    async fn user_has(&self, user_id: Uuid, achievement_id: Uuid) -> AppResult<bool> {
        Ok(self
            .lock()
            .unlocks
            .iter()
            .any(|u| u.user_id == user_id && u.achievement_id == achievement_id))
    }

    async fn insert_unlock(&self, user_id: Uuid, achievement_id: Uuid, metadata: Value) -> AppResult<UserAchievement> {
        let mut state = self.lock();
        if state
            .unlocks
            .iter()
            .any(|u| u.user_id == user_id && u.achievement_id == achievement_id)
        {
            return Err(AppError::AlreadyExists("user_achievements_user_achievement_key".to_string()));
        }

        let unlock = UserAchievement {
            id: Uuid::new_v4(),
            user_id,
            achievement_id,
            unlocked_at: Utc::now(),
            progress: 100,
            metadata: Json(metadata),
        };
        state.unlocks.push(unlock.clone());
        Ok(unlock)
    }

    async fn list_unlocked(&self, user_id: Uuid) -> AppResult<Vec<(UserAchievement, Achievement)>> {
        let state = self.lock();
        Ok(state
            .unlocks
            .iter()
            .rev()
            .filter(|u| u.user_id == user_id)
            .filter_map(|u| {
                state
                    .achievements
                    .iter()
                    .find(|a| a.id == u.achievement_id)
                    .map(|a| (u.clone(), a.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create(&self, new: NewNotification) -> AppResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: new.recipient_id,
            notification_type: new.notification_type,
            title: new.title,
            message: new.message,
            data: Json(new.data),
            priority: new.priority,
            channels: new.channels,
            is_read: false,
            read_at: None,
            is_delivered: false,
            delivered_at: None,
            expires_at: new.expires_at,
            created_at: Utc::now(),
        };
        self.lock().notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Notification>, i64)> {
        let now = Utc::now();
        let state = self.lock();
        let rows = state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == user_id && is_live(n, now))
            .filter(|n| !filter.unread_only || !n.is_read)
            .filter(|n| filter.notification_type.as_ref().is_none_or(|t| &n.notification_type == t))
            .collect();
        Ok(page(rows, offset, limit))
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        let now = Utc::now();
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == user_id && !n.is_read && is_live(n, now))
            .count() as i64)
    }

    async fn stats(&self, user_id: Uuid) -> AppResult<NotificationStats> {
        let now = Utc::now();
        let mut stats = NotificationStats::default();
        for n in self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == user_id && is_live(n, now))
        {
            stats.total += 1;
            if !n.is_read {
                stats.unread += 1;
            }
            *stats.by_type.entry(n.notification_type.clone()).or_default() += 1;
        }
        Ok(stats)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Notification>> {
        let mut state = self.lock();
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.read_at = n.read_at.or(Some(Utc::now()));
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let now = Utc::now();
        let mut updated = 0;
        for n in self
            .lock()
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == user_id && !n.is_read)
        {
            n.is_read = true;
            n.read_at = Some(now);
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut state = self.lock();
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.id == id && n.recipient_id == user_id));
        Ok(state.notifications.len() < before)
    }

    async fn mark_delivered(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(n) = self.lock().notifications.iter_mut().find(|n| n.id == id) {
            n.is_delivered = true;
            n.delivered_at = Some(at);
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.lock();
        let before = state.notifications.len();
        state.notifications.retain(|n| !n.is_expired(now));
        Ok((before - state.notifications.len()) as u64)
    }
}
