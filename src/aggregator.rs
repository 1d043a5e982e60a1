//! Resilience aggregation
//!
//! This module provides the public API of Symbiome Core. A
//! [`ResilienceAggregator`] owns the dashboard store and turns completed
//! monitoring sessions into records, profile rewards, and scores.
//!
//! Session completion stages:
//! 1. OutcomePolicy - Estimate recovery time and stress events
//! 2. SessionDeriver - Compute signal means and SRI
//! 3. AppState - Append the record and award experience

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AggregatorConfig;
use crate::error::ComputeError;
use crate::policy::{OutcomePolicy, SeededOutcomePolicy};
use crate::prompt::DeferredPrompt;
use crate::score::ScoreAggregator;
use crate::session::SessionDeriver;
use crate::state::{Action, AppState};
use crate::types::{BiometricReading, ResilienceScore, ResilienceTier, SessionData, WeeklyPoint};

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Compute the resilience score for a session history.
///
/// Pure and deterministic; an empty history yields the baseline score.
pub fn aggregate_score(history: &[SessionData]) -> ResilienceScore {
    ScoreAggregator::aggregate(history)
}

/// Serialized store contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    pub instance_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub state: AppState,
}

/// Stateful aggregator owning the dashboard store.
pub struct ResilienceAggregator {
    state: AppState,
    policy: Box<dyn OutcomePolicy>,
    coach: Option<DeferredPrompt>,
    coach_delay: Duration,
    instance_id: Uuid,
}

impl Default for ResilienceAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResilienceAggregator {
    /// Create an aggregator with default settings
    pub fn new() -> Self {
        Self::with_config(AggregatorConfig::default())
    }

    pub fn with_config(config: AggregatorConfig) -> Self {
        let policy: Box<dyn OutcomePolicy> = match config.seed {
            Some(seed) => Box::new(SeededOutcomePolicy::new(seed)),
            None => Box::new(SeededOutcomePolicy::from_entropy()),
        };
        Self {
            state: AppState::new(config.profile),
            policy,
            coach: None,
            coach_delay: Duration::from_millis(config.coach_delay_ms),
            instance_id: Uuid::new_v4(),
        }
    }

    /// Replace the outcome policy
    pub fn with_policy(mut self, policy: Box<dyn OutcomePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn sessions(&self) -> &[SessionData] {
        self.state.sessions()
    }

    /// Apply a view transition (navigation, chrome toggles).
    ///
    /// Sessions are recorded only through [`complete_session_at`](Self::complete_session_at).
    pub fn apply(&mut self, action: Action) {
        self.state.apply(action);
    }

    /// Complete a session now. See [`complete_session_at`](Self::complete_session_at).
    pub fn complete_session(&mut self, readings: &[BiometricReading]) -> Option<SessionData> {
        self.complete_session_at(readings, Utc::now())
    }

    /// Derive a session from `readings`, append it to the history and award
    /// experience.
    ///
    /// An empty batch leaves the store untouched and returns `None`.
    pub fn complete_session_at(
        &mut self,
        readings: &[BiometricReading],
        now: DateTime<Utc>,
    ) -> Option<SessionData> {
        if readings.is_empty() {
            tracing::debug!("session completed with no readings; ignoring");
            return None;
        }

        let outcome = self.policy.outcome(readings);
        let id = self.next_session_id(now);
        let session = SessionDeriver::derive(readings, outcome, id, now)?;

        tracing::info!(
            session_id = %session.id,
            session_type = session.session_type.as_str(),
            readings = session.duration,
            sri = session.sri,
            "session completed"
        );

        self.state.record_session(session.clone());
        Some(session)
    }

    /// Score over the full history
    pub fn score(&self) -> ResilienceScore {
        aggregate_score(self.state.sessions())
    }

    pub fn tier(&self) -> ResilienceTier {
        ScoreAggregator::tier(&self.score())
    }

    /// Weekly SRI chart data
    pub fn weekly(&self) -> Vec<WeeklyPoint> {
        ScoreAggregator::weekly_breakdown(self.state.sessions(), self.score().overall)
    }

    /// Schedule the coach prompt relative to `now`
    pub fn start_coach(&mut self, now: Instant) {
        self.coach = Some(DeferredPrompt::schedule(now, self.coach_delay));
    }

    /// Poll the coach prompt; shows the coach when it fires
    pub fn poll_coach(&mut self, now: Instant) -> bool {
        let fired = self.coach.as_mut().map_or(false, |prompt| prompt.poll(now));
        if fired {
            self.state.apply(Action::ShowCoach);
        }
        fired
    }

    /// Cancel pending deferred work before the owning view goes away
    pub fn teardown(&mut self) {
        if let Some(prompt) = self.coach.as_mut() {
            prompt.cancel();
        }
    }

    /// Save the store to JSON
    pub fn save_state(&self) -> Result<String, ComputeError> {
        let snapshot = StateSnapshot {
            version: SNAPSHOT_VERSION,
            instance_id: self.instance_id,
            saved_at: Utc::now(),
            state: self.state.clone(),
        };
        serde_json::to_string(&snapshot).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Load the store from JSON, replacing the current one
    pub fn load_state(&mut self, json: &str) -> Result<(), ComputeError> {
        let snapshot: StateSnapshot =
            serde_json::from_str(json).map_err(|e| ComputeError::InvalidState(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ComputeError::InvalidState(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for session in snapshot.state.sessions() {
            if !seen.insert(session.id.as_str()) {
                return Err(ComputeError::InvalidState(format!(
                    "duplicate session id {}",
                    session.id
                )));
            }
        }

        tracing::info!(
            sessions = snapshot.state.sessions().len(),
            source_instance = %snapshot.instance_id,
            "state snapshot loaded"
        );

        self.state = snapshot.state;
        Ok(())
    }

    fn next_session_id(&self, now: DateTime<Utc>) -> String {
        let base = format!("session-{}", now.timestamp_millis());
        let taken = |id: &str| self.state.sessions().iter().any(|s| s.id == id);

        if !taken(&base) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{FixedOutcomePolicy, SessionOutcome};
    use crate::types::Tab;
    use pretty_assertions::assert_eq;

    fn fixed_aggregator() -> ResilienceAggregator {
        ResilienceAggregator::new().with_policy(Box::new(FixedOutcomePolicy(SessionOutcome {
            recovery_time: 300,
            stress_events: 2,
        })))
    }

    fn calm_readings() -> Vec<BiometricReading> {
        vec![BiometricReading::new(80.0, 20.0, 90.0)]
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_complete_session_worked_example() {
        let mut aggregator = fixed_aggregator();
        let session = aggregator
            .complete_session_at(&calm_readings(), at("2024-01-15T10:00:00Z"))
            .unwrap();

        assert!((session.sri - 83.5).abs() < 1e-9);
        assert_eq!(session.id, format!("session-{}", session.date));
        assert_eq!(session.recovery_time, 300);
        assert_eq!(session.stress_events, 2);
        assert_eq!(aggregator.sessions().to_vec(), vec![session]);
    }

    #[test]
    fn test_empty_readings_are_a_noop() {
        let mut aggregator = fixed_aggregator();
        let before = aggregator.state().clone();

        assert!(aggregator.complete_session(&[]).is_none());
        assert_eq!(aggregator.state(), &before);
    }

    #[test]
    fn test_completion_rewards() {
        let mut aggregator = fixed_aggregator();
        let xp = aggregator.state().profile.xp;
        let total = aggregator.state().profile.total_sessions;

        aggregator.apply(Action::Navigate(Tab::Monitor));
        aggregator.complete_session(&calm_readings()).unwrap();

        assert_eq!(aggregator.sessions().len(), 1);
        assert_eq!(aggregator.state().profile.xp, xp + 150);
        assert_eq!(aggregator.state().profile.total_sessions, total + 1);
        assert_eq!(aggregator.state().active_tab, Tab::Home);
    }

    #[test]
    fn test_ids_stay_unique_within_same_millisecond() {
        let mut aggregator = fixed_aggregator();
        let now = at("2024-01-15T10:00:00Z");

        let a = aggregator.complete_session_at(&calm_readings(), now).unwrap();
        let b = aggregator.complete_session_at(&calm_readings(), now).unwrap();
        let c = aggregator.complete_session_at(&calm_readings(), now).unwrap();

        assert_eq!(b.id, format!("{}-1", a.id));
        assert_eq!(c.id, format!("{}-2", a.id));
    }

    #[test]
    fn test_history_order_and_score_recompute() {
        let mut aggregator = fixed_aggregator();
        assert_eq!(aggregator.score(), crate::score::BASELINE_SCORE);

        let hrvs = [62.0, 65.0, 68.0];
        for (i, hrv) in hrvs.iter().enumerate() {
            let now = at("2024-01-15T10:00:00Z") + chrono::Duration::minutes(i as i64);
            aggregator
                .complete_session_at(&[BiometricReading::new(*hrv, 30.0, 70.0)], now)
                .unwrap();
        }

        let recorded: Vec<f64> = aggregator.sessions().iter().map(|s| s.avg_hrv).collect();
        assert_eq!(recorded, hrvs.to_vec());
        assert_eq!(aggregator.score(), aggregate_score(aggregator.sessions()));
        assert_eq!(aggregator.score().resistance, 76.5);
    }

    #[test]
    fn test_seeded_config_is_reproducible() {
        let config = AggregatorConfig {
            seed: Some(11),
            ..Default::default()
        };
        let mut a = ResilienceAggregator::with_config(config.clone());
        let mut b = ResilienceAggregator::with_config(config);
        let now = at("2024-01-15T10:00:00Z");

        let sa = a.complete_session_at(&calm_readings(), now).unwrap();
        let sb = b.complete_session_at(&calm_readings(), now).unwrap();
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_coach_prompt_lifecycle() {
        let mut aggregator = fixed_aggregator();
        let start = Instant::now();
        aggregator.start_coach(start);

        assert!(!aggregator.poll_coach(start + Duration::from_secs(1)));
        assert!(!aggregator.state().show_coach);
        assert!(aggregator.poll_coach(start + Duration::from_secs(5)));
        assert!(aggregator.state().show_coach);
        assert!(!aggregator.poll_coach(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_teardown_cancels_coach() {
        let mut aggregator = fixed_aggregator();
        let start = Instant::now();
        aggregator.start_coach(start);
        aggregator.teardown();

        assert!(!aggregator.poll_coach(start + Duration::from_secs(60)));
        assert!(!aggregator.state().show_coach);
    }

    #[test]
    fn test_state_round_trip() {
        let mut aggregator = fixed_aggregator();
        aggregator.complete_session(&calm_readings()).unwrap();
        let saved = aggregator.save_state().unwrap();

        let mut restored = fixed_aggregator();
        restored.load_state(&saved).unwrap();

        assert_eq!(restored.state(), aggregator.state());
        assert_eq!(restored.score(), aggregator.score());
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let mut aggregator = fixed_aggregator();
        let session = aggregator.complete_session(&calm_readings()).unwrap();

        let mut snapshot: serde_json::Value =
            serde_json::from_str(&aggregator.save_state().unwrap()).unwrap();
        let sessions = snapshot["state"]["sessions"].as_array_mut().unwrap();
        sessions.push(serde_json::to_value(&session).unwrap());

        let err = fixed_aggregator()
            .load_state(&snapshot.to_string())
            .unwrap_err();
        assert!(matches!(err, ComputeError::InvalidState(_)));
    }

    #[test]
    fn test_state_round_trip_near_f64_max() {
        let mut aggregator = fixed_aggregator();
        let readings = vec![
            BiometricReading::new(1e308, 20.0, 90.0),
            BiometricReading::new(1e308, 20.0, 90.0),
        ];
        let session = aggregator
            .complete_session_at(&readings, at("2024-01-15T10:00:00Z"))
            .unwrap();
        assert!(session.avg_hrv.is_finite());
        assert!(session.sri.is_finite());

        // Non-finite readings are accepted and must survive a snapshot too
        let unbounded = vec![BiometricReading::new(f64::INFINITY, 20.0, 90.0)];
        aggregator
            .complete_session_at(&unbounded, at("2024-01-15T10:01:00Z"))
            .unwrap();

        let saved = aggregator.save_state().unwrap();
        assert!(!saved.contains("null"));

        let mut restored = fixed_aggregator();
        restored.load_state(&saved).unwrap();

        let sessions = restored.sessions();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, session.id);
        assert!(((sessions[0].avg_hrv - 1e308) / 1e308).abs() < 1e-12);
        assert_eq!(sessions[1].avg_hrv, f64::INFINITY);
        assert_eq!(sessions[1].sri, f64::INFINITY);
        assert_eq!(restored.score().resistance, 100.0);
    }

    #[test]
    fn test_view_actions_leave_history_intact() {
        let mut aggregator = fixed_aggregator();
        let now = at("2024-01-15T10:00:00Z");
        aggregator.complete_session_at(&calm_readings(), now).unwrap();

        for action in [
            Action::Navigate(Tab::RqTracker),
            Action::ToggleSidebar,
            Action::ShowCoach,
            Action::DismissCoach,
        ] {
            aggregator.apply(action);
        }
        aggregator.complete_session_at(&calm_readings(), now).unwrap();

        let ids: Vec<&str> = aggregator.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let saved = aggregator.save_state().unwrap();
        fixed_aggregator().load_state(&saved).unwrap();
    }

    #[test]
    fn test_completion_after_loading_maxed_profile() {
        let mut aggregator = fixed_aggregator();
        let mut snapshot: serde_json::Value =
            serde_json::from_str(&aggregator.save_state().unwrap()).unwrap();
        snapshot["state"]["profile"]["xp"] = serde_json::json!(u64::MAX);
        snapshot["state"]["profile"]["totalSessions"] = serde_json::json!(u64::MAX);
        aggregator.load_state(&snapshot.to_string()).unwrap();

        aggregator.complete_session(&calm_readings()).unwrap();

        assert_eq!(aggregator.state().profile.xp, u64::MAX);
        assert_eq!(aggregator.state().profile.total_sessions, u64::MAX);
        assert_eq!(aggregator.sessions().len(), 1);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(fixed_aggregator().load_state("not json").is_err());
    }
}
