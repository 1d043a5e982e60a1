//! Dashboard application state
//!
//! All state the dashboard shell renders lives in one [`AppState`] value.
//! View transitions are expressed as [`Action`]s applied by
//! [`AppState::apply`]. Session records only enter through the aggregator,
//! which assigns their ids. Reducers do no I/O and never reorder or drop
//! recorded sessions.

use crate::types::{SessionData, Tab, UserProfile};
use serde::{Deserialize, Serialize};

/// Experience awarded per completed session
pub const XP_PER_SESSION: u64 = 150;

/// View transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Navigate(Tab),
    ToggleSidebar,
    ShowCoach,
    DismissCoach,
}

/// Single store for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub active_tab: Tab,
    pub sidebar_open: bool,
    pub show_coach: bool,
    pub profile: UserProfile,
    sessions: Vec<SessionData>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(UserProfile::default())
    }
}

impl AppState {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            active_tab: Tab::Home,
            sidebar_open: true,
            show_coach: false,
            profile,
            sessions: Vec::new(),
        }
    }

    /// Session history in completion order
    pub fn sessions(&self) -> &[SessionData] {
        &self.sessions
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Navigate(tab) => self.active_tab = tab,
            Action::ToggleSidebar => self.sidebar_open = !self.sidebar_open,
            Action::ShowCoach => self.show_coach = true,
            Action::DismissCoach => self.show_coach = false,
        }
    }

    /// Append a completed session and award experience.
    ///
    /// The caller guarantees `session.id` is not already in the history.
    /// Counters saturate at their maximum.
    pub(crate) fn record_session(&mut self, session: SessionData) {
        self.sessions.push(session);
        self.profile.xp = self.profile.xp.saturating_add(XP_PER_SESSION);
        self.profile.total_sessions = self.profile.total_sessions.saturating_add(1);
        self.active_tab = Tab::Home;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionType;
    use pretty_assertions::assert_eq;

    fn make_session(id: &str) -> SessionData {
        SessionData {
            id: id.to_string(),
            date: 0,
            duration: 1,
            avg_hrv: 80.0,
            avg_gsr: 20.0,
            avg_facial_calm: 90.0,
            sri: 83.5,
            recovery_time: 200,
            stress_events: 0,
            session_type: SessionType::Stress,
        }
    }

    #[test]
    fn test_defaults() {
        let state = AppState::default();
        assert_eq!(state.active_tab, Tab::Home);
        assert!(state.sidebar_open);
        assert!(!state.show_coach);
        assert!(state.sessions().is_empty());
    }

    #[test]
    fn test_navigation_and_chrome() {
        let mut state = AppState::default();

        state.apply(Action::Navigate(Tab::Monitor));
        assert_eq!(state.active_tab, Tab::Monitor);

        state.apply(Action::ToggleSidebar);
        assert!(!state.sidebar_open);
        state.apply(Action::ToggleSidebar);
        assert!(state.sidebar_open);

        state.apply(Action::ShowCoach);
        assert!(state.show_coach);
        state.apply(Action::DismissCoach);
        assert!(!state.show_coach);
    }

    #[test]
    fn test_session_completion_updates_profile() {
        let mut state = AppState::default();
        let before = state.profile.clone();
        state.apply(Action::Navigate(Tab::Monitor));

        state.record_session(make_session("session-1"));

        assert_eq!(state.sessions().len(), 1);
        assert_eq!(state.profile.xp, before.xp + 150);
        assert_eq!(state.profile.total_sessions, before.total_sessions + 1);
        assert_eq!(state.profile.level, before.level);
        assert_eq!(state.active_tab, Tab::Home);
    }

    #[test]
    fn test_history_is_append_only() {
        let mut state = AppState::default();
        for i in 0..5 {
            state.record_session(make_session(&format!("session-{}", i)));
        }

        let ids: Vec<&str> = state.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["session-0", "session-1", "session-2", "session-3", "session-4"]
        );
    }

    #[test]
    fn test_rewards_saturate_at_max() {
        let mut state = AppState::new(UserProfile {
            xp: u64::MAX - 10,
            total_sessions: u64::MAX,
            ..UserProfile::default()
        });

        state.record_session(make_session("session-1"));
        state.record_session(make_session("session-2"));

        assert_eq!(state.profile.xp, u64::MAX);
        assert_eq!(state.profile.total_sessions, u64::MAX);
        assert_eq!(state.sessions().len(), 2);
    }
}
