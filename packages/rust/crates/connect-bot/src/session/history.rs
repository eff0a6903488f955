//! Back-navigation breadcrumb trail.

use connect_menu::states::{GREETINGS, HISTORY_RESET_STATES, HISTORY_TRANSIENT_STATES};

use super::model::Session;

impl Session {
    /// Record an entered state.
    ///
    /// Reset states wipe the trail, transient states are skipped and consecutive
    /// repeats are collapsed.
    pub fn history_append(&mut self, state: &str) {
        if HISTORY_RESET_STATES.contains(&state) {
            self.history_clear();
            return;
        }
        if HISTORY_TRANSIENT_STATES.contains(&state) {
            return;
        }
        if self.history_state.last().map(String::as_str) != Some(state) {
            self.history_state.push(state.to_string());
        }
    }

    /// Pop the newest entry and point `previous_state` at the new top (GREETINGS when empty).
    pub fn history_back(&mut self) {
        self.history_state.pop();
        self.previous_state = self
            .history_state
            .last()
            .cloned()
            .unwrap_or_else(|| GREETINGS.to_string());
    }

    pub fn history_clear(&mut self) {
        self.history_state.clear();
    }
}
