//! Global Application State
//!
//! Reactive state management using Leptos signals.

use leptos::*;

use super::station::{BoardUpdate, StationBoard, StationPayload};

pub const ONLINE_NOTICE: &str = "You are online";
pub const OFFLINE_NOTICE: &str = "You are offline";

/// Global application state provided to all components
#[derive(Clone, Copy)]
pub struct GlobalState {
    /// Station cards
    pub board: RwSignal<StationBoard>,
    /// WebSocket connection status
    pub ws_connected: RwSignal<bool>,
    /// Online/offline announcements
    pub tracker: StoredValue<ConnectionTracker>,
    /// Last station update
    pub last_sync: RwSignal<Option<i64>>,
    /// Broker status reported by the server
    pub broker: RwSignal<Option<String>>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

/// Decides when connection changes are announced
///
/// Starts as if "online" was already announced, so the first connection
/// is silent. Each outage is announced once, and the next connection
/// announces the recovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionTracker {
    offline_announced: bool,
}

impl ConnectionTracker {
    pub fn on_connect(&mut self) -> Option<&'static str> {
        if self.offline_announced {
            self.offline_announced = false;
            Some(ONLINE_NOTICE)
        } else {
            None
        }
    }

    pub fn on_disconnect(&mut self) -> Option<&'static str> {
        if self.offline_announced {
            None
        } else {
            self.offline_announced = true;
            Some(OFFLINE_NOTICE)
        }
    }
}

/// Provide global state to the component tree
pub fn provide_global_state() -> GlobalState {
    let state = GlobalState {
        board: create_rw_signal(StationBoard::default()),
        ws_connected: create_rw_signal(false),
        tracker: store_value(ConnectionTracker::default()),
        last_sync: create_rw_signal(None),
        broker: create_rw_signal(None),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
    state
}

impl GlobalState {
    /// Show new station data
    pub fn apply_payload(&self, payload: StationPayload) {
        let mut outcome = BoardUpdate::Updated;
        self.board.update(|board| outcome = board.apply(&payload));

        match outcome {
            BoardUpdate::Rejected => {
                web_sys::console::warn_1(
                    &format!("Ignoring station {}: dashboard is full", payload.id).into(),
                );
                return;
            }
            BoardUpdate::Replayed => return,
            BoardUpdate::Updated | BoardUpdate::Added => {}
        }
        self.last_sync
            .set(Some(chrono::Utc::now().timestamp_millis()));
    }

    /// Record a socket state change, toasting when it is worth announcing
    pub fn set_connected(&self, connected: bool) {
        self.ws_connected.set(connected);

        let mut notice = None;
        self.tracker.update_value(|tracker| {
            notice = if connected {
                tracker.on_connect()
            } else {
                tracker.on_disconnect()
            };
        });

        match (notice, connected) {
            (Some(message), true) => self.show_success(message),
            (Some(message), false) => self.show_error(message),
            (None, _) => {}
        }
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_connection_is_silent() {
        let mut tracker = ConnectionTracker::default();
        assert_eq!(tracker.on_connect(), None);
    }

    #[test]
    fn test_outage_announced_once() {
        let mut tracker = ConnectionTracker::default();
        assert_eq!(tracker.on_disconnect(), Some(OFFLINE_NOTICE));
        assert_eq!(tracker.on_disconnect(), None);
        assert_eq!(tracker.on_disconnect(), None);

        assert_eq!(tracker.on_connect(), Some(ONLINE_NOTICE));
        assert_eq!(tracker.on_connect(), None);

        assert_eq!(tracker.on_disconnect(), Some(OFFLINE_NOTICE));
    }
}
