//! WebSocket Client
//!
//! Live station data from the LabMet server. Subscribes as soon as the
//! socket opens and reconnects forever with exponential backoff.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::global::GlobalState;
use super::station::StationPayload;

const INITIAL_BACKOFF_MS: u32 = 1_000;
const MAX_BACKOFF_MS: u32 = 30_000;

/// WebSocket message types from server
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Connected {
        connection_id: String,
    },
    StationData {
        station: StationPayload,
    },
    Subscribed {
        topics: Vec<String>,
    },
    Unsubscribed {
        topics: Vec<String>,
    },
    System {
        message: String,
    },
    Pong,
    Error {
        message: String,
    },
}

/// WebSocket client message types
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topics: Vec<String> },
}

/// Delay before reconnect attempt `attempt` (0-based)
pub fn backoff_delay(attempt: u32) -> u32 {
    INITIAL_BACKOFF_MS
        .saturating_mul(2_u32.saturating_pow(attempt))
        .min(MAX_BACKOFF_MS)
}

/// Topics for the pinned stations, or every station
pub fn subscription_topics(pinned: &[u32]) -> Vec<String> {
    if pinned.is_empty() {
        vec!["stations.*".to_string()]
    } else {
        pinned.iter().map(|id| format!("stations.{}", id)).collect()
    }
}

/// Station ids from a `stations=1,3` query string
pub fn pinned_stations(search: &str) -> Vec<u32> {
    let mut ids: Vec<u32> = search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.strip_prefix("stations="))
        .flat_map(|list| list.split(','))
        .filter_map(|id| id.trim().parse().ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// A socket together with the callbacks it holds
///
/// Dropping it detaches the callbacks before releasing them.
struct Connection {
    ws: WebSocket,
    _on_open: Closure<dyn FnMut(JsValue)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
    }
}

/// WebSocket client for real-time updates
#[derive(Clone)]
pub struct WebSocketClient {
    url: String,
    topics: Vec<String>,
    attempts: Rc<Cell<u32>>,
    /// Current socket; replaced, and so released, on each reconnect
    connection: Rc<RefCell<Option<Connection>>>,
}

impl WebSocketClient {
    pub fn new(url: &str, topics: Vec<String>) -> Self {
        Self {
            url: url.to_string(),
            topics,
            attempts: Rc::new(Cell::new(0)),
            connection: Rc::new(RefCell::new(None)),
        }
    }

    /// Connect to the WebSocket server
    pub fn connect(&self, state: GlobalState) {
        // The previous socket is closed; release its callbacks
        self.connection.borrow_mut().take();

        match WebSocket::new(&self.url) {
            Ok(ws) => {
                let connection = self.setup_handlers(ws, state);
                *self.connection.borrow_mut() = Some(connection);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("WebSocket connection failed: {:?}", e).into());
                state.set_connected(false);
                self.schedule_reconnect(state);
            }
        }
    }

    /// Set up WebSocket event handlers
    fn setup_handlers(&self, ws: WebSocket, state: GlobalState) -> Connection {
        // On open
        let client = self.clone();
        let socket = ws.clone();
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            web_sys::console::log_1(&"WebSocket connected".into());
            client.attempts.set(0);
            state.set_connected(true);

            let subscribe = ClientMessage::Subscribe {
                topics: client.topics.clone(),
            };
            match serde_json::to_string(&subscribe) {
                Ok(json) => {
                    if let Err(e) = socket.send_with_str(&json) {
                        web_sys::console::error_1(&format!("Subscribe failed: {:?}", e).into());
                    }
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Subscribe encoding failed: {}", e).into())
                }
            }
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        // On message
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text_str: String = text.into();
                handle_message(&text_str, &state);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        // On close
        let client = self.clone();
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!("WebSocket closed: code={}, reason={}", event.code(), event.reason())
                    .into(),
            );
            state.set_connected(false);
            client.schedule_reconnect(state);
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        // On error
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Connection {
            ws,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _on_error: on_error,
        }
    }

    /// Schedule a reconnect attempt
    fn schedule_reconnect(&self, state: GlobalState) {
        let attempt = self.attempts.get();
        let delay = backoff_delay(attempt);
        self.attempts.set(attempt.saturating_add(1));

        let client = self.clone();
        // Freed by wasm-bindgen once it has run
        let callback = Closure::once_into_js(move || {
            web_sys::console::log_1(
                &format!("Attempting reconnect (attempt {})", attempt + 1).into(),
            );
            client.connect(state);
        });

        let scheduled = web_sys::window().map(|window| {
            window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay as i32,
            )
        });
        if !matches!(scheduled, Some(Ok(_))) {
            web_sys::console::error_1(&"Could not schedule reconnect".into());
        }
    }
}

/// Handle incoming WebSocket message
fn handle_message(text: &str, state: &GlobalState) {
    match serde_json::from_str::<WsMessage>(text) {
        Ok(msg) => match msg {
            WsMessage::Connected { connection_id } => {
                web_sys::console::log_1(&format!("Connected with ID: {}", connection_id).into());
            }
            WsMessage::StationData { station } => {
                state.apply_payload(station);
            }
            WsMessage::Subscribed { topics } => {
                web_sys::console::log_1(&format!("Subscribed to: {:?}", topics).into());
            }
            WsMessage::Unsubscribed { topics } => {
                web_sys::console::log_1(&format!("Unsubscribed from: {:?}", topics).into());
            }
            WsMessage::System { message } => {
                web_sys::console::log_1(&format!("Server: {}", message).into());
            }
            WsMessage::Pong => {}
            WsMessage::Error { message } => {
                web_sys::console::error_1(&format!("Server error: {}", message).into());
                state.show_error(&message);
            }
        },
        Err(e) => {
            web_sys::console::error_1(&format!("Failed to parse WebSocket message: {}", e).into());
        }
    }
}

/// Initialize WebSocket connection (call from app root)
pub fn init_websocket(state: GlobalState, api_base: &str, pinned: &[u32]) {
    // api_base already contains /api/v1, so just append /ws
    let ws_url = api_base
        .replace("http://", "ws://")
        .replace("https://", "wss://");
    let ws_url = format!("{}/ws", ws_url);

    WebSocketClient::new(&ws_url, subscription_topics(pinned)).connect(state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(0), 1_000);
        assert_eq!(backoff_delay(1), 2_000);
        assert_eq!(backoff_delay(4), 16_000);
        assert_eq!(backoff_delay(5), 30_000);
        assert_eq!(backoff_delay(40), 30_000);
    }

    #[test]
    fn test_subscription_topics() {
        assert_eq!(subscription_topics(&[]), vec!["stations.*"]);
        assert_eq!(
            subscription_topics(&[1, 3]),
            vec!["stations.1", "stations.3"]
        );
    }

    #[test]
    fn test_pinned_stations() {
        assert_eq!(pinned_stations("?stations=3,1,3"), vec![1, 3]);
        assert_eq!(pinned_stations("?theme=dark&stations=2"), vec![2]);
        assert_eq!(pinned_stations("?stations=north"), Vec::<u32>::new());
        assert_eq!(pinned_stations(""), Vec::<u32>::new());
    }

    #[test]
    fn test_decode_station_data() {
        let text = r#"{"type":"station_data","station":{
            "id":2,"collected_at":"06/15/2016T13:45:10","received_at":1,
            "ds18b20_temp":18.0,"bh1750_illuminance":800.0,"analog_soil_moisture":25.0,
            "potential_productivity":2400.0,"obtainable_productivity":1800.0,
            "etc":2.1,"eto":2.64}}"#;

        match serde_json::from_str::<WsMessage>(text).unwrap() {
            WsMessage::StationData { station } => {
                assert_eq!(station.id, 2);
                assert_eq!(station.analog_soil_moisture, Some(25.0));
            }
            other => panic!("Expected StationData, got {:?}", other),
        }
    }
}
