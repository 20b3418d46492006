//! Browser Surface
//!
//! The handful of page-level touches a top-level controller makes: document
//! title, history entries, scroll offset and full page loads. Overlay
//! controllers never touch the browser.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// State stored in the history entry being left by a push navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    pub prev_path: Option<String>,
    pub prev_scroll_position: Option<f64>,
}

pub trait Browser: Send + Sync {
    /// `scheme://host[:port]` of the current page.
    fn origin(&self) -> String;

    /// Path of the current page.
    fn pathname(&self) -> String;

    fn set_title(&self, title: &str);

    fn history_state(&self) -> Option<HistoryState>;

    fn push_state(&self, state: HistoryState, url: &str);

    fn replace_state(&self, state: HistoryState, url: &str);

    fn scroll_y(&self) -> f64;

    fn scroll_to(&self, y: f64);

    /// Full page load that bypasses the controller.
    fn assign(&self, url: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: String,
    pub state: HistoryState,
}

#[derive(Debug, Default)]
struct MemoryBrowserState {
    title: String,
    entries: Vec<HistoryEntry>,
    scroll_y: f64,
    assigned: Vec<String>,
}

/// Headless browser that records every touch.
#[derive(Debug)]
pub struct MemoryBrowser {
    origin: String,
    state: Mutex<MemoryBrowserState>,
}

impl MemoryBrowser {
    pub fn new(origin: impl Into<String>, initial_path: impl Into<String>) -> Self {
        let state = MemoryBrowserState {
            entries: vec![HistoryEntry {
                url: initial_path.into(),
                state: HistoryState::default(),
            }],
            ..MemoryBrowserState::default()
        };
        Self {
            origin: origin.into(),
            state: Mutex::new(state),
        }
    }

    pub fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.state.lock().entries.clone()
    }

    /// URLs loaded with [`Browser::assign`], oldest first.
    pub fn assigned(&self) -> Vec<String> {
        self.state.lock().assigned.clone()
    }

    /// Simulate the user scrolling the page.
    pub fn set_scroll(&self, y: f64) {
        self.state.lock().scroll_y = y;
    }
}

impl Browser for MemoryBrowser {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn pathname(&self) -> String {
        let state = self.state.lock();
        let url = state.entries.last().map(|e| e.url.as_str()).unwrap_or("/");
        // Strip any query string: history entries are stored as path + search.
        url.split(['?', '#']).next().unwrap_or("/").to_string()
    }

    fn set_title(&self, title: &str) {
        self.state.lock().title = title.to_string();
    }

    fn history_state(&self) -> Option<HistoryState> {
        self.state.lock().entries.last().map(|e| e.state.clone())
    }

    fn push_state(&self, state: HistoryState, url: &str) {
        self.state.lock().entries.push(HistoryEntry {
            url: url.to_string(),
            state,
        });
    }

    fn replace_state(&self, state: HistoryState, url: &str) {
        let mut inner = self.state.lock();
        let entry = HistoryEntry {
            url: url.to_string(),
            state,
        };
        match inner.entries.last_mut() {
            Some(last) => *last = entry,
            None => inner.entries.push(entry),
        }
    }

    fn scroll_y(&self) -> f64 {
        self.state.lock().scroll_y
    }

    fn scroll_to(&self, y: f64) {
        self.state.lock().scroll_y = y;
    }

    fn assign(&self, url: &str) {
        self.state.lock().assigned.push(url.to_string());
    }
}
