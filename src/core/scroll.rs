//! Auto-follow state for the packet list view.
//!
//! While following, every new row scrolls the view to the bottom. Once the
//! user scrolls away the view is held: ingestion never moves it until the user
//! resumes or scrolls back near the bottom.

use serde::Serialize;

use crate::config::SCROLL_FOLLOW_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScrollState {
    Following,
    Held,
}

/// Side effect the consuming view must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewEffect {
    ScrollToBottom,
}

/// One scroll report from the view, in view units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, serde::Deserialize)]
pub struct ScrollPosition {
    pub offset: f64,
    pub content_height: f64,
    pub viewport_height: f64,
}

impl ScrollPosition {
    pub fn distance_to_bottom(&self) -> f64 {
        self.content_height - self.offset - self.viewport_height
    }
}

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    state: ScrollState,
    threshold: f64,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(SCROLL_FOLLOW_THRESHOLD)
    }
}

impl ScrollTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            state: ScrollState::Following,
            threshold,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn is_following(&self) -> bool {
        self.state == ScrollState::Following
    }

    /// Reports never fire an effect; the view is already where the user put it.
    pub fn report_position(&mut self, position: ScrollPosition) -> ScrollState {
        self.state = if position.distance_to_bottom() < self.threshold {
            ScrollState::Following
        } else {
            ScrollState::Held
        };
        self.state
    }

    pub fn resume(&mut self) -> ViewEffect {
        self.state = ScrollState::Following;
        ViewEffect::ScrollToBottom
    }

    pub fn on_ingest(&self) -> Option<ViewEffect> {
        self.is_following().then_some(ViewEffect::ScrollToBottom)
    }
}
