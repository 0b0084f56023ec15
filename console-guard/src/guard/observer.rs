//! Navigation lifecycle events

use parking_lot::Mutex;

use crate::error::NavigationError;

/// 导航事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Started { from: Option<String>, to: String },
    Redirected { to: String, replace: bool },
    Finished { path: String },
    Failed { to: String, error: NavigationError },
}

/// Receives navigation lifecycle events from the router
pub trait NavigationObserver: Send + Sync {
    fn on_event(&self, event: &NavigationEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl NavigationObserver for TracingObserver {
    fn on_event(&self, event: &NavigationEvent) {
        match event {
            NavigationEvent::Started { from, to } => {
                tracing::debug!(from = from.as_deref().unwrap_or("-"), to = %to, "Navigation started");
            }
            NavigationEvent::Redirected { to, replace } => {
                tracing::debug!(to = %to, replace, "Navigation redirected");
            }
            NavigationEvent::Finished { path } => {
                tracing::info!(path = %path, "Navigation finished");
            }
            NavigationEvent::Failed { to, error } => {
                tracing::error!(to = %to, error = %error, "Navigation failed");
            }
        }
    }
}

/// Keeps every event it sees
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<NavigationEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationEvent> {
        self.events.lock().clone()
    }

    pub fn failures(&self) -> Vec<NavigationError> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                NavigationEvent::Failed { error, .. } => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl NavigationObserver for RecordingObserver {
    fn on_event(&self, event: &NavigationEvent) {
        self.events.lock().push(event.clone());
    }
}
