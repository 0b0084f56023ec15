//! Router - 路由器
//!
//! Drives a navigation to completion: asks the dispatcher for a decision,
//! follows redirects, resolves the target view and reports every step to
//! the observer. Nothing here panics or returns `Err`; every navigation ends
//! in a [`NavigationReport`].

use shared::RouteDefinition;
use shared::util::normalize_location;
use std::sync::Arc;

use super::dispatcher::NavigationDispatcher;
use super::navigation::NavigationOutcome;
use super::observer::{NavigationEvent, NavigationObserver};
use crate::error::NavigationError;
use crate::routing::{ResolvedView, ViewResolver};

/// How a redirect changed the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Push,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to: String,
    pub kind: TransitionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationResult {
    Completed {
        path: String,
        route: Option<RouteDefinition>,
        view: Option<ResolvedView>,
    },
    /// The principal stays where they were
    Aborted(NavigationError),
}

/// 导航结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationReport {
    /// Redirects followed, in order
    pub transitions: Vec<Transition>,
    pub result: NavigationResult,
}

impl NavigationReport {
    /// Final path, when the navigation completed
    pub fn path(&self) -> Option<&str> {
        match &self.result {
            NavigationResult::Completed { path, .. } => Some(path),
            NavigationResult::Aborted(_) => None,
        }
    }

    pub fn error(&self) -> Option<&NavigationError> {
        match &self.result {
            NavigationResult::Aborted(e) => Some(e),
            NavigationResult::Completed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.result, NavigationResult::Completed { .. })
    }
}

pub struct Router {
    dispatcher: NavigationDispatcher,
    views: Arc<dyn ViewResolver>,
    observer: Arc<dyn NavigationObserver>,
    max_redirects: usize,
}

impl Router {
    pub fn new(
        dispatcher: NavigationDispatcher,
        views: Arc<dyn ViewResolver>,
        observer: Arc<dyn NavigationObserver>,
    ) -> Self {
        Self {
            dispatcher,
            views,
            observer,
            max_redirects: 8,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn dispatcher(&self) -> &NavigationDispatcher {
        &self.dispatcher
    }

    /// Navigate from `from` to `to`
    pub async fn navigate(&self, from: Option<&str>, to: &str) -> NavigationReport {
        let target = normalize_location(to);
        self.observer.on_event(&NavigationEvent::Started {
            from: from.map(normalize_location),
            to: target.clone(),
        });

        let mut transitions = Vec::new();
        let mut current = target.clone();

        loop {
            let outcome = self.dispatcher.check(from, &current).await;

            let (next, replace) = match outcome {
                NavigationOutcome::Redirect { to, replace } => (to, replace),
                NavigationOutcome::Allow { path, route } => {
                    match route.as_ref().and_then(|r| r.redirect.clone()) {
                        Some(redirect) => (redirect, true),
                        None => return self.finish(transitions, path, route).await,
                    }
                }
                NavigationOutcome::Abort(error) => return self.abort(transitions, &current, error),
            };

            if transitions.len() >= self.max_redirects {
                let error = NavigationError::TooManyRedirects(target.clone());
                return self.abort(transitions, &current, error);
            }

            let next = normalize_location(&next);
            self.observer.on_event(&NavigationEvent::Redirected {
                to: next.clone(),
                replace,
            });
            transitions.push(Transition {
                to: next.clone(),
                kind: if replace {
                    TransitionKind::Replace
                } else {
                    TransitionKind::Push
                },
            });
            current = next;
        }
    }

    async fn finish(
        &self,
        transitions: Vec<Transition>,
        path: String,
        route: Option<RouteDefinition>,
    ) -> NavigationReport {
        let view = match &route {
            Some(route) => match self.views.resolve(&route.view).await {
                Ok(view) => Some(view),
                Err(e) => {
                    let error = NavigationError::ViewLoadFailed {
                        path: path.clone(),
                        view: route.view.to_string(),
                        reason: e.to_string(),
                    };
                    return self.abort(transitions, &path, error);
                }
            },
            None => None,
        };

        self.observer.on_event(&NavigationEvent::Finished { path: path.clone() });
        NavigationReport {
            transitions,
            result: NavigationResult::Completed { path, route, view },
        }
    }

    fn abort(&self, transitions: Vec<Transition>, to: &str, error: NavigationError) -> NavigationReport {
        self.observer.on_event(&NavigationEvent::Failed {
            to: to.to_string(),
            error: error.clone(),
        });
        NavigationReport {
            transitions,
            result: NavigationResult::Aborted(error),
        }
    }
}
