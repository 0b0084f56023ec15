//! Navigation guarding and dispatch

pub mod dispatcher;
pub mod navigation;
pub mod observer;
pub mod router;

pub use dispatcher::NavigationDispatcher;
pub use navigation::{GuardState, NavigationGuard, NavigationOutcome};
pub use observer::{NavigationEvent, NavigationObserver, RecordingObserver, TracingObserver};
pub use router::{NavigationReport, NavigationResult, Router, Transition, TransitionKind};
