//! Tracing integration layer.
//!
//! Provides a `tracing_subscriber::Layer` that fires a [`Hook`] for every
//! event the subscriber lets through.

use crate::application::error::HookError;
use crate::application::hook::Hook;
use crate::infrastructure::visitor::EventVisitor;
use std::fmt;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::{layer::Context, Layer};

/// Target of the events this crate emits about itself.
const SELF_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Whether `target` is this crate or one of its modules.
fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(SELF_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Function called when persisting an event fails.
///
/// `Layer` callbacks cannot return errors, so this is where the application
/// decides what a lost entry means to it.
pub type ErrorHandler = Arc<dyn Fn(&HookError) + Send + Sync + 'static>;

/// A `tracing::Layer` that persists every event through a [`Hook`].
///
/// Level filtering belongs to the subscriber: wrap the layer with a filter to
/// persist only some levels.
///
/// ```
/// use tracing_ttl::{ExpirationLevels, Hook, MemoryStore, Options, PersistLayer, Severity};
/// use tracing_subscriber::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let store = Arc::new(MemoryStore::new());
/// let hook = Hook::new(
///     Options::new(store.clone()).with_expiration_levels(
///         ExpirationLevels::new().with(Severity::Debug, Duration::from_secs(3600)),
///     ),
/// )
/// .unwrap();
///
/// let subscriber = tracing_subscriber::registry().with(PersistLayer::new(hook));
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::debug!(user = "alice", "logged in");
/// });
///
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Clone)]
pub struct PersistLayer {
    hook: Arc<Hook>,
    on_error: ErrorHandler,
}

impl PersistLayer {
    /// Create a layer firing `hook`.
    ///
    /// Persistence failures are reported with a `WARN` event by default.
    pub fn new(hook: impl Into<Arc<Hook>>) -> Self {
        Self {
            hook: hook.into(),
            on_error: Arc::new(|err: &HookError| {
                tracing::warn!(error = %err, op = err.op(), "failed to persist log entry");
            }),
        }
    }

    /// Replace the persistence failure handler.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&HookError) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(handler);
        self
    }

    /// The hook this layer fires.
    pub fn hook(&self) -> &Arc<Hook> {
        &self.hook
    }
}

impl fmt::Debug for PersistLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistLayer")
            .field("hook", &self.hook)
            .field("on_error", &"<fn>")
            .finish()
    }
}

impl<S> Layer<S> for PersistLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        // Our own diagnostics would otherwise feed back into the store.
        if is_own_target(event.metadata().target()) {
            return;
        }

        let raw = EventVisitor::visit(event, self.hook.now());
        if let Err(err) = self.hook.fire(&raw) {
            (self.on_error)(&err);
        }
    }
}
