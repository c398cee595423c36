use crate::cases::ErrorCases;
use crate::error::{ErrorHandlingError, ErrorHandlingErrorExt};
use async_trait::async_trait;
use forum_domain::constants::HOOK_ERROR_HANDLE;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Listener of the `filter:error.handle` hook.
///
/// Receives the current case table and returns it, extended or overridden.
#[async_trait]
pub trait ErrorCasesFilter: Send + Sync {
    async fn filter(&self, cases: ErrorCases) -> Result<ErrorCases, ErrorHandlingError>;
}

#[async_trait]
impl<F> ErrorCasesFilter for F
where
    F: Fn(ErrorCases) -> Result<ErrorCases, ErrorHandlingError> + Send + Sync,
{
    async fn filter(&self, cases: ErrorCases) -> Result<ErrorCases, ErrorHandlingError> {
        self(cases)
    }
}

type Listener = (i32, Arc<dyn ErrorCasesFilter>);

/// Plugin listeners, ordered by ascending priority.
///
/// Cloning shares the listener list.
#[derive(Clone, Default)]
pub struct HookRegistry {
    listeners: Arc<RwLock<Vec<Listener>>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priorities: Vec<i32> = self.listeners.read().iter().map(|(p, _)| *p).collect();
        f.debug_struct("HookRegistry").field("priorities", &priorities).finish()
    }
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Equal priorities run in registration order.
    pub fn register(&self, priority: i32, filter: impl ErrorCasesFilter + 'static) {
        let mut listeners = self.listeners.write();
        let at = listeners.partition_point(|(p, _)| *p <= priority);
        listeners.insert(at, (priority, Arc::new(filter)));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Runs `cases` through every listener in order.
    ///
    /// # Errors
    /// The first listener failure, tagged with the hook name.
    pub async fn fire_error_handle(&self, cases: ErrorCases) -> Result<ErrorCases, ErrorHandlingError> {
        let listeners: Vec<Listener> = self.listeners.read().clone();

        let mut cases = cases;
        for (_, listener) in listeners {
            cases = listener.filter(cases).await.context(HOOK_ERROR_HANDLE)?;
        }
        Ok(cases)
    }
}
