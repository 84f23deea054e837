//! Observable fetch state
//!
//! [`FetchState`] is owned by the controller and handed to callers as
//! cloned snapshots. `data` always holds the latest successfully resolved
//! value (or the initial value); it is never cleared by an error or a
//! cancellation.

use std::fmt;
use std::sync::Arc;

use crate::errors::FetchError;

/// The active interpretation of a [`FetchState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchPhase {
    /// An operation is in flight; terminal fields are stale
    Loading,
    /// The latest operation resolved with data
    Success,
    /// The latest operation failed; `error` is set
    Failed,
    /// The latest operation was canceled
    Canceled,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchPhase::Loading => "loading",
            FetchPhase::Success => "success",
            FetchPhase::Failed => "failed",
            FetchPhase::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// Snapshot of a controller's state
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    /// Latest resolved value, or the initial value
    pub data: T,
    /// Error of the latest failed operation
    pub error: Option<Arc<FetchError>>,
    /// Whether an operation is in flight
    pub loading: bool,
    /// Whether the latest operation was canceled
    pub canceled: bool,
}

impl<T> FetchState<T> {
    /// Initial state: loading with the caller-supplied data
    pub fn initial(data: T) -> Self {
        Self {
            data,
            error: None,
            loading: true,
            canceled: false,
        }
    }

    /// Derive the active phase from the flags
    pub fn phase(&self) -> FetchPhase {
        if self.loading {
            FetchPhase::Loading
        } else if self.canceled {
            FetchPhase::Canceled
        } else if self.error.is_some() {
            FetchPhase::Failed
        } else {
            FetchPhase::Success
        }
    }

    /// Whether the state is terminal (not loading)
    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    pub(crate) fn begin_loading(&mut self) {
        self.error = None;
        self.loading = true;
        self.canceled = false;
    }

    pub(crate) fn resolve(&mut self, data: T) {
        self.data = data;
        self.error = None;
        self.loading = false;
        self.canceled = false;
    }

    pub(crate) fn fail(&mut self, error: FetchError) {
        self.error = Some(Arc::new(error));
        self.loading = false;
        self.canceled = false;
    }

    pub(crate) fn cancel(&mut self) {
        self.error = None;
        self.loading = false;
        self.canceled = true;
    }
}
