//! Operation handles and the current-operation slot
//!
//! Every fetch operation is bound to exactly one [`OperationHandle`]: a
//! cancellation token plus a generation number. The [`HandleSlot`] holds the
//! current handle; superseding it cancels the old token and bumps the
//! generation, so a completing operation can tell whether it is still current
//! by comparing generations.

use tokio_util::sync::CancellationToken;

/// Cancellation token bound to one in-flight operation
#[derive(Debug, Clone)]
pub struct OperationHandle {
    generation: u64,
    token: CancellationToken,
}

impl OperationHandle {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            token: CancellationToken::new(),
        }
    }

    /// Generation number identifying this operation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token signalled when this operation is canceled
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether this operation has been canceled
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Slot owning the current operation handle
#[derive(Debug, Default)]
pub struct HandleSlot {
    next_generation: u64,
    current: Option<OperationHandle>,
}

impl HandleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the current handle (if any) and install a fresh one
    pub fn supersede(&mut self) -> OperationHandle {
        self.cancel_current();
        self.next_generation = self.next_generation.wrapping_add(1);
        let handle = OperationHandle::new(self.next_generation);
        self.current = Some(handle.clone());
        handle
    }

    /// Cancel the current handle without replacing it
    ///
    /// Returns `false` when there was nothing to cancel.
    pub fn cancel_current(&mut self) -> bool {
        match &self.current {
            Some(handle) if !handle.is_canceled() => {
                handle.token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Whether `generation` identifies the current handle
    pub fn is_current(&self, generation: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|handle| handle.generation == generation)
    }

    /// Generation of the current handle
    pub fn current_generation(&self) -> Option<u64> {
        self.current.as_ref().map(OperationHandle::generation)
    }
}
