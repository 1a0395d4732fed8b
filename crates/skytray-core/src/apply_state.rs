//! Settings-apply state machine.
//!
//! Only one apply may run at a time; a second request while one is in
//! flight is rejected rather than interleaved.

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyState {
    #[default]
    Idle,
    Applying,
}

impl ApplyState {
    /// True if a new apply can be started.
    pub fn can_start_apply(self) -> bool {
        matches!(self, ApplyState::Idle)
    }

    /// State after an apply finishes, whatever its outcome.
    pub fn on_apply_done(self) -> Self {
        ApplyState::Idle
    }
}

/// Holds the state at `Applying` until dropped.
///
/// Dropping covers early returns and a caller abandoning the apply future.
#[derive(Debug)]
pub struct ApplyGuard<'a> {
    state: &'a Mutex<ApplyState>,
}

impl<'a> ApplyGuard<'a> {
    /// Move `state` to `Applying`, or return `None` if an apply is running.
    pub fn try_begin(state: &'a Mutex<ApplyState>) -> Option<Self> {
        let mut current = state.lock();
        if !current.can_start_apply() {
            return None;
        }
        *current = ApplyState::Applying;
        Some(Self { state })
    }
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        let mut current = self.state.lock();
        *current = current.on_apply_done();
    }
}
