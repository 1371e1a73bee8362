/// Capture engine lifecycle state.
///
/// State transitions:
/// ```text
/// stopped ⇄ running
///    ↓
/// destroyed (terminal)
/// ```
///
/// `Stopped` is re-enterable: a stopped engine can start a new session with
/// fresh sinks. `Destroyed` is terminal; the hardware source handle has been
/// released and the engine must not be used again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Destroyed,
}

impl EngineState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}
