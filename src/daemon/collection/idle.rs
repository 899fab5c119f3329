/// What the watcher should do about a user activity report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTransition {
    /// Close the open session, the user walked away.
    Pause,
    /// Re-resolve the active tab and start tracking again.
    Resume,
}

/// Opt-in gate over the content script's activity reports. Disabled (the
/// default) the reports are ignored and sessions keep accumulating while the
/// user is idle, which matches the historical behavior of the extension.
pub struct IdleGate {
    enabled: bool,
    idle: bool,
}

impl IdleGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            idle: false,
        }
    }

    /// Feeds one activity report through the gate. Returns a transition only
    /// when the gate is enabled and the report actually changes state, so
    /// repeated reports don't churn sessions.
    pub fn observe(&mut self, active: bool) -> Option<IdleTransition> {
        if !self.enabled {
            return None;
        }
        match (self.idle, active) {
            (false, false) => {
                self.idle = true;
                Some(IdleTransition::Pause)
            }
            (true, true) => {
                self.idle = false;
                Some(IdleTransition::Resume)
            }
            _ => None,
        }
    }
}
