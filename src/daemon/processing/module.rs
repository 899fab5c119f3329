use anyhow::Result;

use crate::daemon::event::FocusEvent;

/// Represents an event processor. This should realistically be able to
/// abstract over different options: local tracking, remote submission.
pub trait EventProcessor {
    fn process_next(&mut self, message: FocusEvent) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
