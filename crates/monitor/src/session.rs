use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub type TerminateError = Box<dyn std::error::Error + Send + Sync>;

/// Ends the session when the monitor decides it has been idle too long.
///
/// Implementations must tolerate being called on a session that is already over.
pub trait SessionTerminator: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the logout could not be carried out. The monitor logs it
    /// and still treats the session as terminated.
    fn on_terminate(&self) -> Result<(), TerminateError>;
}

impl<F> SessionTerminator for F
where
    F: Fn() + Send + Sync,
{
    fn on_terminate(&self) -> Result<(), TerminateError> {
        self();
        Ok(())
    }
}

/// Answers whether the authenticated session is still active. Re-read on every poll.
pub trait SessionProbe: Send + Sync {
    fn is_active(&self) -> bool;
}

impl<F> SessionProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_active(&self) -> bool {
        self()
    }
}

/// Shared on/off session flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct SessionFlag(Arc<AtomicBool>);

impl SessionFlag {
    #[must_use]
    pub fn new(active: bool) -> Self {
        Self(Arc::new(AtomicBool::new(active)))
    }

    pub fn set_active(&self, active: bool) {
        self.0.store(active, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl SessionProbe for SessionFlag {
    fn is_active(&self) -> bool {
        self.get()
    }
}
