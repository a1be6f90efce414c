//! Lifecycle hooks

use super::error::Result;

/// Callback notified when the runtime starts up and shuts down.
///
/// Hooks run sequentially on the thread that triggers the transition. A
/// failing hook is reported as a diagnostic; the remaining hooks still run.
pub trait Hook: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn start_up(&self) -> Result<()>;

    fn shut_down(&self) -> Result<()>;
}
