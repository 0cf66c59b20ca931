//! Runtime used for background commit and notification tasks.

use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};

static SHARED_RT: OnceLock<Runtime> = OnceLock::new();

/// Handle to the ambient tokio runtime, or to a shared fallback runtime when
/// called outside of one (e.g. from a plain acquisition thread).
pub fn runtime_handle() -> std::io::Result<Handle> {
    if let Ok(handle) = Handle::try_current() {
        return Ok(handle);
    }

    if let Some(runtime) = SHARED_RT.get() {
        return Ok(runtime.handle().clone());
    }

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("ink-background")
        .build()?;
    tracing::debug!("started shared ink background runtime");

    // A racing initializer may have won; its runtime is used and ours dropped.
    let _ = SHARED_RT.set(runtime);
    match SHARED_RT.get() {
        Some(runtime) => Ok(runtime.handle().clone()),
        None => Err(std::io::Error::other("shared runtime unavailable")),
    }
}
