//! Lifecycle violations detected by the adapter itself.
//!
//! These never come from libclang: they are raised when a caller breaks the
//! create/use/dispose contract of a native handle, which libclang would
//! otherwise answer with undefined behavior.

use crate::arena::HandleClass;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for handle bookkeeping.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// A broken handle lifecycle contract.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The handle was used after its native object was disposed.
    #[error("{class} used after it was disposed")]
    #[diagnostic(code(cindex::use_after_dispose))]
    UseAfterDispose { class: HandleClass },

    /// The handle was disposed a second time.
    #[error("{class} disposed twice")]
    #[diagnostic(code(cindex::double_dispose))]
    DoubleDispose { class: HandleClass },

    /// A container was disposed while handles created inside it are alive.
    #[error("{class} still owns {live} live handle(s)")]
    #[diagnostic(
        code(cindex::children_still_live),
        help("dispose every translation unit, token batch and index action created from it first")
    )]
    ChildrenStillLive { class: HandleClass, live: usize },

    /// A value derived from a translation unit outlived a reparse.
    #[error("{class} is stale: derived at epoch {held}, translation unit is at epoch {current}")]
    #[diagnostic(
        code(cindex::stale_handle),
        help("cursors, types, locations and tokens must be obtained again after a reparse")
    )]
    StaleHandle {
        class: HandleClass,
        held: u32,
        current: u32,
    },

    /// The handle was disposed, reparsed or suspended while libclang was
    /// still walking it on behalf of a callback.
    #[error("{class} is in use by a running traversal")]
    #[diagnostic(
        code(cindex::in_use),
        help("dispose or reparse after the visitor or indexer call has returned")
    )]
    InUse { class: HandleClass },

    /// The handle is in a terminal failed state and may only be disposed.
    #[error("{class} is poisoned by a failed reparse; only dispose is allowed")]
    #[diagnostic(code(cindex::poisoned))]
    Poisoned { class: HandleClass },
}
