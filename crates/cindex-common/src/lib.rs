//! Native-independent lifecycle core for the cindex adapter.
//!
//! - [`HandleTable`]: generational table backing every disposable native handle
//! - [`Tracked`]: release-exactly-once wrapper for native strings and arrays
//! - [`LifecycleError`]: the adapter's own contract violations
//! - [`DiagnosticReport`]: compiler diagnostics rendered through `miette`

mod arena;
mod diagnostic;
mod error;
mod tracked;

pub use arena::{HandleClass, HandleTable, Liveness, RawId};
pub use diagnostic::{DiagnosticLevel, DiagnosticReport};
pub use error::{LifecycleError, Result};
pub use tracked::{Release, Tracked};
