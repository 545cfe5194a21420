//! Flight trace storage.
//!
//! * [`trace_point`] – the input [`Fix`] and the stored [`TracePoint`].
//! * [`trace_store`] – the bounded, thinned [`Trace`] shared by every solver.
//! * [`trace_manager`] – solver-private snapshots of the store.
//! * [`serial`] – wrapping change counters used to detect updates.

pub mod serial;
pub mod trace_manager;
pub mod trace_point;
pub mod trace_store;

pub use serial::Serial;
pub use trace_manager::TraceManager;
pub use trace_point::{Fix, TracePoint};
pub use trace_store::Trace;
