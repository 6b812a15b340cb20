#![forbid(unsafe_code)]

//! Core: grid geometry and the logging facade shared by cellgrid crates.
//!
//! # Role in cellgrid
//! `cellgrid-core` owns the coordinate vocabulary every other crate speaks:
//! cell positions, span extents, and rectangular cell regions. It has no
//! notion of items or occupancy; that lives in `cellgrid-layout`.
//!
//! # Primary responsibilities
//! - **GridPos / GridSpan / CellRect**: row/column addressed geometry with
//!   row-major cell enumeration.
//! - **Logging**: `tracing` macros when the `tracing` feature is enabled,
//!   zero-cost no-op shims otherwise.

pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
