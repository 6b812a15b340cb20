#![forbid(unsafe_code)]

//! Grid occupancy model and drag-and-drop rearrangement.
//!
//! A fixed `rows x cols` grid is exactly covered by items. Plain items cover
//! one cell; spanning items cover a rectangle. The [`RearrangementEngine`]
//! owns the grid and applies swaps and block moves atomically, and the
//! [`DragAdapter`] turns pointer gestures into engine calls.
//!
//! ```
//! use cellgrid_layout::{GridItem, GridPos, GridSpan, RearrangementEngine};
//!
//! let items = vec![
//!     GridItem::spanning("hero", GridPos::new(0, 0), GridSpan::new(1, 2), "wide"),
//!     GridItem::new("a", GridPos::new(1, 0), "a"),
//!     GridItem::new("b", GridPos::new(1, 1), "b"),
//! ];
//! let mut engine = RearrangementEngine::initialize_grid(2, 2, items)?;
//! let outcome = engine.move_merged_item("hero", GridPos::new(1, 0))?;
//! assert_eq!(outcome.relocations.len(), 3);
//! assert_eq!(engine.item_at(GridPos::new(0, 1)).map(|i| i.id.as_str()), Some("b"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod config;
pub mod engine;
pub mod model;

pub use cellgrid_core::geometry::{CellRect, GridPos, GridSpan};

pub use adapter::{
    DragAdapter, DragCancelReason, DragEffect, DragNoopReason, DragState, DragTransition,
    adjust_drop_target, adjust_drop_target_with,
};
pub use config::{ConfigError, DEFAULT_ADJACENCY_REACH, MAX_ADJACENCY_REACH, RearrangeConfig};
pub use engine::{
    DropzonePreview, RearrangeError, RearrangeKind, RearrangeOutcome, RearrangementEngine,
    Relocation,
};
pub use model::{
    GRID_LAYOUT_SCHEMA_VERSION, GridInvariantCode, GridInvariantIssue, GridInvariantReport,
    GridItem, GridItemRecord, GridLayoutSnapshot, GridModel, GridModelError, ItemId,
};
