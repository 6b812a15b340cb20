//! Validated rearrangement operations over a [`GridModel`].
//!
//! Every mutating operation is planned against the current model first and
//! only then committed, so a rejected call never leaves partial state behind:
//!
//! 1. resolve ids/positions and check shape rules;
//! 2. compute the complete list of anchor changes;
//! 3. commit the list through [`GridModel`], which (by default) rebuilds and
//!    verifies the occupancy table before writing anything.
//!
//! # Displacement order
//!
//! When a spanning item moves, the plain items it lands on are relocated
//! into the cells it leaves. Both cell sets are enumerated row-major (row
//! ascending, then column) and paired index by index. Cells shared by the
//! old and new region stay with the moving item and take no part in the
//! pairing.

use std::fmt;

use cellgrid_core::geometry::{CellRect, GridPos};
use cellgrid_core::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::RearrangeConfig;
use crate::model::{GridItem, GridModel, GridModelError, ItemId};

/// Operation discriminator used in outcomes and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RearrangeKind {
    Swap,
    MoveMerged,
}

/// One item's anchor change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub item: ItemId,
    pub from: GridPos,
    pub to: GridPos,
}

/// Successful operation result.
///
/// A no-op (same source and target) is still a success, with no
/// relocations and `before_hash == after_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RearrangeOutcome {
    pub operation_id: u64,
    pub kind: RearrangeKind,
    pub relocations: Vec<Relocation>,
    pub before_hash: u64,
    pub after_hash: u64,
}

impl RearrangeOutcome {
    /// Whether the grid was left unchanged.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.relocations.is_empty()
    }
}

/// Why an operation was rejected. The model is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RearrangeError {
    /// A position lies outside the grid.
    OutOfBounds { pos: GridPos },
    /// The item's region would not fit at the requested anchor.
    RegionOutOfBounds { item: ItemId, region: CellRect },
    /// The target region intersects another spanning item.
    SpanningConflict { item: ItemId, blocker: ItemId },
    /// A swap touched a spanning item.
    WrongShape { item: ItemId },
    /// No item has this id.
    MissingItem { id: String },
    /// A merged move was requested for a plain item.
    NotSpanning { item: ItemId },
    /// Commit verification found a broken partition.
    Invariant(GridModelError),
}

impl fmt::Display for RearrangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { pos } => {
                write!(f, "position ({}, {}) is outside the grid", pos.row, pos.col)
            }
            Self::RegionOutOfBounds { item, region } => write!(
                f,
                "item {item} does not fit at ({}, {}) with span {}x{}",
                region.row, region.col, region.rows, region.cols
            ),
            Self::SpanningConflict { item, blocker } => {
                write!(f, "item {item} would overlap spanning item {blocker}")
            }
            Self::WrongShape { item } => {
                write!(f, "item {item} spans several cells and cannot be swapped")
            }
            Self::MissingItem { id } => write!(f, "item {id} not found"),
            Self::NotSpanning { item } => write!(f, "item {item} is not a spanning item"),
            Self::Invariant(err) => write!(f, "commit rejected: {err}"),
        }
    }
}

impl std::error::Error for RearrangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Invariant(err) = self {
            return Some(err);
        }
        None
    }
}

/// Dry-run result for moving a spanning item to a candidate anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropzonePreview {
    pub item: ItemId,
    pub anchor: GridPos,
    pub valid: bool,
    /// Plain items that would be displaced, in target row-major order.
    pub affected: Vec<ItemId>,
    /// Where each displaced item (and the moved item itself, last) would go.
    pub relocations: Vec<Relocation>,
    /// State the preview was computed against.
    pub state_hash: u64,
}

impl DropzonePreview {
    /// "N items affected".
    #[must_use]
    pub fn affected_count(&self) -> usize {
        self.affected.len()
    }
}

/// Slot-level plan: (item slot, new anchor).
#[derive(Debug, Default)]
struct MovePlan {
    moves: Vec<(usize, GridPos)>,
}

/// Owned rearrangement engine wrapping one grid.
///
/// Hosts construct one per document and pass it by reference to the drag
/// adapter; there is no global instance.
#[derive(Debug, Clone)]
pub struct RearrangementEngine<T> {
    model: GridModel<T>,
    config: RearrangeConfig,
    operation_counter: u64,
}

impl<T> RearrangementEngine<T> {
    /// Build and validate a grid. An invalid layout is an integration error
    /// and is returned rather than repaired.
    pub fn initialize_grid(
        rows: u16,
        cols: u16,
        initial_items: Vec<GridItem<T>>,
    ) -> Result<Self, GridModelError> {
        GridModel::new(rows, cols, initial_items).map(Self::from_model)
    }

    /// Wrap an already validated model.
    #[must_use]
    pub fn from_model(model: GridModel<T>) -> Self {
        Self {
            model,
            config: RearrangeConfig::default(),
            operation_counter: 0,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RearrangeConfig) -> Self {
        self.config = config.validated();
        self
    }

    #[must_use]
    pub const fn config(&self) -> RearrangeConfig {
        self.config
    }

    /// Read-only model access for rendering and queries.
    #[must_use]
    pub const fn model(&self) -> &GridModel<T> {
        &self.model
    }

    /// Release the model.
    #[must_use]
    pub fn into_model(self) -> GridModel<T> {
        self.model
    }

    #[must_use]
    pub fn item_at(&self, pos: GridPos) -> Option<&GridItem<T>> {
        self.model.item_at(pos)
    }

    #[must_use]
    pub fn all_items(&self) -> &[GridItem<T>] {
        self.model.all_items()
    }

    /// Mutable access to an item's payload. Placement stays engine-owned.
    pub fn content_mut(&mut self, id: &str) -> Option<&mut T> {
        let slot = self.model.slot_of(id)?;
        Some(self.model.content_in_slot_mut(slot))
    }

    /// Exchange two plain items.
    ///
    /// Both positions must resolve to plain items. Positions inside the same
    /// item are a no-op success. Applying the same swap twice restores the
    /// original arrangement.
    pub fn swap_items(
        &mut self,
        from: GridPos,
        to: GridPos,
    ) -> Result<RearrangeOutcome, RearrangeError> {
        let plan = self.plan_swap(from, to)?;
        self.commit(RearrangeKind::Swap, plan)
    }

    /// Every anchor the spanning item `id` could legally move to.
    ///
    /// Anchors are returned row-major and include the current anchor.
    /// Plain or unknown items have no dropzones.
    #[must_use]
    pub fn valid_dropzones(&self, id: &str) -> Vec<GridPos> {
        let Some(slot) = self.model.slot_of(id) else {
            return Vec::new();
        };
        let item = self.model.item_in_slot(slot);
        if !item.is_spanning() {
            return Vec::new();
        }
        let max_row = self.model.rows().saturating_sub(item.span.rows);
        let max_col = self.model.cols().saturating_sub(item.span.cols);
        let mut zones = Vec::new();
        for row in 0..=max_row {
            for col in 0..=max_col {
                let anchor = GridPos::new(row, col);
                if self.check_target(slot, anchor).is_ok() {
                    zones.push(anchor);
                }
            }
        }
        zones
    }

    /// Dry-run of [`RearrangementEngine::move_merged_item`]. Never mutates.
    #[must_use]
    pub fn dropzone_preview(&self, id: &str, anchor: GridPos) -> DropzonePreview {
        let state_hash = self.model.state_hash();
        let item = ItemId::new(id);
        let preview = match self.plan_merged_move(id, anchor) {
            Ok(plan) => {
                let relocations = self.describe(&plan);
                let affected = relocations
                    .iter()
                    .filter(|relocation| relocation.item != item)
                    .map(|relocation| relocation.item.clone())
                    .collect();
                DropzonePreview {
                    item,
                    anchor,
                    valid: true,
                    affected,
                    relocations,
                    state_hash,
                }
            }
            Err(_) => DropzonePreview {
                item,
                anchor,
                valid: false,
                affected: Vec::new(),
                relocations: Vec::new(),
                state_hash,
            },
        };
        trace!(
            item = id,
            row = anchor.row,
            col = anchor.col,
            valid = preview.valid,
            affected = preview.affected.len(),
            "dropzone preview"
        );
        preview
    }

    /// Relocate a spanning item, displacing the plain items it lands on into
    /// the cells it vacates.
    ///
    /// Validity is re-checked here regardless of any earlier preview.
    pub fn move_merged_item(
        &mut self,
        id: &str,
        anchor: GridPos,
    ) -> Result<RearrangeOutcome, RearrangeError> {
        let plan = self.plan_merged_move(id, anchor)?;
        self.commit(RearrangeKind::MoveMerged, plan)
    }

    fn plan_swap(&self, from: GridPos, to: GridPos) -> Result<MovePlan, RearrangeError> {
        let first = self
            .model
            .slot_at(from)
            .ok_or(RearrangeError::OutOfBounds { pos: from })?;
        let second = self
            .model
            .slot_at(to)
            .ok_or(RearrangeError::OutOfBounds { pos: to })?;
        for slot in [first, second] {
            let item = self.model.item_in_slot(slot);
            if item.is_spanning() {
                return Err(RearrangeError::WrongShape {
                    item: item.id.clone(),
                });
            }
        }
        if first == second {
            return Ok(MovePlan::default());
        }
        let first_anchor = self.model.item_in_slot(first).anchor;
        let second_anchor = self.model.item_in_slot(second).anchor;
        Ok(MovePlan {
            moves: vec![(first, second_anchor), (second, first_anchor)],
        })
    }

    fn spanning_slot(&self, id: &str) -> Result<usize, RearrangeError> {
        let slot = self
            .model
            .slot_of(id)
            .ok_or_else(|| RearrangeError::MissingItem { id: id.to_string() })?;
        let item = self.model.item_in_slot(slot);
        if !item.is_spanning() {
            return Err(RearrangeError::NotSpanning {
                item: item.id.clone(),
            });
        }
        Ok(slot)
    }

    /// Bounds fit and no other spanning item in the target region.
    fn check_target(&self, slot: usize, anchor: GridPos) -> Result<CellRect, RearrangeError> {
        let item = self.model.item_in_slot(slot);
        let target = item.region().translated_to(anchor);
        if !target.fits_within(self.model.rows(), self.model.cols()) {
            return Err(RearrangeError::RegionOutOfBounds {
                item: item.id.clone(),
                region: target,
            });
        }
        for cell in target.cells() {
            let Some(occupant) = self.model.slot_at(cell) else {
                continue;
            };
            if occupant == slot {
                continue;
            }
            let other = self.model.item_in_slot(occupant);
            if other.is_spanning() {
                return Err(RearrangeError::SpanningConflict {
                    item: item.id.clone(),
                    blocker: other.id.clone(),
                });
            }
        }
        Ok(target)
    }

    fn plan_merged_move(&self, id: &str, anchor: GridPos) -> Result<MovePlan, RearrangeError> {
        let slot = self.spanning_slot(id)?;
        let target = self.check_target(slot, anchor)?;
        let vacated = self.model.item_in_slot(slot).region();
        if target == vacated {
            return Ok(MovePlan::default());
        }

        let displaced = target
            .cells()
            .filter(|cell| !vacated.contains(*cell))
            .filter_map(|cell| self.model.slot_at(cell));
        let freed = vacated.cells().filter(|cell| !target.contains(*cell));

        let mut moves: Vec<(usize, GridPos)> = displaced.zip(freed).collect();
        debug_assert_eq!(
            moves.len(),
            vacated.cells().filter(|cell| !target.contains(*cell)).count(),
            "displaced items and freed cells must pair one-to-one"
        );
        moves.push((slot, anchor));
        Ok(MovePlan { moves })
    }

    fn describe(&self, plan: &MovePlan) -> Vec<Relocation> {
        plan.moves
            .iter()
            .map(|&(slot, to)| {
                let item = self.model.item_in_slot(slot);
                Relocation {
                    item: item.id.clone(),
                    from: item.anchor,
                    to,
                }
            })
            .collect()
    }

    fn commit(
        &mut self,
        kind: RearrangeKind,
        plan: MovePlan,
    ) -> Result<RearrangeOutcome, RearrangeError> {
        let before_hash = self.model.state_hash();
        let relocations = self.describe(&plan);

        if let Err(err) = self
            .model
            .commit_anchors(&plan.moves, self.config.verify_commits)
        {
            warn!(?kind, error = %err, "rearrangement failed commit verification");
            return Err(RearrangeError::Invariant(err));
        }

        self.operation_counter = self.operation_counter.saturating_add(1);
        let after_hash = if relocations.is_empty() {
            before_hash
        } else {
            self.model.state_hash()
        };
        debug!(
            operation_id = self.operation_counter,
            ?kind,
            relocations = relocations.len(),
            before_hash,
            after_hash,
            "rearrangement committed"
        );

        Ok(RearrangeOutcome {
            operation_id: self.operation_counter,
            kind,
            relocations,
            before_hash,
            after_hash,
        })
    }
}
