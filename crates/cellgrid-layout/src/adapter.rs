//! Drag-and-drop protocol between a pointer/touch/keyboard source and the
//! [`RearrangementEngine`].
//!
//! ```text
//! Idle -> Dragging -> Hovering* -> (Committed | Canceled) -> Idle
//! ```
//!
//! A host calls [`DragAdapter::start`] when a gesture begins,
//! [`DragAdapter::hover`] as often as it likes while the pointer moves, and
//! [`DragAdapter::drop_at`] (or [`DragAdapter::cancel`]) when it ends. Every
//! call returns a [`DragTransition`] describing what happened. Calls that do
//! not fit the current state are reported as [`DragEffect::Noop`], never as
//! panics.
//!
//! Plain items are dropped through [`adjust_drop_target`]: a drop on or right
//! next to a spanning item is read as targeting that item.

use cellgrid_core::geometry::GridPos;
use cellgrid_core::debug;

use crate::engine::{DropzonePreview, RearrangeError, RearrangeOutcome, RearrangementEngine};
use crate::model::{GridModel, ItemId};

/// Redirect a raw drop position to the anchor of a spanning item when the
/// position is inside it or in the single column right of / row below it.
///
/// Pure; uses the default adjacency reach of one cell.
#[must_use]
pub fn adjust_drop_target<T>(model: &GridModel<T>, raw: GridPos) -> GridPos {
    adjust_drop_target_with(model, raw, crate::config::DEFAULT_ADJACENCY_REACH)
}

/// [`adjust_drop_target`] with an explicit strip width.
///
/// Containment wins. Otherwise the first spanning item in row-major anchor
/// order whose right strip (same rows) or bottom strip (same columns)
/// contains `raw` is chosen. Cells diagonal to a region's corner are not
/// adjacent. Out-of-bounds positions are returned unchanged.
#[must_use]
pub fn adjust_drop_target_with<T>(model: &GridModel<T>, raw: GridPos, reach: u16) -> GridPos {
    let Some(occupant) = model.item_at(raw) else {
        return raw;
    };
    if occupant.is_spanning() {
        return occupant.anchor;
    }
    let reach = reach.max(1);
    model
        .spanning_items()
        .find(|item| {
            let region = item.region();
            region
                .right_strip(reach)
                .is_some_and(|strip| strip.contains(raw))
                || region
                    .bottom_strip(reach)
                    .is_some_and(|strip| strip.contains(raw))
        })
        .map_or(raw, |item| item.anchor)
}

/// Gesture lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item: ItemId,
        source: GridPos,
        spanning: bool,
    },
    Hovering {
        item: ItemId,
        source: GridPos,
        spanning: bool,
        hovered: GridPos,
    },
}

impl DragState {
    fn active(&self) -> Option<(&ItemId, GridPos, bool)> {
        match self {
            Self::Idle => None,
            Self::Dragging {
                item,
                source,
                spanning,
            }
            | Self::Hovering {
                item,
                source,
                spanning,
                ..
            } => Some((item, *source, *spanning)),
        }
    }
}

/// Explicit no-op diagnostics for calls that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragNoopReason {
    IdleWithoutActiveDrag,
    DragAlreadyInProgress,
    SourceOutOfBounds,
}

/// Why a gesture ended without changing the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragCancelReason {
    /// Dropped where it started.
    SameCell,
    /// The engine rejected the drop.
    Rejected(RearrangeError),
    /// The host aborted the gesture.
    Aborted,
    /// Reset from a teardown path.
    Programmatic,
}

/// Effect emitted by one protocol step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEffect {
    Started {
        item: ItemId,
        source: GridPos,
        spanning: bool,
        dropzones: usize,
    },
    Previewed {
        item: ItemId,
        hovered: GridPos,
        /// Where the drop would land after smart adjustment.
        target: GridPos,
        valid: bool,
        affected: usize,
    },
    Committed {
        item: ItemId,
        outcome: RearrangeOutcome,
    },
    Canceled {
        item: Option<ItemId>,
        reason: DragCancelReason,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One protocol transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragState,
    pub to: DragState,
    pub effect: DragEffect,
}

impl DragTransition {
    /// Whether this transition changed the grid.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self.effect, DragEffect::Committed { .. })
    }
}

/// Resolved intent of a plain-item drop.
enum PlainDrop {
    SameCell,
    Swap { from: GridPos, to: GridPos },
}

/// Drives one [`RearrangementEngine`] through start/hover/drop gestures.
///
/// Smart adjustment follows the engine's [`RearrangeConfig`], read on every
/// call so a reconfigured engine takes effect immediately.
///
/// [`RearrangeConfig`]: crate::config::RearrangeConfig
#[derive(Debug, Clone, Default)]
pub struct DragAdapter {
    state: DragState,
    dropzones: Vec<GridPos>,
    preview: Option<DropzonePreview>,
    transition_counter: u64,
}

impl DragAdapter {
    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    /// Dropzones computed at drag start (spanning items only).
    #[must_use]
    pub fn dropzones(&self) -> &[GridPos] {
        &self.dropzones
    }

    /// Most recent spanning-item preview.
    #[must_use]
    pub fn preview(&self) -> Option<&DropzonePreview> {
        self.preview.as_ref()
    }

    /// Begin a gesture on the item covering `source`.
    pub fn start<T>(&mut self, engine: &RearrangementEngine<T>, source: GridPos) -> DragTransition {
        if self.is_active() {
            return self.transition(
                self.state.clone(),
                DragEffect::Noop {
                    reason: DragNoopReason::DragAlreadyInProgress,
                },
            );
        }
        let Some(item) = engine.item_at(source) else {
            return self.transition(
                DragState::Idle,
                DragEffect::Noop {
                    reason: DragNoopReason::SourceOutOfBounds,
                },
            );
        };

        let spanning = item.is_spanning();
        let id = item.id.clone();
        self.dropzones = if spanning {
            engine.valid_dropzones(id.as_str())
        } else {
            Vec::new()
        };
        self.preview = None;
        debug!(
            item = id.as_str(),
            spanning,
            dropzones = self.dropzones.len(),
            "drag started"
        );
        let effect = DragEffect::Started {
            item: id.clone(),
            source,
            spanning,
            dropzones: self.dropzones.len(),
        };
        self.transition(
            DragState::Dragging {
                item: id,
                source,
                spanning,
            },
            effect,
        )
    }

    /// Report the pointer over `pos`.
    ///
    /// For a spanning item `pos` is the candidate anchor and a dropzone
    /// preview is computed (reused while the grid is unchanged). For a plain
    /// item `pos` is the raw cell under the pointer.
    pub fn hover<T>(&mut self, engine: &RearrangementEngine<T>, pos: GridPos) -> DragTransition {
        let Some((item, source, spanning)) = self
            .state
            .active()
            .map(|(item, source, spanning)| (item.clone(), source, spanning))
        else {
            return self.idle_noop();
        };

        let effect = if spanning {
            let preview = self.refresh_preview(engine, &item, pos);
            DragEffect::Previewed {
                item: item.clone(),
                hovered: pos,
                target: pos,
                valid: preview.valid,
                affected: preview.affected_count(),
            }
        } else {
            let (target, valid, affected) = match self.plan_plain_drop(engine, &item, source, pos) {
                PlainDrop::SameCell => (pos, false, 0),
                PlainDrop::Swap { from, to } => match engine.item_at(to) {
                    Some(occupant) if occupant.is_spanning() => {
                        let preview = engine.dropzone_preview(occupant.id.as_str(), from);
                        (to, preview.valid, preview.affected_count())
                    }
                    Some(_) => (to, true, 1),
                    None => (to, false, 0),
                },
            };
            DragEffect::Previewed {
                item: item.clone(),
                hovered: pos,
                target,
                valid,
                affected,
            }
        };

        self.transition(
            DragState::Hovering {
                item,
                source,
                spanning,
                hovered: pos,
            },
            effect,
        )
    }

    /// Finish the gesture at `pos` and commit through the engine.
    ///
    /// Spanning items move with their anchor at `pos`. Plain items are
    /// swapped with the (smart-adjusted) target; when that target is a
    /// spanning item the swap is rejected by the engine and the block is
    /// moved onto the dragged item's cell instead.
    pub fn drop_at<T>(
        &mut self,
        engine: &mut RearrangementEngine<T>,
        pos: GridPos,
    ) -> DragTransition {
        let Some((item, source, spanning)) = self
            .state
            .active()
            .map(|(item, source, spanning)| (item.clone(), source, spanning))
        else {
            return self.idle_noop();
        };

        let result = if spanning {
            let at_anchor = engine
                .model()
                .item(item.as_str())
                .is_some_and(|current| current.anchor == pos);
            (!at_anchor).then(|| engine.move_merged_item(item.as_str(), pos))
        } else {
            match self.plan_plain_drop(engine, &item, source, pos) {
                PlainDrop::SameCell => None,
                PlainDrop::Swap { from, to } => Some(match engine.swap_items(from, to) {
                    Err(RearrangeError::WrongShape { item: block }) if block != item => {
                        engine.move_merged_item(block.as_str(), from)
                    }
                    other => other,
                }),
            }
        };

        let effect = match result {
            None => DragEffect::Canceled {
                item: Some(item),
                reason: DragCancelReason::SameCell,
            },
            Some(Ok(outcome)) => {
                debug!(
                    item = item.as_str(),
                    operation_id = outcome.operation_id,
                    "drag committed"
                );
                DragEffect::Committed { item, outcome }
            }
            Some(Err(err)) => {
                debug!(item = item.as_str(), error = %err, "drag rejected");
                DragEffect::Canceled {
                    item: Some(item),
                    reason: DragCancelReason::Rejected(err),
                }
            }
        };
        self.finish(effect)
    }

    /// Abort the active gesture; the grid is untouched.
    pub fn cancel(&mut self) -> DragTransition {
        let Some((item, _, _)) = self.state.active() else {
            return self.idle_noop();
        };
        let item = item.clone();
        self.finish(DragEffect::Canceled {
            item: Some(item),
            reason: DragCancelReason::Aborted,
        })
    }

    /// Unconditionally reset to Idle, for teardown paths.
    ///
    /// Returns `None` when already idle.
    pub fn force_cancel(&mut self) -> Option<DragTransition> {
        let (item, _, _) = self.state.active()?;
        let item = item.clone();
        Some(self.finish(DragEffect::Canceled {
            item: Some(item),
            reason: DragCancelReason::Programmatic,
        }))
    }

    fn plan_plain_drop<T>(
        &self,
        engine: &RearrangementEngine<T>,
        item: &ItemId,
        source: GridPos,
        raw: GridPos,
    ) -> PlainDrop {
        // The dragged item may have been moved by another commit since start.
        let from = engine
            .model()
            .item(item.as_str())
            .map_or(source, |current| current.anchor);
        if raw == from {
            return PlainDrop::SameCell;
        }
        let config = engine.config();
        let to = if config.smart_adjust {
            adjust_drop_target_with(engine.model(), raw, config.adjacency_reach)
        } else {
            raw
        };
        if to == from {
            return PlainDrop::SameCell;
        }
        PlainDrop::Swap { from, to }
    }

    fn refresh_preview<T>(
        &mut self,
        engine: &RearrangementEngine<T>,
        item: &ItemId,
        anchor: GridPos,
    ) -> &DropzonePreview {
        let state_hash = engine.model().state_hash();
        let stale = self.preview.as_ref().is_none_or(|cached| {
            cached.item != *item || cached.anchor != anchor || cached.state_hash != state_hash
        });
        if stale {
            return self
                .preview
                .insert(engine.dropzone_preview(item.as_str(), anchor));
        }
        self.preview
            .get_or_insert_with(|| engine.dropzone_preview(item.as_str(), anchor))
    }

    fn finish(&mut self, effect: DragEffect) -> DragTransition {
        self.dropzones.clear();
        self.preview = None;
        self.transition(DragState::Idle, effect)
    }

    fn idle_noop(&mut self) -> DragTransition {
        self.transition(
            DragState::Idle,
            DragEffect::Noop {
                reason: DragNoopReason::IdleWithoutActiveDrag,
            },
        )
    }

    fn transition(&mut self, to: DragState, effect: DragEffect) -> DragTransition {
        let from = std::mem::replace(&mut self.state, to.clone());
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to,
            effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RearrangeConfig;
    use crate::model::GridItem;
    use cellgrid_core::geometry::GridSpan;

    fn pos(row: u16, col: u16) -> GridPos {
        GridPos::new(row, col)
    }

    /// 3x3, "4" covers (1,1)-(1,2), "5" removed.
    fn merged_3x3() -> RearrangementEngine<()> {
        let items = (0u16..9)
            .filter(|k| *k != 5)
            .map(|k| {
                let anchor = pos(k / 3, k % 3);
                if k == 4 {
                    GridItem::spanning("4", anchor, GridSpan::new(1, 2), ())
                } else {
                    GridItem::new(k.to_string(), anchor, ())
                }
            })
            .collect();
        RearrangementEngine::initialize_grid(3, 3, items).expect("valid")
    }

    fn id_at(engine: &RearrangementEngine<()>, row: u16, col: u16) -> &str {
        engine
            .item_at(pos(row, col))
            .map(|item| item.id.as_str())
            .expect("covered")
    }

    #[test]
    fn adjust_redirects_inside_span() {
        let engine = merged_3x3();
        assert_eq!(adjust_drop_target(engine.model(), pos(1, 2)), pos(1, 1));
        assert_eq!(adjust_drop_target(engine.model(), pos(1, 1)), pos(1, 1));
    }

    #[test]
    fn adjust_redirects_from_strip_below() {
        let engine = merged_3x3();
        assert_eq!(adjust_drop_target(engine.model(), pos(2, 1)), pos(1, 1));
        assert_eq!(adjust_drop_target(engine.model(), pos(2, 2)), pos(1, 1));
    }

    #[test]
    fn adjust_leaves_unrelated_cells_alone() {
        let engine = merged_3x3();
        for cell in [pos(0, 0), pos(0, 1), pos(0, 2), pos(1, 0), pos(2, 0)] {
            assert_eq!(adjust_drop_target(engine.model(), cell), cell);
        }
        assert_eq!(adjust_drop_target(engine.model(), pos(5, 5)), pos(5, 5));
    }

    #[test]
    fn adjust_uses_right_strip_but_not_corner() {
        let items = vec![
            GridItem::spanning("tall", pos(0, 0), GridSpan::new(2, 1), ()),
            GridItem::new("a", pos(0, 1), ()),
            GridItem::new("b", pos(1, 1), ()),
            GridItem::new("c", pos(2, 0), ()),
            GridItem::new("d", pos(2, 1), ()),
        ];
        let model = GridModel::new(3, 2, items).expect("valid");
        assert_eq!(adjust_drop_target(&model, pos(0, 1)), pos(0, 0));
        assert_eq!(adjust_drop_target(&model, pos(1, 1)), pos(0, 0));
        assert_eq!(adjust_drop_target(&model, pos(2, 0)), pos(0, 0));
        // diagonal to the bottom-right corner
        assert_eq!(adjust_drop_target(&model, pos(2, 1)), pos(2, 1));
    }

    #[test]
    fn adjust_wider_reach() {
        let items = vec![
            GridItem::spanning("wide", pos(0, 0), GridSpan::new(1, 2), ()),
            GridItem::new("a", pos(0, 2), ()),
            GridItem::new("b", pos(0, 3), ()),
        ];
        let model = GridModel::new(1, 4, items).expect("valid");
        assert_eq!(adjust_drop_target_with(&model, pos(0, 3), 1), pos(0, 3));
        assert_eq!(adjust_drop_target_with(&model, pos(0, 3), 2), pos(0, 0));
    }

    #[test]
    fn plain_drag_swaps() {
        let mut engine = merged_3x3();
        let mut adapter = DragAdapter::default();

        let started = adapter.start(&engine, pos(0, 0));
        assert!(matches!(
            started.effect,
            DragEffect::Started {
                spanning: false,
                dropzones: 0,
                ..
            }
        ));
        let hovered = adapter.hover(&engine, pos(2, 0));
        assert!(matches!(
            hovered.effect,
            DragEffect::Previewed { valid: true, .. }
        ));
        assert!(matches!(adapter.state(), DragState::Hovering { .. }));

        let dropped = adapter.drop_at(&mut engine, pos(2, 0));
        assert!(dropped.is_committed());
        assert_eq!(dropped.to, DragState::Idle);
        assert_eq!(id_at(&engine, 0, 0), "6");
        assert_eq!(id_at(&engine, 2, 0), "0");
    }

    #[test]
    fn plain_drop_on_span_moves_block_onto_source() {
        let mut engine = merged_3x3();
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(0, 1));

        let hovered = adapter.hover(&engine, pos(1, 2));
        assert!(matches!(
            hovered.effect,
            DragEffect::Previewed {
                target,
                valid: true,
                affected: 2,
                ..
            } if target == pos(1, 1)
        ));

        let dropped = adapter.drop_at(&mut engine, pos(1, 2));
        assert!(dropped.is_committed());
        assert_eq!(id_at(&engine, 0, 1), "4");
        assert_eq!(id_at(&engine, 0, 2), "4");
        assert_eq!(id_at(&engine, 1, 1), "1");
        assert_eq!(id_at(&engine, 1, 2), "2");
        assert!(engine.model().validate().is_ok());
    }

    #[test]
    fn plain_drop_below_span_is_redirected() {
        let mut engine = merged_3x3();
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(0, 0));
        let dropped = adapter.drop_at(&mut engine, pos(2, 2));
        assert!(dropped.is_committed());
        assert_eq!(id_at(&engine, 0, 0), "4");
        assert_eq!(id_at(&engine, 0, 1), "4");
        assert_eq!(id_at(&engine, 2, 2), "8");
    }

    #[test]
    fn engine_without_smart_adjust_does_not_redirect() {
        let mut engine =
            merged_3x3().with_config(RearrangeConfig::default().with_smart_adjust(false));
        assert!(!engine.config().smart_adjust);
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(0, 0));
        // below the span: plain swap with "8" instead of moving "4"
        let dropped = adapter.drop_at(&mut engine, pos(2, 2));
        assert!(dropped.is_committed());
        assert_eq!(id_at(&engine, 0, 0), "8");
        assert_eq!(id_at(&engine, 2, 2), "0");
        assert_eq!(engine.model().item("4").map(|i| i.anchor), Some(pos(1, 1)));
    }

    #[test]
    fn plain_drop_on_span_without_smart_adjust_still_routes() {
        let mut engine =
            merged_3x3().with_config(RearrangeConfig::default().with_smart_adjust(false));
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(0, 1));
        let dropped = adapter.drop_at(&mut engine, pos(1, 2));
        assert!(dropped.is_committed());
        assert_eq!(id_at(&engine, 0, 1), "4");
        assert_eq!(id_at(&engine, 1, 1), "1");
    }

    #[test]
    fn adjacency_reach_comes_from_engine() {
        let items = vec![
            GridItem::spanning("wide", pos(0, 0), GridSpan::new(1, 2), ()),
            GridItem::new("a", pos(0, 2), ()),
            GridItem::new("b", pos(0, 3), ()),
            GridItem::new("c", pos(1, 0), ()),
            GridItem::new("d", pos(1, 1), ()),
            GridItem::new("e", pos(1, 2), ()),
            GridItem::new("f", pos(1, 3), ()),
        ];
        let mut engine = RearrangementEngine::initialize_grid(2, 4, items)
            .expect("valid")
            .with_config(RearrangeConfig::default().with_adjacency_reach(2));
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(1, 2));
        let hovered = adapter.hover(&engine, pos(0, 3));
        assert!(matches!(
            hovered.effect,
            DragEffect::Previewed { target, .. } if target == pos(0, 0)
        ));
        let dropped = adapter.drop_at(&mut engine, pos(0, 3));
        assert!(dropped.is_committed());
        assert_eq!(engine.model().item("wide").map(|i| i.anchor), Some(pos(1, 2)));
    }

    #[test]
    fn rejected_redirect_cancels_and_keeps_grid() {
        let mut engine = merged_3x3();
        let before = engine.model().clone();
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(0, 2));
        // "4" anchored at (0,2) would overflow the right edge.
        let dropped = adapter.drop_at(&mut engine, pos(1, 1));
        assert!(matches!(
            dropped.effect,
            DragEffect::Canceled {
                reason: DragCancelReason::Rejected(RearrangeError::RegionOutOfBounds { .. }),
                ..
            }
        ));
        assert_eq!(engine.model(), &before);
        assert!(!adapter.is_active());
    }

    #[test]
    fn same_cell_drop_is_cancelled() {
        let mut engine = merged_3x3();
        let hash = engine.model().state_hash();
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(2, 0));
        let dropped = adapter.drop_at(&mut engine, pos(2, 0));
        assert_eq!(
            dropped.effect,
            DragEffect::Canceled {
                item: Some(ItemId::from("6")),
                reason: DragCancelReason::SameCell,
            }
        );
        assert_eq!(engine.model().state_hash(), hash);
    }

    #[test]
    fn spanning_drag_uses_dropzones_and_preview() {
        let mut engine = merged_3x3();
        let mut adapter = DragAdapter::default();
        let started = adapter.start(&engine, pos(1, 2));
        assert!(matches!(
            started.effect,
            DragEffect::Started {
                spanning: true,
                dropzones: 6,
                ..
            }
        ));
        assert_eq!(adapter.dropzones().len(), 6);

        adapter.hover(&engine, pos(0, 2));
        assert_eq!(adapter.preview().map(|p| p.valid), Some(false));
        adapter.hover(&engine, pos(0, 1));
        let preview = adapter.preview().expect("cached");
        assert!(preview.valid);
        assert_eq!(preview.affected_count(), 2);

        let dropped = adapter.drop_at(&mut engine, pos(0, 1));
        assert!(dropped.is_committed());
        assert_eq!(id_at(&engine, 1, 1), "1");
        assert!(adapter.dropzones().is_empty());
        assert!(adapter.preview().is_none());
    }

    #[test]
    fn spanning_drop_at_own_anchor_is_cancelled() {
        let mut engine = merged_3x3();
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(1, 2));
        let dropped = adapter.drop_at(&mut engine, pos(1, 1));
        assert!(matches!(
            dropped.effect,
            DragEffect::Canceled {
                reason: DragCancelReason::SameCell,
                ..
            }
        ));
    }

    #[test]
    fn stale_preview_is_recomputed() {
        let mut engine = merged_3x3();
        let mut adapter = DragAdapter::default();
        adapter.start(&engine, pos(1, 1));
        adapter.hover(&engine, pos(2, 0));
        let first_hash = adapter.preview().map(|p| p.state_hash);

        engine.swap_items(pos(2, 0), pos(0, 0)).expect("plain swap");
        adapter.hover(&engine, pos(2, 0));
        let preview = adapter.preview().expect("recomputed");
        assert_ne!(Some(preview.state_hash), first_hash);
        assert_eq!(preview.affected, vec![ItemId::from("0"), ItemId::from("7")]);
    }

    #[test]
    fn out_of_order_calls_are_noops() {
        let mut engine = merged_3x3();
        let mut adapter = DragAdapter::default();
        let hover = adapter.hover(&engine, pos(0, 0));
        assert_eq!(
            hover.effect,
            DragEffect::Noop {
                reason: DragNoopReason::IdleWithoutActiveDrag
            }
        );
        let dropped = adapter.drop_at(&mut engine, pos(0, 0));
        assert!(matches!(dropped.effect, DragEffect::Noop { .. }));

        adapter.start(&engine, pos(0, 0));
        let again = adapter.start(&engine, pos(0, 1));
        assert_eq!(
            again.effect,
            DragEffect::Noop {
                reason: DragNoopReason::DragAlreadyInProgress
            }
        );
        assert!(adapter.is_active());

        let mut fresh = DragAdapter::default();
        let off_grid = fresh.start(&engine, pos(9, 9));
        assert_eq!(
            off_grid.effect,
            DragEffect::Noop {
                reason: DragNoopReason::SourceOutOfBounds
            }
        );
    }

    #[test]
    fn cancel_and_force_cancel() {
        let engine = merged_3x3();
        let mut adapter = DragAdapter::default();
        assert!(adapter.force_cancel().is_none());

        adapter.start(&engine, pos(1, 1));
        let canceled = adapter.cancel();
        assert!(matches!(
            canceled.effect,
            DragEffect::Canceled {
                reason: DragCancelReason::Aborted,
                ..
            }
        ));
        assert!(!adapter.is_active());

        adapter.start(&engine, pos(0, 0));
        let forced = adapter.force_cancel().expect("was active");
        assert!(matches!(
            forced.effect,
            DragEffect::Canceled {
                reason: DragCancelReason::Programmatic,
                ..
            }
        ));
    }

    #[test]
    fn transition_ids_are_monotonic() {
        let mut engine = merged_3x3();
        let mut adapter = DragAdapter::default();
        let a = adapter.start(&engine, pos(0, 0));
        let b = adapter.hover(&engine, pos(0, 1));
        let c = adapter.drop_at(&mut engine, pos(0, 1));
        assert!(a.transition_id < b.transition_id);
        assert!(b.transition_id < c.transition_id);
        assert_eq!(c.from, b.to);
    }
}
