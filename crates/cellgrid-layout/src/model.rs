//! Grid occupancy model.
//!
//! A [`GridModel`] is a fixed `rows x cols` grid partitioned into
//! rectangular [`GridItem`]s. It focuses on:
//!
//! - Strict validation: a model only exists if item regions are in bounds,
//!   pairwise disjoint, and together cover every cell.
//! - O(1) point lookup through a row-major occupancy table.
//! - Canonical layout snapshots and deterministic state hashes for
//!   diagnostics and stale-preview detection.
//!
//! The model exposes no public mutators. Rearrangement goes through
//! [`crate::engine::RearrangementEngine`], which commits validated plans.

use std::borrow::Borrow;
use std::fmt;

use cellgrid_core::geometry::{CellRect, GridPos, GridSpan};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Current layout snapshot schema version.
pub const GRID_LAYOUT_SCHEMA_VERSION: u16 = 1;

const VACANT: u32 = u32::MAX;

/// Stable identifier for grid items, unchanged across moves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an ID from any string-like value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// One rectangular occupant of the grid.
///
/// `content` is owned by the caller and never interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridItem<T> {
    pub id: ItemId,
    /// Top-left cell of the item's region.
    pub anchor: GridPos,
    pub span: GridSpan,
    pub content: T,
}

impl<T> GridItem<T> {
    /// A plain 1x1 item.
    pub fn new(id: impl Into<ItemId>, anchor: GridPos, content: T) -> Self {
        Self {
            id: id.into(),
            anchor,
            span: GridSpan::ONE,
            content,
        }
    }

    /// An item covering `span` cells from `anchor`.
    pub fn spanning(id: impl Into<ItemId>, anchor: GridPos, span: GridSpan, content: T) -> Self {
        Self {
            id: id.into(),
            anchor,
            span,
            content,
        }
    }

    /// Cells covered by this item.
    #[must_use]
    pub const fn region(&self) -> CellRect {
        CellRect::from_anchor(self.anchor, self.span)
    }

    /// Whether the item covers more than one cell.
    #[must_use]
    pub const fn is_spanning(&self) -> bool {
        !self.span.is_single()
    }
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridInvariantCode {
    UnsupportedSchemaVersion,
    EmptyGrid,
    ZeroSpan,
    DuplicateItemId,
    RegionOutOfBounds,
    Overlap,
    UncoveredCell,
}

/// Layout validation errors.
///
/// Returned when constructing a model from an item set that does not
/// partition the grid, and by commit verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridModelError {
    UnsupportedSchemaVersion {
        version: u16,
    },
    EmptyGrid {
        rows: u16,
        cols: u16,
    },
    ZeroSpan {
        item: ItemId,
    },
    DuplicateItemId {
        item: ItemId,
    },
    RegionOutOfBounds {
        item: ItemId,
        region: CellRect,
        rows: u16,
        cols: u16,
    },
    Overlap {
        cell: GridPos,
        first: ItemId,
        second: ItemId,
    },
    UncoveredCell {
        cell: GridPos,
    },
}

impl GridModelError {
    /// Stable discriminator for reports and logs.
    #[must_use]
    pub const fn code(&self) -> GridInvariantCode {
        match self {
            Self::UnsupportedSchemaVersion { .. } => GridInvariantCode::UnsupportedSchemaVersion,
            Self::EmptyGrid { .. } => GridInvariantCode::EmptyGrid,
            Self::ZeroSpan { .. } => GridInvariantCode::ZeroSpan,
            Self::DuplicateItemId { .. } => GridInvariantCode::DuplicateItemId,
            Self::RegionOutOfBounds { .. } => GridInvariantCode::RegionOutOfBounds,
            Self::Overlap { .. } => GridInvariantCode::Overlap,
            Self::UncoveredCell { .. } => GridInvariantCode::UncoveredCell,
        }
    }
}

impl fmt::Display for GridModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSchemaVersion { version } => write!(
                f,
                "unsupported grid layout schema version {version} (expected {GRID_LAYOUT_SCHEMA_VERSION})"
            ),
            Self::EmptyGrid { rows, cols } => {
                write!(f, "grid must have at least one cell (got {rows}x{cols})")
            }
            Self::ZeroSpan { item } => write!(f, "item {item} has a zero row or column span"),
            Self::DuplicateItemId { item } => write!(f, "duplicate item id {item}"),
            Self::RegionOutOfBounds {
                item,
                region,
                rows,
                cols,
            } => write!(
                f,
                "item {item} region {}x{} at ({}, {}) exceeds {rows}x{cols} grid",
                region.rows, region.cols, region.row, region.col
            ),
            Self::Overlap {
                cell,
                first,
                second,
            } => write!(
                f,
                "items {first} and {second} both cover cell ({}, {})",
                cell.row, cell.col
            ),
            Self::UncoveredCell { cell } => {
                write!(f, "cell ({}, {}) is not covered by any item", cell.row, cell.col)
            }
        }
    }
}

impl std::error::Error for GridModelError {}

/// One actionable invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridInvariantIssue {
    pub code: GridInvariantCode,
    pub item: Option<ItemId>,
    pub related_item: Option<ItemId>,
    pub cell: Option<GridPos>,
    pub message: String,
}

impl From<&GridModelError> for GridInvariantIssue {
    fn from(error: &GridModelError) -> Self {
        let (item, related_item, cell) = match error {
            GridModelError::UnsupportedSchemaVersion { .. } | GridModelError::EmptyGrid { .. } => {
                (None, None, None)
            }
            GridModelError::ZeroSpan { item }
            | GridModelError::DuplicateItemId { item }
            | GridModelError::RegionOutOfBounds { item, .. } => (Some(item.clone()), None, None),
            GridModelError::Overlap {
                cell,
                first,
                second,
            } => (Some(second.clone()), Some(first.clone()), Some(*cell)),
            GridModelError::UncoveredCell { cell } => (None, None, Some(*cell)),
        };
        Self {
            code: error.code(),
            item,
            related_item,
            cell,
            message: error.to_string(),
        }
    }
}

/// Structured invariant report over a candidate layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridInvariantReport {
    pub issues: Vec<GridInvariantIssue>,
}

impl GridInvariantReport {
    /// Return true if any finding exists.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Distinct finding codes in stable order.
    #[must_use]
    pub fn codes(&self) -> Vec<GridInvariantCode> {
        let mut codes: Vec<_> = self.issues.iter().map(|issue| issue.code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}

/// Serializable placement of one item, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItemRecord {
    pub id: ItemId,
    pub anchor: GridPos,
    #[serde(default)]
    pub span: GridSpan,
}

impl GridItemRecord {
    /// Cells covered by this record.
    #[must_use]
    pub const fn region(&self) -> CellRect {
        CellRect::from_anchor(self.anchor, self.span)
    }
}

/// Canonical, content-free layout description.
///
/// Host templates use this to supply pre-merged layouts; renderers read it
/// after each commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayoutSnapshot {
    #[serde(default = "default_layout_version")]
    pub schema_version: u16,
    pub rows: u16,
    pub cols: u16,
    pub items: Vec<GridItemRecord>,
}

fn default_layout_version() -> u16 {
    GRID_LAYOUT_SCHEMA_VERSION
}

impl GridLayoutSnapshot {
    /// Sort items into row-major anchor order.
    pub fn canonicalize(&mut self) {
        self.items
            .sort_by_key(|record| (record.anchor.row, record.anchor.col));
    }

    /// Every invariant violation in this layout, not just the first.
    #[must_use]
    pub fn invariant_report(&self) -> GridInvariantReport {
        let mut errors = Vec::new();
        if self.schema_version != GRID_LAYOUT_SCHEMA_VERSION {
            errors.push(GridModelError::UnsupportedSchemaVersion {
                version: self.schema_version,
            });
        }
        let entries: Vec<_> = self
            .items
            .iter()
            .map(|record| (&record.id, record.region()))
            .collect();
        let (_, scan_errors) = scan_layout(self.rows, self.cols, &entries, false);
        errors.extend(scan_errors);
        GridInvariantReport {
            issues: errors.iter().map(GridInvariantIssue::from).collect(),
        }
    }
}

/// Validated grid partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel<T> {
    rows: u16,
    cols: u16,
    items: Vec<GridItem<T>>,
    /// Row-major cell -> item slot.
    occupancy: Vec<u32>,
    index: FxHashMap<ItemId, usize>,
}

impl<T> GridModel<T> {
    /// Build a model from items that must already partition the grid.
    ///
    /// Items keep the order given here for [`GridModel::all_items`].
    pub fn new(rows: u16, cols: u16, items: Vec<GridItem<T>>) -> Result<Self, GridModelError> {
        let entries: Vec<_> = items.iter().map(|item| (&item.id, item.region())).collect();
        let (occupancy, errors) = scan_layout(rows, cols, &entries, true);
        if let Some(error) = errors.into_iter().next() {
            return Err(error);
        }
        let index = items
            .iter()
            .enumerate()
            .map(|(slot, item)| (item.id.clone(), slot))
            .collect();
        Ok(Self {
            rows,
            cols,
            items,
            occupancy,
            index,
        })
    }

    /// One plain item per cell, placed row-major, with ids `"0"`, `"1"`, ...
    ///
    /// Supplying fewer or more contents than cells fails validation.
    pub fn row_major(
        rows: u16,
        cols: u16,
        contents: impl IntoIterator<Item = T>,
    ) -> Result<Self, GridModelError> {
        if rows == 0 || cols == 0 {
            return Err(GridModelError::EmptyGrid { rows, cols });
        }
        let items = contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let anchor = GridPos::new(
                    u16::try_from(index / usize::from(cols)).unwrap_or(u16::MAX),
                    (index % usize::from(cols)) as u16,
                );
                GridItem::new(index.to_string(), anchor, content)
            })
            .collect();
        Self::new(rows, cols, items)
    }

    /// Build a model from a layout snapshot, attaching caller content per record.
    pub fn from_snapshot(
        mut snapshot: GridLayoutSnapshot,
        mut content: impl FnMut(&GridItemRecord) -> T,
    ) -> Result<Self, GridModelError> {
        if snapshot.schema_version != GRID_LAYOUT_SCHEMA_VERSION {
            return Err(GridModelError::UnsupportedSchemaVersion {
                version: snapshot.schema_version,
            });
        }
        snapshot.canonicalize();
        let items = snapshot
            .items
            .into_iter()
            .map(|record| {
                let content = content(&record);
                GridItem::spanning(record.id, record.anchor, record.span, content)
            })
            .collect();
        Self::new(snapshot.rows, snapshot.cols, items)
    }

    /// Export placement in canonical (row-major anchor) order.
    #[must_use]
    pub fn to_snapshot(&self) -> GridLayoutSnapshot {
        GridLayoutSnapshot {
            schema_version: GRID_LAYOUT_SCHEMA_VERSION,
            rows: self.rows,
            cols: self.cols,
            items: self
                .items_row_major()
                .map(|item| GridItemRecord {
                    id: item.id.clone(),
                    anchor: item.anchor,
                    span: item.span,
                })
                .collect(),
        }
    }

    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.occupancy.len()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a constructed model; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `pos` lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, pos: GridPos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// The item whose region contains `pos`, or `None` when out of bounds.
    #[must_use]
    pub fn item_at(&self, pos: GridPos) -> Option<&GridItem<T>> {
        self.slot_at(pos).map(|slot| &self.items[slot])
    }

    /// Lookup an item by id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&GridItem<T>> {
        self.slot_of(id).map(|slot| &self.items[slot])
    }

    /// Read-only view of all items in construction order.
    #[must_use]
    pub fn all_items(&self) -> &[GridItem<T>] {
        &self.items
    }

    /// Items in row-major anchor order.
    pub fn items_row_major(&self) -> impl Iterator<Item = &GridItem<T>> + '_ {
        self.occupancy
            .iter()
            .enumerate()
            .filter_map(move |(cell, &slot)| {
                let item = &self.items[slot as usize];
                (item.anchor.linear_index(self.cols) == cell).then_some(item)
            })
    }

    /// Spanning items in row-major anchor order.
    pub fn spanning_items(&self) -> impl Iterator<Item = &GridItem<T>> + '_ {
        self.items_row_major().filter(|item| item.is_spanning())
    }

    /// Re-check the partition invariant from scratch.
    pub fn validate(&self) -> Result<(), GridModelError> {
        let entries: Vec<_> = self
            .items
            .iter()
            .map(|item| (&item.id, item.region()))
            .collect();
        let (occupancy, errors) = scan_layout(self.rows, self.cols, &entries, true);
        if let Some(error) = errors.into_iter().next() {
            return Err(error);
        }
        debug_assert_eq!(occupancy, self.occupancy, "occupancy table drifted");
        Ok(())
    }

    /// Structured invariant diagnostics for the current layout.
    #[must_use]
    pub fn invariant_report(&self) -> GridInvariantReport {
        self.to_snapshot().invariant_report()
    }

    /// Deterministic hash of dimensions and placement (content excluded).
    ///
    /// Independent of item construction order.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix(hash: &mut u64, byte: u8) {
            *hash ^= u64::from(byte);
            *hash = hash.wrapping_mul(PRIME);
        }

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                mix(hash, *byte);
            }
        }

        fn mix_u16(hash: &mut u64, value: u16) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_u64(hash: &mut u64, value: u64) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_str(hash: &mut u64, value: &str) {
            mix_u64(hash, value.len() as u64);
            mix_bytes(hash, value.as_bytes());
        }

        let mut hash = OFFSET_BASIS;
        mix_u16(&mut hash, self.rows);
        mix_u16(&mut hash, self.cols);
        mix_u64(&mut hash, self.items.len() as u64);
        for item in self.items_row_major() {
            mix_str(&mut hash, item.id.as_str());
            mix_u16(&mut hash, item.anchor.row);
            mix_u16(&mut hash, item.anchor.col);
            mix_u16(&mut hash, item.span.rows);
            mix_u16(&mut hash, item.span.cols);
        }
        hash
    }

    pub(crate) fn slot_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn slot_at(&self, pos: GridPos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.occupancy[pos.linear_index(self.cols)] as usize)
    }

    pub(crate) fn item_in_slot(&self, slot: usize) -> &GridItem<T> {
        &self.items[slot]
    }

    pub(crate) fn content_in_slot_mut(&mut self, slot: usize) -> &mut T {
        &mut self.items[slot].content
    }

    /// Apply new anchors to the given slots.
    ///
    /// With `verify`, the complete occupancy table for the planned layout is
    /// rebuilt and checked before anything is written; on error the model is
    /// untouched. Without it, only the cells of moved items are rewritten.
    pub(crate) fn commit_anchors(
        &mut self,
        moves: &[(usize, GridPos)],
        verify: bool,
    ) -> Result<(), GridModelError> {
        if verify {
            let mut anchors: Vec<GridPos> = self.items.iter().map(|item| item.anchor).collect();
            for &(slot, anchor) in moves {
                anchors[slot] = anchor;
            }
            let entries: Vec<_> = self
                .items
                .iter()
                .zip(&anchors)
                .map(|(item, anchor)| (&item.id, CellRect::from_anchor(*anchor, item.span)))
                .collect();
            let (occupancy, errors) = scan_layout(self.rows, self.cols, &entries, true);
            if let Some(error) = errors.into_iter().next() {
                return Err(error);
            }
            for (item, anchor) in self.items.iter_mut().zip(anchors) {
                item.anchor = anchor;
            }
            self.occupancy = occupancy;
            return Ok(());
        }

        for &(slot, anchor) in moves {
            self.items[slot].anchor = anchor;
        }
        for &(slot, _) in moves {
            let region = self.items[slot].region();
            for cell in region.cells() {
                self.occupancy[cell.linear_index(self.cols)] = slot as u32;
            }
        }
        Ok(())
    }
}

struct Findings {
    errors: Vec<GridModelError>,
    fail_fast: bool,
}

impl Findings {
    /// Record one error; returns true when scanning should stop.
    fn record(&mut self, error: GridModelError) -> bool {
        self.errors.push(error);
        self.fail_fast
    }
}

/// Build the occupancy table for `entries` (slot = position in the slice)
/// and collect partition violations.
fn scan_layout(
    rows: u16,
    cols: u16,
    entries: &[(&ItemId, CellRect)],
    fail_fast: bool,
) -> (Vec<u32>, Vec<GridModelError>) {
    let mut findings = Findings {
        errors: Vec::new(),
        fail_fast,
    };
    if rows == 0 || cols == 0 {
        findings.record(GridModelError::EmptyGrid { rows, cols });
        return (Vec::new(), findings.errors);
    }

    let mut occupancy = vec![VACANT; usize::from(rows) * usize::from(cols)];
    let mut seen = FxHashSet::default();

    for (slot, &(id, region)) in entries.iter().enumerate() {
        if !seen.insert(id) {
            if findings.record(GridModelError::DuplicateItemId { item: id.clone() }) {
                return (occupancy, findings.errors);
            }
            continue;
        }
        if region.is_empty() {
            if findings.record(GridModelError::ZeroSpan { item: id.clone() }) {
                return (occupancy, findings.errors);
            }
            continue;
        }
        if !region.fits_within(rows, cols) {
            let error = GridModelError::RegionOutOfBounds {
                item: id.clone(),
                region,
                rows,
                cols,
            };
            if findings.record(error) {
                return (occupancy, findings.errors);
            }
            continue;
        }
        for cell in region.cells() {
            let owner = &mut occupancy[cell.linear_index(cols)];
            if *owner == VACANT {
                *owner = slot as u32;
                continue;
            }
            let error = GridModelError::Overlap {
                cell,
                first: entries[*owner as usize].0.clone(),
                second: id.clone(),
            };
            if findings.record(error) {
                return (occupancy, findings.errors);
            }
        }
    }

    for (index, owner) in occupancy.iter().enumerate() {
        if *owner == VACANT {
            let cell = GridPos::from_linear_index(index, cols);
            if findings.record(GridModelError::UncoveredCell { cell }) {
                break;
            }
        }
    }

    (occupancy, findings.errors)
}
