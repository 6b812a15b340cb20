#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All coordinates are cell indices on a row/column grid (0-indexed, origin
//! at top-left). Cell enumeration is always row-major: row ascending, then
//! column ascending.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridPos {
    /// Row index (top = 0).
    pub row: u16,
    /// Column index (left = 0).
    pub col: u16,
}

impl GridPos {
    /// Create a new position.
    #[inline]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Row-major linear index on a grid `cols` wide.
    #[inline]
    pub const fn linear_index(self, cols: u16) -> usize {
        self.row as usize * cols as usize + self.col as usize
    }

    /// Inverse of [`GridPos::linear_index`].
    ///
    /// `cols` must be non-zero.
    #[inline]
    pub const fn from_linear_index(index: usize, cols: u16) -> Self {
        let cols = cols as usize;
        Self {
            row: (index / cols) as u16,
            col: (index % cols) as u16,
        }
    }
}

impl From<(u16, u16)> for GridPos {
    fn from((row, col): (u16, u16)) -> Self {
        Self::new(row, col)
    }
}

/// Row/column extent of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridSpan {
    /// Number of rows covered (>= 1 for valid items).
    pub rows: u16,
    /// Number of columns covered (>= 1 for valid items).
    pub cols: u16,
}

impl GridSpan {
    /// The 1x1 span of a plain item.
    pub const ONE: Self = Self { rows: 1, cols: 1 };

    /// Create a new span.
    #[inline]
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Whether this is the 1x1 span.
    #[inline]
    pub const fn is_single(self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    /// Whether either extent is zero.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Number of cells covered.
    #[inline]
    pub const fn area(self) -> u32 {
        self.rows as u32 * self.cols as u32
    }
}

impl Default for GridSpan {
    fn default() -> Self {
        Self::ONE
    }
}

/// A rectangular block of cells: an anchor plus a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellRect {
    /// Top row (inclusive).
    pub row: u16,
    /// Left column (inclusive).
    pub col: u16,
    /// Height in rows.
    pub rows: u16,
    /// Width in columns.
    pub cols: u16,
}

impl CellRect {
    /// Create a new cell rectangle.
    #[inline]
    pub const fn new(row: u16, col: u16, rows: u16, cols: u16) -> Self {
        Self {
            row,
            col,
            rows,
            cols,
        }
    }

    /// Rectangle covering `span` cells from `anchor`.
    #[inline]
    pub const fn from_anchor(anchor: GridPos, span: GridSpan) -> Self {
        Self::new(anchor.row, anchor.col, span.rows, span.cols)
    }

    /// Top-left cell.
    #[inline]
    pub const fn anchor(&self) -> GridPos {
        GridPos::new(self.row, self.col)
    }

    /// Extent as a span.
    #[inline]
    pub const fn span(&self) -> GridSpan {
        GridSpan::new(self.rows, self.cols)
    }

    /// Row just past the bottom edge (exclusive), widened to avoid overflow.
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.row as u32 + self.rows as u32
    }

    /// Column just past the right edge (exclusive), widened to avoid overflow.
    #[inline]
    pub const fn right(&self) -> u32 {
        self.col as u32 + self.cols as u32
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.rows as u32 * self.cols as u32
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Check if a cell is inside the rectangle.
    #[inline]
    pub const fn contains(&self, pos: GridPos) -> bool {
        pos.row >= self.row
            && (pos.row as u32) < self.bottom()
            && pos.col >= self.col
            && (pos.col as u32) < self.right()
    }

    /// Whether the rectangle lies entirely within a `rows x cols` grid.
    #[inline]
    pub const fn fits_within(&self, rows: u16, cols: u16) -> bool {
        !self.is_empty() && self.bottom() <= rows as u32 && self.right() <= cols as u32
    }

    /// Whether two rectangles share at least one cell.
    #[inline]
    pub const fn intersects(&self, other: &CellRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.row as u32) < other.bottom()
            && (other.row as u32) < self.bottom()
            && (self.col as u32) < other.right()
            && (other.col as u32) < self.right()
    }

    /// Same extent, moved so its top-left cell is `anchor`.
    #[inline]
    pub const fn translated_to(&self, anchor: GridPos) -> CellRect {
        CellRect::new(anchor.row, anchor.col, self.rows, self.cols)
    }

    /// Iterate covered cells in row-major order.
    pub fn cells(self) -> impl Iterator<Item = GridPos> {
        let (row, col, rows, cols) = (self.row, self.col, self.rows, self.cols);
        (0..rows).flat_map(move |dr| {
            (0..cols).map(move |dc| GridPos::new(row.saturating_add(dr), col.saturating_add(dc)))
        })
    }

    /// The `reach`-column strip immediately right of this rectangle, covering
    /// the same rows. May extend past the grid; callers bound-check cells.
    #[inline]
    pub fn right_strip(&self, reach: u16) -> Option<CellRect> {
        let col = u16::try_from(self.right()).ok()?;
        Some(CellRect::new(self.row, col, self.rows, reach))
    }

    /// The `reach`-row strip immediately below this rectangle, covering the
    /// same columns. May extend past the grid; callers bound-check cells.
    #[inline]
    pub fn bottom_strip(&self, reach: u16) -> Option<CellRect> {
        let row = u16::try_from(self.bottom()).ok()?;
        Some(CellRect::new(row, self.col, reach, self.cols))
    }
}
