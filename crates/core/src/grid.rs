//! Grid module - the token table
//!
//! A `columns x rows` table of [`Token`]s stored as a flat row-major vector
//! (`row * columns + col`). Row 0 is the bottom of the board, so gravity pulls
//! toward lower row indices.
//!
//! The grid is plain data: it knows nothing about matches, scoring or phases.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{BoardError, Result};
use crate::rng::RandomSource;
use crate::types::{Coord, Token};

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    columns: u8,
    rows: u8,
    /// Flat array of cells, row-major order (row * columns + col)
    cells: Vec<Token>,
}

impl Clone for Grid {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns,
            rows: self.rows,
            cells: self.cells.clone(),
        }
    }

    /// Reuses `self`'s allocation, so per-frame snapshots do not allocate.
    fn clone_from(&mut self, source: &Self) {
        self.columns = source.columns;
        self.rows = source.rows;
        self.cells.clone_from(&source.cells);
    }
}

impl Grid {
    /// Create a grid with every cell set to `fill`.
    pub fn new(columns: u8, rows: u8, fill: Token) -> Self {
        Self {
            columns,
            rows,
            cells: vec![fill; columns as usize * rows as usize],
        }
    }

    /// Create a grid by asking `f` for each cell.
    pub fn from_fn(columns: u8, rows: u8, mut f: impl FnMut(Coord) -> Token) -> Self {
        let mut grid = Self::new(columns, rows, Token(0));
        for row in 0..rows {
            for col in 0..columns {
                let idx = grid.index(col, row);
                grid.cells[idx] = f(Coord::new(col, row));
            }
        }
        grid
    }

    /// Fill every cell with an independent uniform token.
    pub fn random(columns: u8, rows: u8, palette_size: u8, rng: &mut impl RandomSource) -> Self {
        Self::from_fn(columns, rows, |_| rng.next_token(palette_size))
    }

    /// Parse a layout of token characters, one line per row, top row first.
    ///
    /// Blank lines and whitespace inside a line are ignored, so layouts can be
    /// written as indented string literals:
    ///
    /// ```
    /// use tui_gems_core::Grid;
    /// use tui_gems_core::types::Token;
    ///
    /// let grid = Grid::parse("
    ///     0 1 2
    ///     3 4 5
    ///     0 0 1
    ///     2 2 3
    /// ").unwrap();
    /// assert_eq!(grid.columns(), 3);
    /// assert_eq!(grid.rows(), 4);
    /// // Row 0 is the last line.
    /// assert_eq!(grid.get(0, 0), Ok(Token(2)));
    /// assert_eq!(grid.get(2, 3), Ok(Token(2)));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<Vec<Token>> = text
            .lines()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
            .filter(|chars| !chars.is_empty())
            .map(|chars| {
                chars
                    .into_iter()
                    .map(|ch| {
                        Token::from_char(ch).ok_or_else(|| {
                            BoardError::InvalidLayout(format!("unexpected character {ch:?}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;

        let Some(first) = lines.first() else {
            return Err(BoardError::InvalidLayout("layout is empty".to_string()));
        };
        let columns = first.len();
        if let Some(bad) = lines.iter().position(|l| l.len() != columns) {
            return Err(BoardError::InvalidLayout(format!(
                "line {} has {} cells, expected {columns}",
                bad + 1,
                lines[bad].len()
            )));
        }
        if columns > u8::MAX as usize || lines.len() > u8::MAX as usize {
            return Err(BoardError::InvalidLayout("layout is too large".to_string()));
        }

        let rows = lines.len() as u8;
        Ok(Self::from_fn(columns as u8, rows, |c| {
            lines[(rows - 1 - c.row) as usize][c.col as usize]
        }))
    }

    #[inline(always)]
    fn index(&self, col: u8, row: u8) -> usize {
        row as usize * self.columns as usize + col as usize
    }

    #[inline(always)]
    fn checked_index(&self, col: u8, row: u8) -> Result<usize> {
        if col >= self.columns || row >= self.rows {
            return Err(BoardError::OutOfBounds { col, row });
        }
        Ok(self.index(col, row))
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.col < self.columns && coord.row < self.rows
    }

    pub fn get(&self, col: u8, row: u8) -> Result<Token> {
        self.checked_index(col, row).map(|idx| self.cells[idx])
    }

    pub fn set(&mut self, col: u8, row: u8, token: Token) -> Result<()> {
        let idx = self.checked_index(col, row)?;
        self.cells[idx] = token;
        Ok(())
    }

    /// Exchange two cells. No adjacency or match validation.
    pub fn swap(&mut self, a: Coord, b: Coord) -> Result<()> {
        let ia = self.checked_index(a.col, a.row)?;
        let ib = self.checked_index(b.col, b.row)?;
        self.cells.swap(ia, ib);
        Ok(())
    }

    /// Unchecked read for scans that already iterate within bounds.
    #[inline(always)]
    pub(crate) fn at(&self, col: u8, row: u8) -> Token {
        self.cells[self.index(col, row)]
    }

    #[inline(always)]
    pub(crate) fn put(&mut self, col: u8, row: u8, token: Token) {
        let idx = self.index(col, row);
        self.cells[idx] = token;
    }

    /// Flat row-major view of the cells.
    pub fn tokens(&self) -> &[Token] {
        &self.cells
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.cells
    }

    /// How many cells hold each token.
    pub fn token_counts(&self) -> BTreeMap<Token, usize> {
        let mut counts = BTreeMap::new();
        for &t in &self.cells {
            *counts.entry(t).or_insert(0) += 1;
        }
        counts
    }

    /// One row as token characters, left to right.
    pub fn row_string(&self, row: u8) -> String {
        (0..self.columns)
            .map(|col| self.at(col, row).as_char())
            .collect()
    }

    /// All rows as token characters, top row first (the [`Grid::parse`] order).
    pub fn row_strings(&self) -> Vec<String> {
        (0..self.rows).rev().map(|row| self.row_string(row)).collect()
    }

    /// Iterate every coordinate in row-major order, bottom row first.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.columns).map(move |col| Coord::new(col, row)))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.row_strings().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}
