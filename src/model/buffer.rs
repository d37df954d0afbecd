//! Screen buffer: a fixed grid of cells plus a write cursor

use super::cell::{Cell, Colour, FontSize};
use std::fmt::Write as _;

/// MCDU display rows
pub const MCDU_ROWS: usize = 14;

/// MCDU display columns
pub const MCDU_COLUMNS: usize = 24;

/// Direction the cursor advances after each written character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// A single display row of fixed width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(width: usize) -> Self {
        Self {
            cells: vec![Cell::default(); width],
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn cell_mut(&mut self, column: usize) -> Option<&mut Cell> {
        self.cells.get_mut(column)
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Characters of the row as a string (attributes dropped)
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.character).collect()
    }
}

/// The drawable screen surface for one display
///
/// Dimensions are fixed at construction. Writes outside the grid are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    rows: Vec<Row>,
    columns: usize,
    line: usize,
    column: usize,
    colour: Colour,
    size: FontSize,
    direction: Direction,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(MCDU_ROWS, MCDU_COLUMNS)
    }
}

impl Buffer {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| Row::new(columns)).collect(),
            columns,
            line: 0,
            column: 0,
            colour: Colour::White,
            size: FontSize::Large,
            direction: Direction::LeftToRight,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn size(&self) -> FontSize {
        self.size
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn cell(&self, line: usize, column: usize) -> Option<&Cell> {
        self.rows.get(line).and_then(|r| r.cell(column))
    }

    pub fn cell_mut(&mut self, line: usize, column: usize) -> Option<&mut Cell> {
        self.rows.get_mut(line).and_then(|r| r.cell_mut(column))
    }

    /// Reset every cell and all cursor state to defaults
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
        self.line = 0;
        self.column = 0;
        self.colour = Colour::White;
        self.size = FontSize::Large;
        self.direction = Direction::LeftToRight;
    }

    pub fn clear_row(&mut self, line: usize) {
        if let Some(row) = self.rows.get_mut(line) {
            row.clear();
        }
    }

    /// Move the cursor, clamping to the grid
    pub fn goto(&mut self, line: usize, column: usize) {
        self.line = line.min(self.height().saturating_sub(1));
        self.column = column.min(self.columns.saturating_sub(1));
    }

    pub fn set_colour(&mut self, colour: Colour) -> &mut Self {
        self.colour = colour;
        self
    }

    pub fn set_size(&mut self, size: FontSize) -> &mut Self {
        self.size = size;
        self
    }

    pub fn set_direction(&mut self, direction: Direction) -> &mut Self {
        self.direction = direction;
        self
    }

    /// Write text at the cursor using the current colour and size.
    ///
    /// In right-to-left mode the first character lands at the cursor and
    /// the rest continue leftwards, so the text reads reversed on screen.
    pub fn write(&mut self, text: &str) -> &mut Self {
        // Signed column so right-to-left writes can run off the left edge.
        let mut column = self.column as isize;
        for ch in text.chars() {
            if column >= 0 && (column as usize) < self.columns {
                let cell = Cell::new(ch, self.colour, self.size);
                if let Some(target) = self.cell_mut(self.line, column as usize) {
                    *target = cell;
                }
            }
            match self.direction {
                Direction::LeftToRight => column += 1,
                Direction::RightToLeft => column -= 1,
            }
        }
        self.column = column.clamp(0, self.columns as isize) as usize;
        self
    }

    /// Write text then move to the start of the next line
    pub fn write_line(&mut self, text: &str) -> &mut Self {
        self.write(text);
        self.newline();
        self
    }

    pub fn newline(&mut self) {
        if self.line + 1 < self.height() {
            self.line += 1;
        }
        self.column = match self.direction {
            Direction::LeftToRight => 0,
            Direction::RightToLeft => self.columns.saturating_sub(1),
        };
    }

    /// Write text centred on a line
    pub fn centre_line(&mut self, line: usize, text: &str) -> &mut Self {
        let len = text.chars().count();
        let start = self.columns.saturating_sub(len) / 2;
        let direction = self.direction;
        self.direction = Direction::LeftToRight;
        self.goto(line, start);
        self.write(text);
        self.direction = direction;
        self
    }

    /// Write text so its last character lands in the last column
    pub fn right_align(&mut self, line: usize, text: &str) -> &mut Self {
        let len = text.chars().count();
        let start = self.columns.saturating_sub(len);
        let direction = self.direction;
        self.direction = Direction::LeftToRight;
        self.goto(line, start);
        self.write(text);
        self.direction = direction;
        self
    }

    /// Copy cell content from another buffer of the same dimensions
    pub fn copy_from(&mut self, other: &Buffer) {
        for (dst, src) in self.rows.iter_mut().zip(other.rows.iter()) {
            for (d, s) in dst.cells.iter_mut().zip(src.cells.iter()) {
                *d = *s;
            }
        }
    }

    /// Duplicate-check signature over cell content.
    ///
    /// Cursor and pen state are not part of the signature.
    pub fn signature(&self) -> String {
        let mut sig = String::with_capacity(self.height() * self.columns * 4);
        for row in &self.rows {
            for cell in row.cells() {
                sig.push(cell.character);
                let size = match cell.size {
                    FontSize::Large => 'L',
                    FontSize::Small => 's',
                };
                let _ = write!(sig, "{}{}", cell.colour.index(), size);
            }
            sig.push('\n');
        }
        sig
    }
}
