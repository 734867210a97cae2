mod visibility;

use crate::utils::prelude::*;
use std::path::Path;

pub use visibility::is_visible;

/// A rectangular matrix of single-byte tiles.
///
/// Cells are stored row-major with no embedded newlines; [`Grid::string`]
/// produces the printable, newline-terminated form on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    nrows: usize,
    ncols: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Builds a blank grid of the given dimensions.
    pub fn new(nrows: usize, ncols: usize) -> Result<Grid> {
        if nrows < MIN_ROWS || ncols < MIN_COLS {
            return Err(anyhow!(
                "grid must be at least {MIN_ROWS}x{MIN_COLS}, got {nrows}x{ncols}"
            ));
        }
        Ok(Grid {
            nrows,
            ncols,
            cells: vec![TILE_BLANK; nrows * ncols],
        })
    }

    /// Loads a grid from a map file: one row per line, all lines the same
    /// length, file ends with a newline.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Grid> {
        let text = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("could not open map file {:?}", path.as_ref()))?;
        Grid::from_str(&text)
    }

    /// Parses the printable rectangle format a map file uses.
    pub fn from_str(text: &str) -> Result<Grid> {
        let rows: Vec<&str> = text.split('\n').collect();
        // split('\n') on a string ending in '\n' yields a trailing empty row; drop it.
        let rows: Vec<&str> = if rows.last().map_or(false, |r| r.is_empty()) {
            rows[..rows.len() - 1].to_vec()
        } else {
            rows
        };

        if rows.len() < MIN_ROWS {
            return Err(anyhow!(
                "map has {} rows, but minimum is {MIN_ROWS}",
                rows.len()
            ));
        }
        let ncols = rows[0].len();
        if ncols < MIN_COLS {
            return Err(anyhow!("map has {ncols} cols, but minimum is {MIN_COLS}"));
        }
        if rows.iter().any(|r| r.len() != ncols) {
            return Err(anyhow!("map rows are not all the same width"));
        }

        let mut cells = Vec::with_capacity(rows.len() * ncols);
        for row in &rows {
            cells.extend_from_slice(row.as_bytes());
        }

        Ok(Grid {
            nrows: rows.len(),
            ncols,
            cells,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    fn in_bounds(&self, r: i64, c: i64) -> bool {
        r >= 0 && c >= 0 && (r as usize) < self.nrows && (c as usize) < self.ncols
    }

    fn index(&self, r: usize, c: usize) -> usize {
        r * self.ncols + c
    }

    /// Reads the tile at (r, c); out-of-bounds reads return NUL.
    pub fn get(&self, r: i64, c: i64) -> u8 {
        if self.in_bounds(r, c) {
            self.cells[self.index(r as usize, c as usize)]
        } else {
            0
        }
    }

    /// Writes the tile at (r, c); out-of-bounds writes are no-ops.
    pub fn set(&mut self, r: i64, c: i64, byte: u8) {
        if self.in_bounds(r, c) {
            let idx = self.index(r as usize, c as usize);
            self.cells[idx] = byte;
        }
    }

    /// The direct printable form: rows joined by '\n', with a trailing '\n'.
    pub fn string(&self) -> String {
        let mut out = String::with_capacity(self.nrows * (self.ncols + 1));
        for row in self.cells.chunks(self.ncols) {
            out.push_str(std::str::from_utf8(row).unwrap_or_default());
            out.push('\n');
        }
        out
    }

    /// `out[r,c] = over[r,c]` if `over[r,c] != ' '` and `mask[r,c] != ' '`, else `base[r,c]`.
    ///
    /// `base`, `over`, and `mask` must share dimensions. Aliasing any two of
    /// them is fine since this always allocates a fresh output grid.
    pub fn overlay(base: &Grid, over: &Grid, mask: &Grid) -> Result<Grid> {
        if base.nrows != over.nrows
            || base.ncols != over.ncols
            || base.nrows != mask.nrows
            || base.ncols != mask.ncols
        {
            return Err(anyhow!("overlay: grids must share dimensions"));
        }
        let mut cells = base.cells.clone();
        for i in 0..cells.len() {
            if over.cells[i] != TILE_BLANK && mask.cells[i] != TILE_BLANK {
                cells[i] = over.cells[i];
            }
        }
        Ok(Grid {
            nrows: base.nrows,
            ncols: base.ncols,
            cells,
        })
    }

    /// A blank grid with the same dimensions as `self`.
    pub fn blank_like(&self) -> Grid {
        Grid {
            nrows: self.nrows,
            ncols: self.ncols,
            cells: vec![TILE_BLANK; self.cells.len()],
        }
    }

    /// `out[r,c] = base[r,c]` if visible from (pr, pc), else blank.
    pub fn visible(base: &Grid, pr: i64, pc: i64) -> Grid {
        let mut cells = vec![TILE_BLANK; base.cells.len()];
        for r in 0..base.nrows {
            for c in 0..base.ncols {
                if is_visible(base, r as i64, c as i64, pr, pc) {
                    cells[base.index(r, c)] = base.get(r as i64, c as i64);
                }
            }
        }
        Grid {
            nrows: base.nrows,
            ncols: base.ncols,
            cells,
        }
    }

    pub fn is_spot(byte: u8) -> bool {
        byte == TILE_FLOOR || byte == TILE_PASSAGE || byte == TILE_GOLD || Self::is_player(byte)
    }

    pub fn is_room_spot(byte: u8) -> bool {
        byte == TILE_FLOOR || byte == TILE_GOLD || Self::is_player(byte)
    }

    pub fn is_gold(byte: u8) -> bool {
        byte == TILE_GOLD
    }

    pub fn is_player(byte: u8) -> bool {
        byte.is_ascii_uppercase()
    }

    pub fn is_blank(byte: u8) -> bool {
        byte == TILE_BLANK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_undersized_grid() {
        assert!(Grid::new(2, 5).is_err());
        assert!(Grid::new(5, 2).is_err());
    }

    #[test]
    fn round_trips_through_string() {
        let text = "+---+\n|...|\n+---+\n";
        let grid = Grid::from_str(text).unwrap();
        assert_eq!(grid.nrows(), 3);
        assert_eq!(grid.ncols(), 5);
        assert_eq!(grid.string(), text);
    }

    #[test]
    fn rejects_ragged_rows() {
        let text = "+---+\n|..|\n+---+\n";
        assert!(Grid::from_str(text).is_err());
    }

    #[test]
    fn out_of_bounds_reads_are_nul_and_writes_are_noops() {
        let mut grid = Grid::new(3, 3).unwrap();
        assert_eq!(grid.get(-1, 0), 0);
        assert_eq!(grid.get(0, 99), 0);
        grid.set(-1, 0, b'x');
        grid.set(0, 99, b'x');
        assert_eq!(grid.string(), "   \n   \n   \n");
    }

    #[test]
    fn overlay_identity_with_blank_overlay() {
        let base = Grid::from_str("+---+\n|...|\n+---+\n").unwrap();
        let blank = Grid::new(base.nrows(), base.ncols()).unwrap();
        let out = Grid::overlay(&base, &blank, &blank).unwrap();
        assert_eq!(out, base);
    }

    #[test]
    fn overlay_respects_mask() {
        let base = Grid::new(3, 3).unwrap();
        let mut over = Grid::new(3, 3).unwrap();
        over.set(1, 1, b'*');
        let mut mask_all_blank = Grid::new(3, 3).unwrap();
        let out = Grid::overlay(&base, &over, &mask_all_blank).unwrap();
        // mask is fully blank, so nothing is overlaid even though `over` has a gold tile
        assert_eq!(out.get(1, 1), TILE_BLANK);

        mask_all_blank.set(1, 1, b'.');
        let out = Grid::overlay(&base, &over, &mask_all_blank).unwrap();
        assert_eq!(out.get(1, 1), b'*');
    }
}
