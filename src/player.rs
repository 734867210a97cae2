//! One participant's identity, location, purse, and personal visibility.

use crate::grid::Grid;
use crate::messenger::Addr;
use crate::utils::prelude::*;

/// One joined participant. Created on first valid `PLAY`; persists (minus
/// its address) after quitting so the end-game summary stays complete.
#[derive(Clone, Debug)]
pub struct Player {
    id: char,
    name: String,
    address: Option<Addr>,
    row: i64,
    col: i64,
    purse: i32,
    visible_terrain: Grid,
    visible_gold: Grid,
}

impl Player {
    /// Creates a player with the given id (assigned by the roster) and
    /// blank visibility grids sized to the world.
    pub fn new(id: char, world_rows: usize, world_cols: usize) -> Result<Player> {
        Ok(Player {
            id,
            name: String::new(),
            address: None,
            row: 0,
            col: 0,
            purse: 0,
            visible_terrain: Grid::new(world_rows, world_cols)?,
            visible_gold: Grid::new(world_rows, world_cols)?,
        })
    }

    pub fn id(&self) -> char {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Option<Addr> {
        self.address
    }

    pub fn row(&self) -> i64 {
        self.row
    }

    pub fn col(&self) -> i64 {
        self.col
    }

    pub fn purse(&self) -> i32 {
        self.purse
    }

    pub fn visible_terrain(&self) -> &Grid {
        &self.visible_terrain
    }

    pub fn visible_gold(&self) -> &Grid {
        &self.visible_gold
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn set_address(&mut self, addr: Option<Addr>) {
        self.address = addr;
    }

    /// Truncates to `NAME_MAX` bytes, replacing non-printable non-blank
    /// bytes with `_`.
    pub fn set_name(&mut self, raw: &str) {
        let mut bytes: Vec<u8> = raw
            .bytes()
            .map(|b| if b == b' ' || b.is_ascii_graphic() { b } else { b'_' })
            .collect();
        bytes.truncate(NAME_MAX);
        self.name = String::from_utf8_lossy(&bytes).into_owned();
    }

    /// Stores the spawn location and initializes both visibility grids.
    /// `visible_terrain` is the freshly-computed line-of-sight grid around
    /// the spawn point (viewer cell not yet marked); `gold_map` is the
    /// world's current gold layer.
    pub fn init_location(&mut self, mut visible_terrain: Grid, gold_map: &Grid, row: i64, col: i64) {
        self.row = row;
        self.col = col;
        visible_terrain.set(row, col, TILE_VIEWER);
        self.visible_gold =
            Grid::overlay(&visible_terrain.blank_like(), gold_map, &visible_terrain)
                .expect("dimensions match by construction");
        self.visible_terrain = visible_terrain;
    }

    /// The single movement primitive every direction (and the swap path)
    /// reduces to: write `fill_byte` at the cell about to be vacated, apply
    /// the (dr, dc) offset, then mark the new cell `'@'`.
    ///
    /// Because each player's own `step` call only ever touches its own prior
    /// cell, a collision-swap resolves correctly by having each participant
    /// call `step` with its own offset and its own remembered terrain byte.
    /// There is no shared "moveFrom" state to get out of sync.
    pub fn step(&mut self, dr: i64, dc: i64, fill_byte: u8) {
        self.visible_terrain.set(self.row, self.col, fill_byte);
        self.row += dr;
        self.col += dc;
        self.visible_terrain.set(self.row, self.col, TILE_VIEWER);
    }

    /// Adds a signed delta to the purse (positive for pickups, +-1 for steals).
    pub fn found_gold_nuggets(&mut self, delta: i32) {
        self.purse += delta;
    }

    /// Recomputes visibility against the live map: terrain visibility is a
    /// monotone union over the player's lifetime (once seen, stays seen),
    /// while gold visibility is recomputed from scratch every call.
    pub fn update_visibility(&mut self, live_map: &Grid, gold_map: &Grid) -> Result<()> {
        let mut fresh = Grid::visible(live_map, self.row, self.col);
        fresh.set(self.row, self.col, TILE_VIEWER);

        self.visible_terrain = Grid::overlay(&self.visible_terrain, &fresh, &fresh)?;
        self.visible_gold = Grid::overlay(&fresh.blank_like(), gold_map, &fresh)?;
        Ok(())
    }
}
