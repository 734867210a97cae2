//! Crate-wide constants drawn directly from the game's data model.

/// Total nuggets distributed across all piles at game start.
pub const GOLD_TOTAL: i32 = 250;

/// Minimum number of gold piles generated at game start.
pub const GOLD_MIN_PILES: usize = 10;

/// Maximum number of gold piles generated at game start.
pub const GOLD_MAX_PILES: usize = 30;

/// Maximum number of simultaneous players; also the size of the id alphabet (A..Z).
pub const MAX_PLAYERS: usize = 26;

/// Maximum length, in bytes, of a player's display name after truncation.
pub const NAME_MAX: usize = 50;

/// Minimum grid dimensions in either axis.
pub const MIN_ROWS: usize = 3;
pub const MIN_COLS: usize = 3;

/// Tile alphabet.
pub const TILE_BLANK: u8 = b' ';
pub const TILE_FLOOR: u8 = b'.';
pub const TILE_PASSAGE: u8 = b'#';
pub const TILE_GOLD: u8 = b'*';
pub const TILE_VIEWER: u8 = b'@';
pub const WALL_BYTES: [u8; 3] = [b'|', b'-', b'+'];

/// Largest datagram the wire protocol will ever need to carry: a full
/// DISPLAY message for the largest permitted map.
pub const MAX_BYTES: usize = 65_507;
