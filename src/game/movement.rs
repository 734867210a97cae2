//! The single-step movement primitive that every lowercase direction key
//! reduces to directly, and every uppercase "run" key reduces to by
//! repetition.

use super::Game;
use crate::grid::Grid;
use crate::messenger::Messenger;
use crate::utils::prelude::*;

/// The result of attempting one step in a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing changed: target was out of bounds, a wall, or blank.
    NoOp,
    /// The mover (and possibly a swap partner) moved.
    Moved,
    /// The step's pickup exhausted the world's gold; the game has ended.
    GameOver,
}

/// Maps a keystroke to `(row delta, col delta, is_run)`. `Q` is handled
/// separately by the dispatcher since it isn't a direction.
pub fn direction_for(key: char) -> Option<(i64, i64, bool)> {
    match key {
        'h' => Some((0, -1, false)),
        'H' => Some((0, -1, true)),
        'l' => Some((0, 1, false)),
        'L' => Some((0, 1, true)),
        'j' => Some((1, 0, false)),
        'J' => Some((1, 0, true)),
        'k' => Some((-1, 0, false)),
        'K' => Some((-1, 0, true)),
        'y' => Some((-1, -1, false)),
        'Y' => Some((-1, -1, true)),
        'u' => Some((-1, 1, false)),
        'U' => Some((-1, 1, true)),
        'b' => Some((1, -1, false)),
        'B' => Some((1, -1, true)),
        'n' => Some((1, 1, false)),
        'N' => Some((1, 1, true)),
        _ => None,
    }
}

impl Game {
    /// Attempts one step of `(dr, dc)` for the player `id`: bounds check,
    /// then either a move onto open floor (with pickup), a swap with another
    /// player (with a steal), or a no-op.
    pub(crate) fn try_move(
        &mut self,
        id: char,
        dr: i64,
        dc: i64,
        messenger: &impl Messenger,
    ) -> Result<MoveOutcome> {
        let Some(mover) = self.roster.get_by_id(id) else {
            return Err(anyhow!("try_move: unknown player {id}"));
        };
        let (pr, pc) = (mover.row(), mover.col());
        let (tr, tc) = (pr + dr, pc + dc);

        if tr < 0 || tc < 0 || tr as usize >= self.rows || tc as usize >= self.cols {
            return Ok(MoveOutcome::NoOp);
        }

        let to_tile = self.live_map.get(tr, tc);
        let from_terrain = self.original_map.get(pr, pc);

        if Grid::is_spot(to_tile) && !Grid::is_player(to_tile) {
            if self.piles.has_uncollected(tr, tc) && self.found_gold(id, tr, tc, messenger)? {
                return Ok(MoveOutcome::GameOver);
            }

            self.live_map.set(pr, pc, from_terrain);
            self.live_map.set(tr, tc, id as u8);
            if let Some(mover) = self.roster.get_by_id_mut(id) {
                mover.step(dr, dc, from_terrain);
            }

            self.broadcast_display_all(messenger)?;
            return Ok(MoveOutcome::Moved);
        }

        if Grid::is_player(to_tile) {
            let victim_id = to_tile as char;
            let victim_terrain = self.original_map.get(tr, tc);

            self.steal_gold(id, victim_id, messenger)?;

            self.live_map.set(pr, pc, victim_id as u8);
            self.live_map.set(tr, tc, id as u8);
            if let Some(mover) = self.roster.get_by_id_mut(id) {
                mover.step(dr, dc, from_terrain);
            }
            if let Some(victim) = self.roster.get_by_id_mut(victim_id) {
                victim.step(-dr, -dc, victim_terrain);
            }

            self.broadcast_display_all(messenger)?;
            return Ok(MoveOutcome::Moved);
        }

        Ok(MoveOutcome::NoOp)
    }
}
