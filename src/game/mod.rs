//! The orchestrator: owns the map, goldset, roster, spectator slot, and
//! remaining-gold counter, and implements join, movement, pickup, steal,
//! quit, and end-game.

mod movement;

pub use movement::MoveOutcome;

use crate::gold::GoldSet;
use crate::grid::Grid;
use crate::messenger::{Addr, Messenger};
use crate::player::Player;
use crate::roster::Roster;
use crate::utils::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;

pub struct Game {
    original_map: Grid,
    live_map: Grid,
    gold_map: Grid,
    piles: GoldSet,
    roster: Roster,
    spectator: Option<Addr>,
    remaining_gold: i32,
    rows: usize,
    cols: usize,
    rng: ChaCha8Rng,
}

impl Game {
    /// Loads the map, then distributes `GOLD_TOTAL` nuggets across a random
    /// number of piles in `[GOLD_MIN_PILES, GOLD_MAX_PILES]`, seeded
    /// deterministically so the whole run is reproducible from `seed`.
    pub fn new<P: AsRef<Path>>(map_path: P, seed: u64) -> Result<Game> {
        let original_map = Grid::from_file(map_path)?;
        Game::from_map(original_map, seed)
    }

    /// As [`Game::new`], but from an already-loaded map (used by tests and
    /// by the CLI once it has read the file itself).
    pub fn from_map(original_map: Grid, seed: u64) -> Result<Game> {
        let rows = original_map.nrows();
        let cols = original_map.ncols();
        let live_map = original_map.clone();
        let gold_map = original_map.blank_like();
        let rng = ChaCha8Rng::seed_from_u64(seed);

        let mut game = Game {
            original_map,
            live_map,
            gold_map,
            piles: GoldSet::new(),
            roster: Roster::new(),
            spectator: None,
            remaining_gold: GOLD_TOTAL,
            rows,
            cols,
            rng,
        };
        game.scatter_gold()?;
        Ok(game)
    }

    fn scatter_gold(&mut self) -> Result<()> {
        let n = self.rng.gen_range(GOLD_MIN_PILES..=GOLD_MAX_PILES);
        let mut allocated = 0i32;
        for i in 0..n {
            let nuggets = if i + 1 < n {
                let max_remaining = GOLD_TOTAL - allocated - (n - 1 - i) as i32;
                self.rng.gen_range(1..=max_remaining)
            } else {
                GOLD_TOTAL - allocated
            };
            allocated += nuggets;

            let (row, col) = self.random_room_spot(|game, r, c| !game.piles.occupied(r, c))?;
            self.piles.add_pile(row, col, nuggets);
            self.gold_map.set(row, col, TILE_GOLD);
        }
        Ok(())
    }

    /// Uniform rejection sampling over an in-bounds room-spot cell
    /// satisfying an extra predicate (no gold already there, no player
    /// already there, etc).
    fn random_room_spot(
        &mut self,
        extra: impl Fn(&Game, i64, i64) -> bool,
    ) -> Result<(i64, i64)> {
        // Bounded so a pathological map (too little floor) can't hang the
        // server forever; in practice room density is well above this.
        for _ in 0..1_000_000 {
            let r = self.rng.gen_range(0..self.rows) as i64;
            let c = self.rng.gen_range(0..self.cols) as i64;
            if Grid::is_room_spot(self.original_map.get(r, c)) && extra(self, r, c) {
                return Ok((r, c));
            }
        }
        Err(anyhow!("map has too little open floor to place gold/spawns"))
    }

    pub fn remaining_gold(&self) -> i32 {
        self.remaining_gold
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn piles(&self) -> &GoldSet {
        &self.piles
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn spectator(&self) -> Option<Addr> {
        self.spectator
    }

    pub fn live_map(&self) -> &Grid {
        &self.live_map
    }

    /// Adds (or replaces) the single spectator slot.
    pub fn add_spectator(&mut self, addr: Addr, messenger: &impl Messenger) -> Result<()> {
        if self.roster.get_by_address(addr).is_some() {
            messenger.send(addr, "ERROR You are already a player.");
            return Ok(());
        }
        if let Some(prev) = self.spectator {
            if prev != addr {
                messenger.send(prev, "QUIT You have been replaced by a new spectator.");
            }
        }
        self.spectator = Some(addr);

        messenger.send(addr, &format!("GRID {} {}", self.rows, self.cols));
        messenger.send(addr, &format!("GOLD 0 0 {}", self.remaining_gold));
        let display = Grid::overlay(&self.live_map, &self.gold_map, &self.gold_map)?;
        messenger.send(addr, &format!("DISPLAY\n{}", display.string()));
        Ok(())
    }

    /// Joins a new player from a raw `PLAY <name>` payload (name is
    /// everything after `PLAY `). Returns `true` if this join's immediate
    /// pickup exhausted the world's gold and ended the game.
    pub fn add_player(&mut self, addr: Addr, name: &str, messenger: &impl Messenger) -> Result<bool> {
        if self.roster.get_by_address(addr).is_some() {
            messenger.send(addr, "ERROR You are already playing.");
            return Ok(false);
        }
        if self.roster.is_full() {
            messenger.send(addr, "QUIT Game is full: no more players can join.");
            return Ok(false);
        }
        if Some(addr) == self.spectator {
            messenger.send(addr, "ERROR Invalid key for spectator.");
            return Ok(false);
        }
        let name = name.trim();
        if name.is_empty() {
            messenger.send(addr, "QUIT Sorry - you must provide player's name.");
            return Ok(false);
        }

        let id = self.roster.next_id().expect("checked is_full above");
        let mut player = Player::new(id, self.rows, self.cols)?;
        player.set_name(name);
        player.set_address(Some(addr));

        let (row, col) = self.random_room_spot(|game, r, c| !Grid::is_player(game.live_map.get(r, c)))?;
        self.live_map.set(row, col, id as u8);
        let vis = Grid::visible(&self.live_map, row, col);
        player.init_location(vis, &self.gold_map, row, col);
        self.roster.add_player(player);

        messenger.send(addr, &format!("OK {id}"));
        messenger.send(addr, &format!("GRID {} {}", self.rows, self.cols));

        let game_over = if self.piles.has_uncollected(row, col) {
            self.found_gold(id, row, col, messenger)?
        } else {
            messenger.send(addr, &format!("GOLD 0 0 {}", self.remaining_gold));
            false
        };

        if let Some(player) = self.roster.get_by_id_mut(id) {
            player.update_visibility(&self.live_map, &self.gold_map)?;
            let view = Grid::overlay(player.visible_terrain(), player.visible_gold(), player.visible_terrain())?;
            messenger.send(addr, &format!("DISPLAY\n{}", view.string()));
        }

        self.broadcast_display_all(messenger)?;
        Ok(game_over)
    }

    /// Dispatches one keystroke for `addr`. Returns `true` if the game just
    /// ended (the whole server loop should stop).
    pub fn key_press(&mut self, addr: Addr, key: char, messenger: &impl Messenger) -> Result<bool> {
        if key == 'Q' {
            self.quit(addr, messenger)?;
            return Ok(false);
        }

        if Some(addr) == self.spectator {
            messenger.send(addr, "ERROR unknown keystroke for spectator.");
            return Ok(false);
        }

        let Some(id) = self.roster.get_by_address(addr).map(Player::id) else {
            messenger.send(addr, "ERROR Please start PLAY or SPECTATE first.");
            return Ok(false);
        };

        let Some((dr, dc, is_run)) = movement::direction_for(key) else {
            messenger.send(addr, "ERROR Command not recognized.");
            return Ok(false);
        };

        if !is_run {
            return Ok(matches!(
                self.try_move(id, dr, dc, messenger)?,
                MoveOutcome::GameOver
            ));
        }

        loop {
            match self.try_move(id, dr, dc, messenger)? {
                MoveOutcome::Moved => continue,
                MoveOutcome::GameOver => return Ok(true),
                MoveOutcome::NoOp => return Ok(false),
            }
        }
    }

    fn quit(&mut self, addr: Addr, messenger: &impl Messenger) -> Result<()> {
        if Some(addr) == self.spectator {
            messenger.send(addr, "QUIT Thanks for watching!");
            self.spectator = None;
            return Ok(());
        }

        let Some(player) = self.roster.get_by_address_mut(addr) else {
            messenger.send(addr, "ERROR Please start PLAY or SPECTATE first.");
            return Ok(());
        };

        let (row, col, purse) = (player.row(), player.col(), player.purse());
        let original_terrain = self.original_map.get(row, col);
        self.live_map.set(row, col, original_terrain);

        if purse > 0 {
            self.gold_map.set(row, col, TILE_GOLD);
            self.piles.add_pile(row, col, purse);
            self.remaining_gold += purse;
        }

        if let Some(player) = self.roster.get_by_address_mut(addr) {
            player.set_address(None);
            if purse > 0 {
                player.found_gold_nuggets(-purse);
            }
        }
        messenger.send(addr, "QUIT Thanks for playing!");

        if purse > 0 {
            self.roster.broadcast_gold_status(self.remaining_gold, messenger);
        }
        self.broadcast_display_all(messenger)?;
        Ok(())
    }

    /// Marks a pile collected, updates purse/remaining gold, and fans out
    /// the resulting `GOLD` messages. Returns `true` if this pickup emptied
    /// the world (the caller must stop the server loop after this).
    pub(crate) fn found_gold(
        &mut self,
        id: char,
        row: i64,
        col: i64,
        messenger: &impl Messenger,
    ) -> Result<bool> {
        let nuggets = self.piles.find_and_collect(row, col).unwrap_or(0);
        self.remaining_gold -= nuggets;
        self.gold_map.set(row, col, TILE_BLANK);

        let (addr, purse) = {
            let player = self
                .roster
                .get_by_id_mut(id)
                .ok_or_else(|| anyhow!("found_gold: unknown player {id}"))?;
            player.found_gold_nuggets(nuggets);
            (player.address(), player.purse())
        };

        if self.remaining_gold == 0 {
            self.end_game(messenger);
            return Ok(true);
        }

        if let Some(addr) = addr {
            messenger.send(addr, &format!("GOLD {nuggets} {purse} {}", self.remaining_gold));
        }
        if let Some(spectator) = self.spectator {
            messenger.send(spectator, &format!("GOLD 0 0 {}", self.remaining_gold));
        }
        for other in self.roster.iter() {
            if other.id() == id {
                continue;
            }
            if let Some(addr) = other.address() {
                messenger.send(addr, &format!("GOLD 0 {} {}", other.purse(), self.remaining_gold));
            }
        }
        Ok(false)
    }

    /// Transfers exactly one nugget from `victim` to `thief`, unless the
    /// victim has nothing to steal.
    pub(crate) fn steal_gold(&mut self, thief: char, victim: char, messenger: &impl Messenger) -> Result<()> {
        let victim_purse = self
            .roster
            .get_by_id(victim)
            .ok_or_else(|| anyhow!("steal_gold: unknown victim {victim}"))?
            .purse();

        if victim_purse <= 0 {
            if let Some(thief_player) = self.roster.get_by_id(thief) {
                if let Some(addr) = thief_player.address() {
                    messenger.send(
                        addr,
                        &format!("GOLDSTEAL 0 {} {} {victim}", thief_player.purse(), self.remaining_gold),
                    );
                }
            }
            return Ok(());
        }

        if let Some(p) = self.roster.get_by_id_mut(thief) {
            p.found_gold_nuggets(1);
        }
        if let Some(p) = self.roster.get_by_id_mut(victim) {
            p.found_gold_nuggets(-1);
        }

        if let Some(p) = self.roster.get_by_id(thief) {
            if let Some(addr) = p.address() {
                messenger.send(addr, &format!("GOLDSTEAL 1 {} {} {victim}", p.purse(), self.remaining_gold));
            }
        }
        if let Some(p) = self.roster.get_by_id(victim) {
            if let Some(addr) = p.address() {
                messenger.send(addr, &format!("GOLDSTEAL -1 {} {} {thief}", p.purse(), self.remaining_gold));
            }
        }
        Ok(())
    }

    /// Broadcasts a fresh `DISPLAY` to every connected player and the
    /// spectator (if any).
    pub(crate) fn broadcast_display_all(&mut self, messenger: &impl Messenger) -> Result<()> {
        self.roster.broadcast_display(&self.live_map, &self.gold_map, messenger)?;
        if let Some(addr) = self.spectator {
            let display = Grid::overlay(&self.live_map, &self.gold_map, &self.gold_map)?;
            messenger.send(addr, &format!("DISPLAY\n{}", display.string()));
        }
        Ok(())
    }

    /// Triggered once `remaining_gold` first reaches zero: builds and sends
    /// the summary to the spectator and every still-connected player.
    fn end_game(&mut self, messenger: &impl Messenger) {
        let summary = self.roster.build_game_over_summary();
        if let Some(addr) = self.spectator {
            messenger.send(addr, &summary);
        }
        for player in self.roster.iter() {
            if let Some(addr) = player.address() {
                messenger.send(addr, &summary);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::test_support::ChannelMessenger;
    use std::net::SocketAddr;

    fn addr(port: u16) -> Addr {
        Addr(SocketAddr::from(([127, 0, 0, 1], port)))
    }

    fn small_map() -> Grid {
        Grid::from_str("+-----+\n|.....|\n|.....|\n|.....|\n+-----+\n").unwrap()
    }

    #[test]
    fn gold_conservation_holds_after_scatter() {
        let game = Game::from_map(small_map(), 42).unwrap();
        let total: i32 = game.piles.iter().map(|p| p.nuggets).sum();
        assert_eq!(total, GOLD_TOTAL);
        assert!(game.piles.len() >= GOLD_MIN_PILES && game.piles.len() <= GOLD_MAX_PILES);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = Game::from_map(small_map(), 7).unwrap();
        let b = Game::from_map(small_map(), 7).unwrap();
        assert_eq!(a.gold_map.string(), b.gold_map.string());
    }

    #[test]
    fn full_roster_rejects_further_joins() {
        let mut game = Game::from_map(small_map(), 1).unwrap();
        let messenger = ChannelMessenger::new();
        for i in 0..MAX_PLAYERS {
            game.add_player(addr(5000 + i as u16), &format!("p{i}"), &messenger).unwrap();
        }
        assert!(game.roster.is_full());
        messenger.clear();
        game.add_player(addr(6000), "latecomer", &messenger).unwrap();
        let sent = messenger.sent_to(addr(6000));
        assert_eq!(sent, vec!["QUIT Game is full: no more players can join.".to_string()]);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut game = Game::from_map(small_map(), 1).unwrap();
        let messenger = ChannelMessenger::new();
        game.add_player(addr(5001), "   ", &messenger).unwrap();
        assert_eq!(
            messenger.sent_to(addr(5001)),
            vec!["QUIT Sorry - you must provide player's name.".to_string()]
        );
        assert_eq!(game.roster.len(), 0);
    }

    #[test]
    fn quitting_with_purse_drops_a_pile_and_raises_remaining_gold() {
        let mut game = Game::from_map(small_map(), 3).unwrap();
        let messenger = ChannelMessenger::new();
        game.add_player(addr(5002), "Alice", &messenger).unwrap();
        let id = game.roster.get_by_address(addr(5002)).unwrap().id();
        {
            let p = game.roster.get_by_id_mut(id).unwrap();
            p.found_gold_nuggets(10);
        }
        let before = game.remaining_gold;
        game.key_press(addr(5002), 'Q', &messenger).unwrap();
        assert_eq!(game.remaining_gold, before + 10);
        assert_eq!(game.piles.iter().filter(|p| !p.collected && p.nuggets == 10).count(), 1);
        assert_eq!(game.roster.get_by_id(id).unwrap().purse(), 0);
    }

    #[test]
    fn playing_twice_from_the_same_address_is_rejected() {
        let mut game = Game::from_map(small_map(), 1).unwrap();
        let messenger = ChannelMessenger::new();
        game.add_player(addr(5007), "Alice", &messenger).unwrap();
        messenger.clear();
        game.add_player(addr(5007), "Alice Again", &messenger).unwrap();
        assert_eq!(
            messenger.sent_to(addr(5007)),
            vec!["ERROR You are already playing.".to_string()]
        );
        assert_eq!(game.roster.len(), 1);
    }

    #[test]
    fn spawn_onto_gold_shows_viewer_not_pile_in_first_display() {
        let mut game = Game::from_map(small_map(), 5).unwrap();
        // Blanket every room spot with gold so the spawn cell is guaranteed to have some.
        for r in 1..=3i64 {
            for c in 1..=5i64 {
                game.piles.add_pile(r, c, 1);
                game.gold_map.set(r, c, TILE_GOLD);
            }
        }
        let messenger = ChannelMessenger::new();
        game.add_player(addr(5008), "Alice", &messenger).unwrap();
        let id = game.roster.get_by_address(addr(5008)).unwrap().id();
        let (row, col) = {
            let p = game.roster.get_by_id(id).unwrap();
            (p.row(), p.col())
        };

        let sent = messenger.sent_to(addr(5008));
        let first_display = sent.iter().find(|m| m.starts_with("DISPLAY\n")).unwrap();
        let grid_text = first_display.strip_prefix("DISPLAY\n").unwrap();
        let line = grid_text.lines().nth(row as usize).unwrap();
        assert_eq!(line.as_bytes()[col as usize], TILE_VIEWER);
    }

    #[test]
    fn spectator_cannot_send_movement_keys() {
        let mut game = Game::from_map(small_map(), 1).unwrap();
        let messenger = ChannelMessenger::new();
        game.add_spectator(addr(5003), &messenger).unwrap();
        messenger.clear();
        game.key_press(addr(5003), 'h', &messenger).unwrap();
        assert_eq!(
            messenger.sent_to(addr(5003)),
            vec!["ERROR unknown keystroke for spectator.".to_string()]
        );
    }

    #[test]
    fn replaced_spectator_is_notified() {
        let mut game = Game::from_map(small_map(), 1).unwrap();
        let messenger = ChannelMessenger::new();
        game.add_spectator(addr(5004), &messenger).unwrap();
        messenger.clear();
        game.add_spectator(addr(5005), &messenger).unwrap();
        assert_eq!(
            messenger.sent_to(addr(5004)),
            vec!["QUIT You have been replaced by a new spectator.".to_string()]
        );
        assert_eq!(game.spectator, Some(addr(5005)));
    }

    #[test]
    fn address_already_playing_cannot_also_spectate() {
        let mut game = Game::from_map(small_map(), 1).unwrap();
        let messenger = ChannelMessenger::new();
        game.add_player(addr(5006), "Alice", &messenger).unwrap();
        messenger.clear();
        game.add_spectator(addr(5006), &messenger).unwrap();
        assert_eq!(
            messenger.sent_to(addr(5006)).last(),
            Some(&"ERROR You are already a player.".to_string())
        );
    }
}
