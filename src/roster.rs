//! Join-ordered collection of players, with address/id indices and the
//! fan-out helpers used by the orchestrator.

use crate::grid::Grid;
use crate::messenger::{Addr, Messenger};
use crate::player::Player;
use crate::utils::prelude::*;
use itertools::Itertools;

/// All players that have ever joined, in join order. A quit clears a
/// player's address but never removes it from the roster, so the end-game
/// summary stays complete.
#[derive(Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Roster {
        Roster { players: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// The next unused single-letter id, or `None` if the roster is full.
    pub fn next_id(&self) -> Option<char> {
        if self.is_full() {
            None
        } else {
            Some((b'A' + self.players.len() as u8) as char)
        }
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn get_by_address(&self, addr: Addr) -> Option<&Player> {
        self.players.iter().find(|p| p.address() == Some(addr))
    }

    pub fn get_by_address_mut(&mut self, addr: Addr) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.address() == Some(addr))
    }

    pub fn get_by_id(&self, id: char) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn get_by_id_mut(&mut self, id: char) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    /// Connected players only, the ones a live broadcast should reach.
    pub fn connected(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_connected())
    }

    /// For each connected player: recompute visibility against the current
    /// live map and gold map, overlay visible gold onto visible terrain, and
    /// send `DISPLAY\n<grid>`.
    pub fn broadcast_display(
        &mut self,
        live_map: &Grid,
        gold_map: &Grid,
        messenger: &impl Messenger,
    ) -> Result<()> {
        for player in self.players.iter_mut() {
            let Some(addr) = player.address() else {
                continue;
            };
            player.update_visibility(live_map, gold_map)?;
            let view = Grid::overlay(
                player.visible_terrain(),
                player.visible_gold(),
                player.visible_terrain(),
            )?;
            messenger.send(addr, &format!("DISPLAY\n{}", view.string()));
        }
        Ok(())
    }

    /// Sends `GOLD 0 <purse> <remainingGold>` to every connected player.
    pub fn broadcast_gold_status(&self, remaining_gold: i32, messenger: &impl Messenger) {
        for player in self.connected() {
            if let Some(addr) = player.address() {
                messenger.send(addr, &format!("GOLD 0 {} {remaining_gold}", player.purse()));
            }
        }
    }

    /// Builds the `QUIT GAME OVER:\n` summary: one line per joined player
    /// (whether still connected or quit), in join order.
    pub fn build_game_over_summary(&self) -> String {
        let body = self
            .players
            .iter()
            .map(|p| format!("{:<1} {:>7} {}", p.id(), p.purse(), p.name()))
            .join("\n");
        format!("QUIT GAME OVER:\n{body}\n")
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

    #[test]
    fn ids_are_assigned_contiguously_and_fill_caps_out() {
        let mut roster = Roster::new();
        for expected in 'A'..='Z' {
            assert_eq!(roster.next_id(), Some(expected));
            let p = Player::new(expected, 5, 5).unwrap();
            roster.add_player(p);
        }
        assert!(roster.is_full());
        assert_eq!(roster.next_id(), None);
    }

    #[test]
    fn summary_preserves_join_order_including_quit_players() {
        let mut roster = Roster::new();
        let mut a = Player::new('A', 5, 5).unwrap();
        a.set_name("Alice");
        a.found_gold_nuggets(42);
        a.set_address(Some(addr(4000)));
        roster.add_player(a);

        let mut b = Player::new('B', 5, 5).unwrap();
        b.set_name("Bob");
        b.found_gold_nuggets(7);
        // Bob has quit: no address, but still appears.
        roster.add_player(b);

        let summary = roster.build_game_over_summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "QUIT GAME OVER:");
        assert_eq!(lines[1], "A      42 Alice");
        assert_eq!(lines[2], "B       7 Bob");
    }

    #[test]
    fn gold_status_reaches_only_connected_players() {
        let mut roster = Roster::new();
        let mut a = Player::new('A', 5, 5).unwrap();
        a.set_address(Some(addr(4001)));
        roster.add_player(a);
        let b = Player::new('B', 5, 5).unwrap(); // never connected
        roster.add_player(b);

        let messenger = ChannelMessenger::new();
        roster.broadcast_gold_status(100, &messenger);
        assert_eq!(messenger.sent_to(addr(4001)).len(), 1);
        assert_eq!(messenger.sent.borrow().len(), 1);
    }
}
