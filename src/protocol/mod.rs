//! The wire protocol dispatcher: classifies each inbound datagram by its
//! leading token and routes it to [`Game`].

use crate::game::Game;
use crate::messenger::{Addr, Messenger};
use crate::utils::prelude::*;

/// A parsed inbound datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Play(String),
    Spectate,
    Key(char),
}

/// Parses one inbound datagram.
pub fn parse(raw: &str) -> Result<ClientMessage> {
    if let Some(name) = raw.strip_prefix("PLAY ") {
        return Ok(ClientMessage::Play(name.to_string()));
    }
    if raw == "PLAY" {
        // No name at all; treated the same as an empty name by the caller.
        return Ok(ClientMessage::Play(String::new()));
    }
    if raw == "SPECTATE" {
        return Ok(ClientMessage::Spectate);
    }
    if let Some(rest) = raw.strip_prefix("KEY ") {
        let mut chars = rest.chars();
        return match chars.next() {
            Some(c) => Ok(ClientMessage::Key(c)),
            None => Err(anyhow!("Command not recognized.")),
        };
    }
    Err(anyhow!("Command not recognized."))
}

/// Classifies `raw` and routes it to `game`. Returns `true` if the game just
/// ended and the server's event loop should stop.
pub fn dispatch(game: &mut Game, from: Addr, raw: &str, messenger: &impl Messenger) -> Result<bool> {
    match parse(raw) {
        Ok(ClientMessage::Play(name)) => game.add_player(from, &name, messenger),
        Ok(ClientMessage::Spectate) => {
            game.add_spectator(from, messenger)?;
            Ok(false)
        }
        Ok(ClientMessage::Key(key)) => game.key_press(from, key, messenger),
        Err(_) => {
            messenger.send(from, "ERROR Command not recognized.");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_play_with_name() {
        assert_eq!(parse("PLAY Alice").unwrap(), ClientMessage::Play("Alice".into()));
    }

    #[test]
    fn parses_spectate() {
        assert_eq!(parse("SPECTATE").unwrap(), ClientMessage::Spectate);
    }

    #[test]
    fn parses_key() {
        assert_eq!(parse("KEY h").unwrap(), ClientMessage::Key('h'));
    }

    #[test]
    fn unrecognized_command_is_an_error() {
        assert!(parse("DANCE").is_err());
    }
}
