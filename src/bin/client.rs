use std::io::{stdin, stdout, Read, Write};
use std::process::exit;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use lib_nuggets::prelude::*;
use termion::raw::IntoRawMode;
use termion::{clear, cursor};

/// `client <hostname> <port> [playerName]`
#[derive(Clone, Debug, Parser)]
#[command(name = "client", about = "Connects to a running nuggets server.")]
struct ClientArgs {
    hostname: String,
    port: u16,
    name: Option<String>,
}

const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Everything needed to redraw the two-region display.
#[derive(Default)]
struct ClientState {
    id: Option<char>,
    is_spectator: bool,
    purse: i32,
    remaining: i32,
    grid: String,
    trailer: Option<String>,
}

impl ClientState {
    fn status_line(&self) -> String {
        let base = if self.is_spectator {
            format!("Spectator: {} nuggets unclaimed.", self.remaining)
        } else {
            format!(
                "Player {} has {} nuggets ({} nuggets unclaimed).",
                self.id.unwrap_or('?'),
                self.purse,
                self.remaining
            )
        };
        match &self.trailer {
            Some(t) => format!("{base} {t}"),
            None => base,
        }
    }
}

fn allowed_key(c: char) -> bool {
    "hjklyubnHJKLYUBNQ".contains(c)
}

fn main() {
    let args = ClientArgs::parse();
    let remote = format!("{}:{}", args.hostname, args.port);
    let server_addr = match std::net::ToSocketAddrs::to_socket_addrs(&remote) {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => Addr(addr),
            None => {
                eprintln!("could not resolve {remote}");
                exit(2);
            }
        },
        Err(err) => {
            eprintln!("could not resolve {remote}: {err}");
            exit(2);
        }
    };

    let messenger = match UdpMessenger::connect("0.0.0.0:0", &remote) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("could not reach {remote}: {err}");
            exit(3);
        }
    };

    let greeting = match &args.name {
        Some(name) => format!("PLAY {name}"),
        None => "SPECTATE".to_string(),
    };
    messenger.send(server_addr, &greeting);

    let mut state = ClientState {
        is_spectator: args.name.is_none(),
        ..ClientState::default()
    };

    let mut stdout = match stdout().into_raw_mode() {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("could not switch terminal to raw mode: {err}");
            exit(4);
        }
    };

    let keys = spawn_key_reader();

    let exit_code = loop {
        if let Ok(key) = keys.try_recv() {
            state.trailer = None;
            if allowed_key(key) {
                messenger.send(server_addr, &format!("KEY {key}"));
            }
        }

        let Some((_, raw)) = messenger.recv(POLL_TIMEOUT) else {
            continue;
        };

        if let Some(rest) = raw.strip_prefix("OK ") {
            state.id = rest.chars().next();
        } else if raw.starts_with("GRID ") {
            // Dimensions are implied by the DISPLAY grid itself; nothing to track.
        } else if let Some(rest) = raw.strip_prefix("GOLD ") {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            if let [n, p, r] = fields[..] {
                if let (Ok(n), Ok(p), Ok(r)) = (n.parse::<i32>(), p.parse::<i32>(), r.parse::<i32>()) {
                    state.purse = p;
                    state.remaining = r;
                    if n != 0 {
                        state.trailer = Some(format!("Picked up {n} nuggets!"));
                    }
                }
            }
        } else if let Some(rest) = raw.strip_prefix("GOLDSTEAL ") {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            if let [n, p, r, other] = fields[..] {
                if let (Ok(n), Ok(p), Ok(r)) = (n.parse::<i32>(), p.parse::<i32>(), r.parse::<i32>()) {
                    state.purse = p;
                    state.remaining = r;
                    state.trailer = Some(match n.cmp(&0) {
                        std::cmp::Ordering::Greater => format!("You stole a nugget from {other}!"),
                        std::cmp::Ordering::Less => format!("{other} stole a nugget from you!"),
                        std::cmp::Ordering::Equal => format!("{other} had nothing to steal."),
                    });
                }
            }
        } else if let Some(grid) = raw.strip_prefix("DISPLAY\n") {
            state.grid = grid.to_string();
        } else if let Some(reason) = raw.strip_prefix("QUIT ") {
            redraw(&mut stdout, &state);
            writeln!(stdout, "\r\n{reason}").ok();
            break 0;
        } else if let Some(explanation) = raw.strip_prefix("ERROR ") {
            state.trailer = Some(explanation.to_string());
        }

        redraw(&mut stdout, &state);
    };

    drop(stdout);
    exit(exit_code);
}

fn redraw(stdout: &mut impl Write, state: &ClientState) {
    write!(stdout, "{}{}", clear::All, cursor::Goto(1, 1)).ok();
    write!(stdout, "{}\r\n", state.status_line()).ok();
    for line in state.grid.lines() {
        write!(stdout, "{line}\r\n").ok();
    }
    stdout.flush().ok();
}

/// Puts the terminal in raw mode and forwards one keystroke at a time over a
/// channel, so the main loop can poll it alongside the socket without either
/// blocking the other, mirroring the server's stdin-EOF watcher thread.
fn spawn_key_reader() -> mpsc::Receiver<char> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut byte = [0u8; 1];
        loop {
            match stdin().read(&mut byte) {
                Ok(1) => {
                    if tx.send(byte[0] as char).is_err() {
                        return;
                    }
                }
                _ => return,
            }
        }
    });
    rx
}
