use std::process::exit;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use lib_nuggets::prelude::*;

/// `server <mapFile> [seed]`
#[derive(Clone, Debug, Parser)]
#[command(name = "server", about = "Runs one nuggets game to completion.")]
struct ServerArgs {
    map: std::path::PathBuf,

    seed: Option<u64>,

    #[arg(long, default_value = "0.0.0.0:0")]
    bind: String,

    #[arg(short, long)]
    log_level: Option<String>,
}

const RECV_TIMEOUT: Duration = Duration::from_millis(200);

fn main() {
    let args = match ServerArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            use clap::error::ErrorKind;
            match err.kind() {
                ErrorKind::MissingRequiredArgument
                | ErrorKind::TooManyValues
                | ErrorKind::TooFewValues
                | ErrorKind::WrongNumberOfValues
                | ErrorKind::UnknownArgument => {
                    eprintln!("usage: server <mapFile> [seed]");
                    exit(1);
                }
                _ => err.exit(),
            }
        }
    };
    let _logger = Logger::try_with_env_or_str(args.log_level.clone().unwrap_or("info".into()).as_str())
        .and_then(|l| {
            l.write_mode(WriteMode::BufferAndFlush)
                .log_to_stderr()
                .adaptive_format_for_stderr(match cfg!(debug_assertions) {
                    true => AdaptiveFormat::WithThread,
                    _ => AdaptiveFormat::Default,
                })
                .start()
        });

    let seed = args.seed.unwrap_or_else(|| std::process::id() as u64);

    let map = match Grid::from_file(&args.map) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("could not load map {}: {err}", args.map.display());
            exit(2);
        }
    };

    let mut game = match Game::from_map(map, seed) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("could not initialize game: {err}");
            exit(3);
        }
    };

    let messenger = match UdpMessenger::bind(&args.bind) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("could not bind socket {}: {err}", args.bind);
            exit(2);
        }
    };
    let local_addr = messenger.local_addr().expect("bound socket has a local address");
    println!("{local_addr}");
    log::info!("listening on {local_addr}, seed {seed}, map {}", args.map.display());

    let eof_rx = spawn_stdin_eof_watcher();

    loop {
        if eof_rx.try_recv().is_ok() {
            log::info!("stdin closed, shutting down");
            break;
        }

        let Some((from, raw)) = messenger.recv(RECV_TIMEOUT) else {
            continue;
        };
        let raw = raw.trim_end_matches(['\n', '\r']);

        match dispatch(&mut game, from, raw, &messenger) {
            Ok(true) => {
                log::info!("game over");
                break;
            }
            Ok(false) => {}
            Err(err) => log::warn!("error handling message from {from}: {err}"),
        }
    }

    exit(0);
}

/// Forwards a single sentinel once stdin hits EOF, so the main loop can poll
/// for it without blocking on a read itself.
fn spawn_stdin_eof_watcher() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = String::new();
        loop {
            buf.clear();
            match std::io::stdin().read_line(&mut buf) {
                Ok(0) => {
                    let _ = tx.send(());
                    return;
                }
                Ok(_) => continue,
                Err(_) => {
                    let _ = tx.send(());
                    return;
                }
            }
        }
    });
    rx
}
