use clap::Parser;
use netkeys::{
    common::{box_error::BoxError, config::Config},
    sound::{client, log_renderer::LogRenderer},
};
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

/// Session client: plays everyone's notes at a synchronized local time.
///
/// Without a MIDI device attached, keys are faked from stdin:
///   on <note> <velocity>
///   off <note>
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// relay host (overrides settings.json)
    #[arg(long)]
    host: Option<String>,

    /// relay port (overrides settings.json)
    #[arg(short, long)]
    port: Option<u32>,

    /// settings file
    #[arg(short, long, default_value = "settings.json")]
    settings: String,
}

fn parse_line(line: &str) -> Option<[u8; 3]> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("on") => {
            let note: u8 = words.next()?.parse().ok()?;
            let velocity: u8 = words.next().unwrap_or("100").parse().ok()?;
            Some([0x90, note.min(127), velocity.min(127)])
        }
        Some("off") => {
            let note: u8 = words.next()?.parse().ok()?;
            Some([0x80, note.min(127), 0])
        }
        _ => None,
    }
}

fn main() -> Result<(), BoxError> {
    env_logger::init();
    let args = Args::parse();
    let config = Config::build(
        args.settings,
        json::object! {
            "relay_host": "127.0.0.1",
            "port": 7891
        },
    )?;
    let host = match args.host {
        Some(h) => h,
        None => config.get_str_value("relay_host", None)?,
    };
    let port = match args.port {
        Some(p) => p,
        None => config.get_u32_value("port", None)?,
    };

    // stdin stands in for the MIDI device; real device plumbing is outside
    // the core and would feed the same channel
    let (input_tx, input_rx) = mpsc::channel();
    let _input_handle = thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(text) => {
                    if let Some(raw) = parse_line(&text) {
                        if input_tx.send(raw).is_err() {
                            break;
                        }
                    }
                }
                Err(_) => break,
            }
        }
    });

    let mut audio = LogRenderer::new();
    let mut visual = LogRenderer::new();
    client::run(host.as_str(), port, input_rx, &mut audio, &mut visual)
}
