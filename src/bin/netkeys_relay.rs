use clap::Parser;
use netkeys::{
    common::{box_error::BoxError, config::Config},
    server::relay_server,
};

/// Relay hub: fans each player's note events out to everyone else in the room
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// UDP port to listen on (overrides settings.json)
    #[arg(short, long)]
    port: Option<u32>,

    /// settings file
    #[arg(short, long, default_value = "settings.json")]
    settings: String,
}

fn main() -> Result<(), BoxError> {
    env_logger::init();
    let args = Args::parse();
    let config = Config::build(
        args.settings,
        json::object! {
            "port": 7891
        },
    )?;
    let port = match args.port {
        Some(p) => p,
        None => config.get_u32_value("port", None)?,
    };
    relay_server::run(port)
}
