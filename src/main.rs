mod common;
mod config;
mod connectivity;
mod controller;
mod display;
mod error;
mod thingspeak_client;

use anyhow::anyhow;
use log::{info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[macro_use]
extern crate clap;

use crate::common::PumpAction;
use crate::config::Config;
use crate::connectivity::InterfaceProbe;
use crate::controller::Controller;
use crate::display::ConsoleDisplay;
use crate::thingspeak_client::{Endpoints, HyperTransport};
use syslog::Facility;

#[derive(Debug, PartialEq)]
enum UserCommand {
    Pump(PumpAction),
    Refresh,
    Quit,
}

fn parse_user_command(line: &str) -> Option<UserCommand> {
    match line.trim().to_lowercase().as_str() {
        "on" => Some(UserCommand::Pump(PumpAction::TurnOn)),
        "off" => Some(UserCommand::Pump(PumpAction::TurnOff)),
        "status" => Some(UserCommand::Refresh),
        "quit" => Some(UserCommand::Quit),
        _ => None,
    }
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    if config.use_syslog {
        syslog::init(Facility::LOG_USER, config.log_level, None)
            .map_err(|e| anyhow!("syslog init failed ({})", e))?;
    } else {
        env_logger::Builder::new()
            .filter_level(config.log_level)
            .try_init()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = clap_app!(NivelAgua =>
        (@arg CONFIG: -c --config +takes_value "Sets a custom config file"))
    .get_matches();

    let path_to_config = matches
        .value_of("CONFIG")
        .unwrap_or("/usr/local/etc/nivel_agua/config.toml");

    let config = Config::read_from_file(path_to_config)?;

    init_logging(&config)?;

    let (mut controller, mut receiver) = Controller::new(
        Arc::new(HyperTransport::new()),
        Arc::new(InterfaceProbe),
        Endpoints::from_config(&config),
        ConsoleDisplay::new(std::io::stdout()),
    );

    controller.start_polling(config.poll_interval);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(event) = receiver.recv() => controller.handle_event(event),
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_user_command(&line) {
                    Some(UserCommand::Pump(action)) => controller.send_command(action),
                    Some(UserCommand::Refresh) => controller.refresh(),
                    Some(UserCommand::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => warn!("unknown cmd {}.", line.trim()),
                },
                Ok(None) => {
                    info!("stdin closed, polling only");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("read stdin failed ({:?})", e);
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.stop_polling();
    info!("exit");
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::common::PumpAction;
    use crate::{parse_user_command, UserCommand};

    #[test]
    fn user_commands() {
        assert_eq!(
            parse_user_command("on\n"),
            Some(UserCommand::Pump(PumpAction::TurnOn))
        );
        assert_eq!(
            parse_user_command(" OFF "),
            Some(UserCommand::Pump(PumpAction::TurnOff))
        );
        assert_eq!(parse_user_command("status"), Some(UserCommand::Refresh));
        assert_eq!(parse_user_command("quit"), Some(UserCommand::Quit));
        assert_eq!(parse_user_command("exit"), None);
        assert_eq!(parse_user_command("pump"), None);
    }
}
