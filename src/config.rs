use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::errors::InfrastructureError;
use crate::game::manager::{GameSettings, DEFAULT_GAMBLE_REFERENCE, DEFAULT_INITIAL_MONEY};
use crate::hub::DEFAULT_QUEUE_CAPACITY;
use crate::websocket::SessionSettings;
use crate::TileId;

/// Sugoroku session server
#[derive(Debug, Clone, Parser)]
#[command(name = "sugoroku", version, about)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "SUGOROKU_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Board definition (JSON array of tile records)
    #[arg(long, env = "SUGOROKU_BOARD", default_value = "tiles.json")]
    pub board: PathBuf,

    /// Quiz definitions (JSON array)
    #[arg(long, env = "SUGOROKU_QUIZZES", default_value = "quizzes.json")]
    pub quizzes: PathBuf,

    /// Append finished results here as JSON lines; kept in memory when unset
    #[arg(long, env = "SUGOROKU_RESULTS")]
    pub results: Option<PathBuf>,

    #[arg(long, env = "SUGOROKU_INITIAL_MONEY", default_value_t = DEFAULT_INITIAL_MONEY)]
    pub initial_money: i64,

    #[arg(long, env = "SUGOROKU_START_TILE", default_value_t = 1)]
    pub start_tile: TileId,

    /// Outbound messages buffered per connection before it is dropped
    #[arg(long, env = "SUGOROKU_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Seconds between server pings
    #[arg(long, env = "SUGOROKU_PING_INTERVAL", default_value_t = 54)]
    pub ping_interval: u64,

    /// Seconds of client silence before the connection is closed
    #[arg(long, env = "SUGOROKU_PONG_WAIT", default_value_t = 60)]
    pub pong_wait: u64,

    /// Seconds allowed for a single write
    #[arg(long, env = "SUGOROKU_WRITE_WAIT", default_value_t = 10)]
    pub write_wait: u64,

    /// Gamble rolls at or above this count as High
    #[arg(long, env = "SUGOROKU_GAMBLE_REFERENCE", default_value_t = DEFAULT_GAMBLE_REFERENCE)]
    pub gamble_reference: u8,
}

impl ServerConfig {
    /// Rejects combinations that would make heartbeats or gambles meaningless.
    pub fn validate(&self) -> Result<(), InfrastructureError> {
        let invalid = |details: String| Err(InfrastructureError::Configuration { details });
        if self.ping_interval == 0 || self.ping_interval >= self.pong_wait {
            return invalid(format!(
                "ping interval ({}s) must be positive and shorter than pong wait ({}s)",
                self.ping_interval, self.pong_wait
            ));
        }
        if self.write_wait == 0 {
            return invalid("write wait must be positive".to_string());
        }
        if self.queue_capacity == 0 {
            return invalid("queue capacity must be positive".to_string());
        }
        if !(1..=6).contains(&self.gamble_reference) {
            return invalid(format!(
                "gamble reference must be a die face, got {}",
                self.gamble_reference
            ));
        }
        Ok(())
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            start_tile: self.start_tile,
            initial_money: self.initial_money,
            gamble_reference: self.gamble_reference,
            ..GameSettings::default()
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            queue_capacity: self.queue_capacity,
            ping_interval: Duration::from_secs(self.ping_interval),
            pong_wait: Duration::from_secs(self.pong_wait),
            write_wait: Duration::from_secs(self.write_wait),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["sugoroku"]).unwrap();
        assert_eq!(config.initial_money, 1_000_000);
        assert_eq!(config.start_tile, 1);
        assert!(config.results.is_none());
        assert!(config.validate().is_ok());

        let session = config.session_settings();
        assert_eq!(session.ping_interval, Duration::from_secs(54));
        assert_eq!(session.pong_wait, Duration::from_secs(60));
        assert_eq!(session.queue_capacity, 256);
        assert_eq!(config.game_settings().gamble_reference, 3);
    }

    #[test]
    fn test_flags_override() {
        let config = ServerConfig::try_parse_from([
            "sugoroku",
            "--board",
            "boards/short.json",
            "--initial-money",
            "5000",
            "--results",
            "results.jsonl",
        ])
        .unwrap();
        assert_eq!(config.board, PathBuf::from("boards/short.json"));
        assert_eq!(config.game_settings().initial_money, 5_000);
        assert_eq!(config.results, Some(PathBuf::from("results.jsonl")));
    }

    #[test]
    fn test_validate_rejects_bad_heartbeat() {
        let config =
            ServerConfig::try_parse_from(["sugoroku", "--ping-interval", "60", "--pong-wait", "60"]).unwrap();
        assert!(config.validate().is_err());

        let config = ServerConfig::try_parse_from(["sugoroku", "--gamble-reference", "7"]).unwrap();
        assert!(config.validate().is_err());
    }
}
