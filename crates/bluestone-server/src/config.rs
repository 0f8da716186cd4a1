//! Server configuration: a flat key/value file loaded once at startup
//! and passed explicitly to everything that needs it.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use bluestone_raknet::session::SessionTimings;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server_port: u16,
    /// Fixed GUID; a random one is drawn at startup when absent.
    pub server_guid: Option<i64>,
    pub motd: String,
    pub max_players: u32,
    pub world_name: String,
    pub game_mode: String,
    pub difficulty: String,
    pub batch_compress_threshold: usize,
    pub retransmit_interval_ms: u64,
    pub session_inactivity_s: u64,
    /// Truncate logged datagram hex to this many characters.
    pub max_log_length: Option<usize>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_port: 19132,
            server_guid: None,
            motd: "Bluestone".into(),
            max_players: 20,
            world_name: "world".into(),
            game_mode: "survival".into(),
            difficulty: "normal".into(),
            batch_compress_threshold: 512,
            retransmit_interval_ms: 200,
            session_inactivity_s: 30,
            max_log_length: None,
            log_level: "info".into(),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file. A missing file yields the defaults; a
    /// malformed one is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn session_timings(&self) -> SessionTimings {
        SessionTimings {
            retransmit_interval: Duration::from_millis(self.retransmit_interval_ms),
            inactivity_timeout: Duration::from_secs(self.session_inactivity_s),
        }
    }

    /// Title-case game mode name for the server descriptor string.
    pub fn game_mode_title(&self) -> String {
        let mut chars = self.game_mode.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_requirements() {
        let config = ServerConfig::default();
        assert_eq!(config.server_port, 19132);
        assert_eq!(config.batch_compress_threshold, 512);
        assert_eq!(config.retransmit_interval_ms, 200);
        assert_eq!(config.session_inactivity_s, 30);
    }

    #[test]
    fn parse_flat_keys() {
        let config: ServerConfig = toml::from_str(
            r#"
            server_port = 19133
            server_guid = 42
            motd = "Test Server"
            world_name = "flatland"
            game_mode = "creative"
            batch_compress_threshold = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.server_port, 19133);
        assert_eq!(config.server_guid, Some(42));
        assert_eq!(config.motd, "Test Server");
        assert_eq!(config.world_name, "flatland");
        assert_eq!(config.batch_compress_threshold, 1024);
        // Unset keys keep their defaults.
        assert_eq!(config.max_players, 20);
        assert_eq!(config.session_inactivity_s, 30);
    }

    #[test]
    fn game_mode_title_case() {
        let config = ServerConfig {
            game_mode: "survival".into(),
            ..Default::default()
        };
        assert_eq!(config.game_mode_title(), "Survival");
    }

    #[test]
    fn timings_derived_from_keys() {
        let config = ServerConfig {
            retransmit_interval_ms: 300,
            session_inactivity_s: 10,
            ..Default::default()
        };
        let timings = config.session_timings();
        assert_eq!(timings.retransmit_interval, Duration::from_millis(300));
        assert_eq!(timings.inactivity_timeout, Duration::from_secs(10));
    }
}
