use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub matchmaker: MatchmakerSettings,
    pub logging: LoggingSettings,
}

/// Where the WebSocket listener binds.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Limits and naming for the matchmaking hub.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MatchmakerSettings {
    pub max_connections: usize,
    pub room_prefix: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Settings as loaded from files or environment, where any field may be missing.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub matchmaker: Option<PartialMatchmakerSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialMatchmakerSettings {
    pub max_connections: Option<usize>,
    pub room_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            matchmaker: MatchmakerSettings {
                max_connections: 1000,
                room_prefix: "room".to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Fills every missing field from `Settings::default()`.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let server = self.server.unwrap_or_default();
        let matchmaker = self.matchmaker.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(default.server.host),
                port: server.port.unwrap_or(default.server.port),
            },
            matchmaker: MatchmakerSettings {
                max_connections: matchmaker
                    .max_connections
                    .unwrap_or(default.matchmaker.max_connections),
                room_prefix: matchmaker
                    .room_prefix
                    .unwrap_or(default.matchmaker.room_prefix),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(default.logging.level),
            },
        }
    }
}
