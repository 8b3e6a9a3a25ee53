//! Option schema and resolved configuration for `mb-apiserver`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Option key selecting the server implementation.
pub const SERVER_MODE_KEY: &str = "server-mode";
/// Option key holding the JWT signing key.
pub const JWT_KEY_KEY: &str = "jwt-key";
/// Option key holding the JWT token lifetime.
pub const EXPIRATION_KEY: &str = "expiration";

/// Every option key, in declaration order.
pub const OPTION_KEYS: &[&str] = &[SERVER_MODE_KEY, JWT_KEY_KEY, EXPIRATION_KEY];

const DEFAULT_JWT_KEY: &str = "Rtg8BPKNEf2mB4mgvKONGPZZQSaJWNLijxR42qRgq0iBb5";
const DEFAULT_EXPIRATION: Duration = Duration::from_secs(2 * 60 * 60);

/// Merged server options before validation.
///
/// `server_mode` stays a raw string here; it is parsed into [`ServerMode`]
/// once, when the options are validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServerOptions {
    /// Server mode: `grpc`, `grpc-gateway` or `gin`.
    pub server_mode: String,
    /// JWT signing key.
    pub jwt_key: String,
    /// Lifetime of issued JWT tokens.
    #[serde(with = "duration_text")]
    pub expiration: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            server_mode: ServerMode::GrpcGateway.as_str().to_string(),
            jwt_key: DEFAULT_JWT_KEY.to_string(),
            expiration: DEFAULT_EXPIRATION,
        }
    }
}

/// Server implementation selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerMode {
    /// Plain gRPC service.
    Grpc,
    /// gRPC service fronted by an HTTP/JSON gateway.
    GrpcGateway,
    /// HTTP server built on the gin framework.
    Gin,
}

impl ServerMode {
    /// All modes, in the order they are reported to users.
    pub const ALL: [ServerMode; 3] = [ServerMode::Grpc, ServerMode::GrpcGateway, ServerMode::Gin];

    /// Canonical option value for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            ServerMode::Grpc => "grpc",
            ServerMode::GrpcGateway => "grpc-gateway",
            ServerMode::Gin => "gin",
        }
    }

    /// Render the legal values as `[grpc, grpc-gateway, gin]`.
    pub fn available() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(|mode| mode.as_str()).collect();
        format!("[{}]", names.join(", "))
    }
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known server mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown server mode '{0}'")]
pub struct UnknownServerMode(pub String);

impl FromStr for ServerMode {
    type Err = UnknownServerMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| UnknownServerMode(value.to_string()))
    }
}

/// Fully resolved and validated runtime configuration.
///
/// Built once at startup from validated options and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub server_mode: ServerMode,
    pub jwt_key: String,
    pub expiration: Duration,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("server_mode", &self.server_mode)
            .field("jwt_key", &"[REDACTED]")
            .field("expiration", &humantime::format_duration(self.expiration))
            .finish()
    }
}

/// Parse a human-friendly duration such as `30m`, `1h` or `2h30m`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value.trim()).map_err(|err| err.to_string())
}

/// Render a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Serde adapter storing durations as human-friendly text.
mod duration_text {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_duration(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let options = ServerOptions::default();
        assert_eq!(options.server_mode, "grpc-gateway");
        assert_eq!(options.jwt_key, DEFAULT_JWT_KEY);
        assert_eq!(options.expiration, Duration::from_secs(7200));
    }

    #[test]
    fn server_mode_parses_canonical_names_only() {
        assert_eq!("grpc".parse::<ServerMode>(), Ok(ServerMode::Grpc));
        assert_eq!("grpc-gateway".parse::<ServerMode>(), Ok(ServerMode::GrpcGateway));
        assert_eq!("gin".parse::<ServerMode>(), Ok(ServerMode::Gin));
        assert!("GIN".parse::<ServerMode>().is_err());
        assert!("grpc_gateway".parse::<ServerMode>().is_err());
    }

    #[test]
    fn available_modes_are_listed_in_order() {
        assert_eq!(ServerMode::available(), "[grpc, grpc-gateway, gin]");
    }

    #[test]
    fn options_round_trip_through_json_with_kebab_keys() {
        let value = serde_json::to_value(ServerOptions::default()).expect("encode");
        assert_eq!(value["server-mode"], "grpc-gateway");
        assert_eq!(value["expiration"], "2h");
        let decoded: ServerOptions = serde_json::from_value(value).expect("decode");
        assert_eq!(decoded, ServerOptions::default());
    }

    #[test]
    fn duration_parser_accepts_compound_units() {
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration("2h30m"), Ok(Duration::from_secs(9000)));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn debug_output_hides_jwt_key() {
        let config = ServerConfig {
            server_mode: ServerMode::Gin,
            jwt_key: "super-secret".to_string(),
            expiration: Duration::from_secs(60),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("Gin"));
    }
}
