use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::service::{ServiceConfig, TlsConfig};
use crate::error::ConfigError;

/// Connection details for the SEMP management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SempConfig {
    /// Base URL including scheme and port, e.g. `https://localhost:1943`
    pub hostname: String,
    pub username: String,
    pub password: String,
    #[serde(default = "verify_by_default")]
    pub verify_tls: bool,
}

fn verify_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BrokerSection {
    host: Option<String>,
    host_secured: Option<String>,
    host_compressed: Option<String>,
    vpn_name: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// Broker and SEMP properties read from a JSON file.
///
/// ```json
/// {
///   "broker": {
///     "host": "tcp://localhost:55555",
///     "host_secured": "tcps://localhost:55443",
///     "host_compressed": "tcp://localhost:55003",
///     "vpn_name": "default",
///     "username": "default",
///     "password": "default"
///   },
///   "semp": {
///     "hostname": "https://localhost:1943",
///     "username": "admin",
///     "password": "admin"
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertiesFile {
    broker: Option<BrokerSection>,
    semp: Option<SempConfig>,
}

impl PropertiesFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Plain-text connection to `broker.host`.
    pub fn service_config(&self) -> Result<ServiceConfig, ConfigError> {
        let broker = self.broker()?;
        let host = broker.host.clone().ok_or(ConfigError::Missing("broker.host"))?;
        self.build(broker, host)
    }

    /// TLS connection to `broker.host_secured`.
    pub fn secured_service_config(&self) -> Result<ServiceConfig, ConfigError> {
        let broker = self.broker()?;
        let host = broker
            .host_secured
            .clone()
            .ok_or(ConfigError::Missing("broker.host_secured"))?;
        Ok(self.build(broker, host)?.with_tls(TlsConfig::default()))
    }

    /// Connection to the compression-enabled `broker.host_compressed`.
    pub fn compressed_service_config(&self) -> Result<ServiceConfig, ConfigError> {
        let broker = self.broker()?;
        let host = broker
            .host_compressed
            .clone()
            .ok_or(ConfigError::Missing("broker.host_compressed"))?;
        self.build(broker, host)
    }

    pub fn semp_config(&self) -> Result<SempConfig, ConfigError> {
        self.semp.clone().ok_or(ConfigError::Missing("semp"))
    }

    fn broker(&self) -> Result<&BrokerSection, ConfigError> {
        self.broker.as_ref().ok_or(ConfigError::Missing("broker"))
    }

    fn build(&self, broker: &BrokerSection, host: String) -> Result<ServiceConfig, ConfigError> {
        let vpn_name = broker
            .vpn_name
            .clone()
            .ok_or(ConfigError::Missing("broker.vpn_name"))?;
        let username = broker
            .username
            .clone()
            .ok_or(ConfigError::Missing("broker.username"))?;
        let password = broker
            .password
            .clone()
            .ok_or(ConfigError::Missing("broker.password"))?;

        tracing::debug!(host = %host, vpn = %vpn_name, username = %username, "loaded broker properties");
        Ok(ServiceConfig::new(host, vpn_name).with_basic_auth(username, password))
    }
}
