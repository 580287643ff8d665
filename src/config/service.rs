use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connection::RetryStrategy;
use crate::error::ConfigError;

pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 5000;

fn default_receive_timeout_ms() -> u64 {
    DEFAULT_RECEIVE_TIMEOUT_MS
}

/// How the client authenticates to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum AuthScheme {
    Basic {
        username: String,
        password: String,
    },
    ClientCertificate {
        certificate_file: String,
        key_file: String,
        #[serde(default)]
        key_password: Option<String>,
        /// Overrides the username derived from the certificate.
        #[serde(default)]
        username: Option<String>,
    },
}

impl AuthScheme {
    pub fn username(&self) -> Option<&str> {
        match self {
            AuthScheme::Basic { username, .. } => Some(username),
            AuthScheme::ClientCertificate { username, .. } => username.as_deref(),
        }
    }
}

/// Transport layer security settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Directory holding trusted CA certificates.
    pub trust_store_dir: Option<String>,
    #[serde(default = "enabled")]
    pub validate_certificate: bool,
    #[serde(default = "enabled")]
    pub validate_host: bool,
}

fn enabled() -> bool {
    true
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            trust_store_dir: None,
            validate_certificate: true,
            validate_host: true,
        }
    }
}

impl TlsConfig {
    pub fn with_trust_store(dir: impl Into<String>) -> Self {
        Self {
            trust_store_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Skip certificate validation. Only for test brokers with self-signed
    /// certificates.
    pub fn without_certificate_validation() -> Self {
        Self {
            trust_store_dir: None,
            validate_certificate: false,
            validate_host: false,
        }
    }
}

/// Everything needed to connect a messaging service to a broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Broker URL, e.g. `tcp://localhost:55555` or `tcps://localhost:55443`
    pub host: String,
    pub vpn_name: String,
    pub authentication: AuthScheme,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    #[serde(default)]
    pub reconnection: RetryStrategy,
    /// Upper bound on a single blocking receive.
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
    #[serde(default)]
    pub application_id: Option<String>,
}

impl ServiceConfig {
    pub fn new(host: impl Into<String>, vpn_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            vpn_name: vpn_name.into(),
            authentication: AuthScheme::Basic {
                username: "default".into(),
                password: String::new(),
            },
            tls: None,
            reconnection: RetryStrategy::default(),
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
            application_id: None,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.authentication = AuthScheme::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    pub fn with_client_certificate(
        mut self,
        certificate_file: impl Into<String>,
        key_file: impl Into<String>,
        key_password: Option<String>,
    ) -> Self {
        self.authentication = AuthScheme::ClientCertificate {
            certificate_file: certificate_file.into(),
            key_file: key_file.into(),
            key_password,
            username: None,
        };
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_reconnection(mut self, strategy: RetryStrategy) -> Self {
        self.reconnection = strategy;
        self
    }

    pub fn with_receive_timeout(mut self, timeout_ms: u64) -> Self {
        self.receive_timeout_ms = timeout_ms;
        self
    }

    pub fn with_application_id(mut self, id: impl Into<String>) -> Self {
        self.application_id = Some(id.into());
        self
    }

    /// Generate a fresh application id of the form `app_<uuid>`.
    pub fn new_application_id() -> String {
        format!("app_{}", Uuid::new_v4())
    }

    pub fn uses_secure_transport(&self) -> bool {
        self.host.starts_with("tcps://") || self.host.starts_with("wss://")
    }

    /// Reject combinations the broker would refuse at connect time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        if self.vpn_name.is_empty() {
            return Err(ConfigError::Missing("vpn_name"));
        }
        let needs_tls = self.uses_secure_transport()
            || matches!(self.authentication, AuthScheme::ClientCertificate { .. });
        if needs_tls && self.tls.is_none() {
            return Err(ConfigError::Missing("tls"));
        }
        Ok(())
    }
}
