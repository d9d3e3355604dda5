//! Connection parameters store
//!
//! Holds everything the host stages before initialization: the target
//! endpoint, TLS material, timeout and keep-alive interval, the outbound
//! payload cap, and the extension negotiation policy. Nothing here touches
//! the network; the engine snapshots these values when it initializes.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::policy::ExtensionPolicy;
use crate::Result;

/// Default cap on a single outbound payload, in bytes.
pub const DEFAULT_MAX_PAYLOAD: usize = 4096;

// ----------------------------------------------------------------------------
// TLS Material
// ----------------------------------------------------------------------------

/// Filesystem paths to PEM material for a TLS connection.
///
/// Staging any material switches the connection to relaxed-trust TLS:
/// self-signed server certificates are accepted and the hostname check is
/// skipped. Hosts that need strict validation must terminate TLS elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsMaterial {
    /// CA bundle used to seed the root store.
    pub ca_path: Option<PathBuf>,
    /// Client certificate presented to the server.
    pub cert_path: Option<PathBuf>,
    /// Private key for the client certificate.
    pub key_path: Option<PathBuf>,
}

// ----------------------------------------------------------------------------
// Connection Parameters
// ----------------------------------------------------------------------------

/// Mutable staging area for connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParameters {
    address: String,
    port: u16,
    path: String,
    tls: Option<TlsMaterial>,
    timeout: Duration,
    ping_interval: Duration,
    max_payload: usize,
    extension_policy: ExtensionPolicy,
    configured: bool,
}

impl Default for ConnectionParameters {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: 0,
            path: String::new(),
            tls: None,
            timeout: Duration::ZERO,
            ping_interval: Duration::ZERO,
            max_payload: DEFAULT_MAX_PAYLOAD,
            extension_policy: ExtensionPolicy::default(),
            configured: false,
        }
    }
}

impl ConnectionParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the target endpoint, replacing any previous endpoint wholesale.
    ///
    /// An empty address or path leaves the store unconfigured and fails with
    /// [`EngineError::InvalidParameters`]. A successful call resets any staged
    /// TLS material: the plain-connection default applies until `set_tls_material`
    /// is called again.
    pub fn set_endpoint(&mut self, address: &str, port: u16, path: &str) -> Result<()> {
        if address.is_empty() || path.is_empty() {
            self.configured = false;
            return Err(EngineError::InvalidParameters);
        }
        self.address = address.to_string();
        self.port = port;
        self.path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        self.tls = None;
        self.configured = true;
        Ok(())
    }

    /// Stage TLS material and switch TLS mode on.
    ///
    /// Empty path strings are treated as absent. The material is bound when
    /// the engine initializes; changes afterwards have no effect until the
    /// next initialization.
    pub fn set_tls_material(&mut self, ca_path: &str, cert_path: &str, key_path: &str) {
        fn to_path(s: &str) -> Option<PathBuf> {
            if s.is_empty() {
                None
            } else {
                Some(PathBuf::from(s))
            }
        }
        self.tls = Some(TlsMaterial {
            ca_path: to_path(ca_path),
            cert_path: to_path(cert_path),
            key_path: to_path(key_path),
        });
    }

    /// Connection-establishment timeout in seconds; `0` disables.
    ///
    /// Effective at the next initialization.
    pub fn set_timeout(&mut self, seconds: u64) {
        self.timeout = Duration::from_secs(seconds);
    }

    /// Keep-alive ping interval in seconds; `0` disables.
    ///
    /// Effective at the next initialization.
    pub fn set_ping_interval(&mut self, seconds: u64) {
        self.ping_interval = Duration::from_secs(seconds);
    }

    /// Cap on a single outbound payload in bytes.
    pub fn set_max_payload(&mut self, bytes: usize) {
        self.max_payload = bytes;
    }

    /// Extension negotiation policy, bound at the next initialization.
    pub fn set_extension_policy(&mut self, policy: ExtensionPolicy) {
        self.extension_policy = policy;
    }

    /// Whether a valid endpoint has been staged.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tls_material(&self) -> Option<&TlsMaterial> {
        self.tls.as_ref()
    }

    /// Whether TLS mode is currently on.
    pub fn tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Establishment timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout.is_zero() {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Keep-alive interval, `None` when disabled.
    pub fn ping_interval(&self) -> Option<Duration> {
        if self.ping_interval.is_zero() {
            None
        } else {
            Some(self.ping_interval)
        }
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    pub fn extension_policy(&self) -> ExtensionPolicy {
        self.extension_policy
    }

    /// Dial URL built from the staged endpoint and the current TLS mode.
    pub fn url(&self) -> String {
        let scheme = if self.tls_enabled() { "wss" } else { "ws" };
        format!("{scheme}://{}:{}{}", self.address, self.port, self.path)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
