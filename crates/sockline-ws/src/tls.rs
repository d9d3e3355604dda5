//! Relaxed-trust TLS configuration
//!
//! Staging TLS material switches the engine to a deliberately permissive
//! trust policy: any server certificate is accepted (self-signed included)
//! and the hostname check is skipped. The staged CA bundle still seeds the
//! root store and a client certificate/key pair is presented when both paths
//! are given.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore, ServerName};
use tracing::{debug, warn};

use sockline_core::{EngineError, TlsMaterial};

// ----------------------------------------------------------------------------
// Relaxed Verifier
// ----------------------------------------------------------------------------

/// Certificate verifier that accepts every presented chain.
///
/// Self-signed certificates pass and the server name is never checked. This
/// mirrors the relaxed-trust policy the engine advertises; it must not be
/// reused outside this module.
struct RelaxedVerifier;

impl ServerCertVerifier for RelaxedVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

// ----------------------------------------------------------------------------
// Config Construction
// ----------------------------------------------------------------------------

/// Build a client TLS config from staged material.
///
/// Fails with [`EngineError::Allocation`] when a staged file cannot be read
/// or yields no usable material.
pub(crate) fn build_client_config(material: &TlsMaterial) -> Result<Arc<ClientConfig>, EngineError> {
    let mut roots = RootCertStore::empty();
    if let Some(ca_path) = &material.ca_path {
        let certs = load_certs(ca_path)?;
        if certs.is_empty() {
            warn!(path = %ca_path.display(), "CA bundle contained no certificates");
        }
        for cert in certs {
            roots.add(&cert).map_err(|e| EngineError::Allocation {
                reason: format!("invalid CA certificate in {}: {e}", ca_path.display()),
            })?;
        }
    }

    let builder = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots);

    let mut config = match (&material.cert_path, &material.key_path) {
        (Some(cert_path), Some(key_path)) => {
            let certs = load_certs(cert_path)?;
            let key = load_private_key(key_path)?;
            builder
                .with_client_auth_cert(certs, key)
                .map_err(|e| EngineError::Allocation {
                    reason: format!("client certificate rejected: {e}"),
                })?
        }
        _ => builder.with_no_client_auth(),
    };

    config
        .dangerous()
        .set_certificate_verifier(Arc::new(RelaxedVerifier));

    debug!(
        client_auth = material.cert_path.is_some() && material.key_path.is_some(),
        "built relaxed-trust TLS config"
    );
    Ok(Arc::new(config))
}

fn load_certs(path: &Path) -> Result<Vec<Certificate>, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::Allocation {
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader).map_err(|e| EngineError::Allocation {
        reason: format!("cannot parse {}: {e}", path.display()),
    })?;
    Ok(certs.into_iter().map(Certificate).collect())
}

fn load_private_key(path: &Path) -> Result<PrivateKey, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::Allocation {
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    let mut reader = BufReader::new(file);

    // Accept PKCS#8, RSA, or SEC1 keys, first match wins.
    loop {
        match rustls_pemfile::read_one(&mut reader).map_err(|e| EngineError::Allocation {
            reason: format!("cannot parse {}: {e}", path.display()),
        })? {
            Some(rustls_pemfile::Item::PKCS8Key(key))
            | Some(rustls_pemfile::Item::RSAKey(key))
            | Some(rustls_pemfile::Item::ECKey(key)) => return Ok(PrivateKey(key)),
            Some(_) => continue,
            None => {
                return Err(EngineError::Allocation {
                    reason: format!("no private key found in {}", path.display()),
                })
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_relaxed_verifier_accepts_any_certificate() {
        let verifier = RelaxedVerifier;
        let cert = Certificate(vec![0u8; 8]);
        let name = ServerName::try_from("example.com").unwrap();
        let result = verifier.verify_server_cert(
            &cert,
            &[],
            &name,
            &mut std::iter::empty(),
            &[],
            SystemTime::now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_without_material_builds() {
        let material = TlsMaterial::default();
        assert!(build_client_config(&material).is_ok());
    }

    #[test]
    fn test_missing_ca_file_is_allocation_error() {
        let material = TlsMaterial {
            ca_path: Some("/nonexistent/ca.pem".into()),
            cert_path: None,
            key_path: None,
        };
        let err = build_client_config(&material).unwrap_err();
        assert!(matches!(err, EngineError::Allocation { .. }));
    }

    #[test]
    fn test_ca_file_without_pem_blocks_builds_empty_roots() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a certificate").unwrap();

        let material = TlsMaterial {
            ca_path: Some(file.path().to_path_buf()),
            cert_path: None,
            key_path: None,
        };
        // No parse error: the bundle simply contributes nothing.
        assert!(build_client_config(&material).is_ok());
    }

    #[test]
    fn test_key_file_without_key_is_allocation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a key").unwrap();

        let material = TlsMaterial {
            ca_path: None,
            cert_path: Some(file.path().to_path_buf()),
            key_path: Some(file.path().to_path_buf()),
        };
        let err = build_client_config(&material).unwrap_err();
        assert!(matches!(err, EngineError::Allocation { .. }));
    }
}
