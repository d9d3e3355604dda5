//! Extension negotiation policy

use serde::{Deserialize, Serialize};

use crate::event::Disposition;

/// Extension names refused when deflate denial is enabled.
const DEFLATE_EXTENSIONS: [&str; 2] = ["deflate-stream", "deflate-frame"];

/// Extension name refused when multiplexing denial is enabled.
const MUX_EXTENSION: &str = "x-google-mux";

// ----------------------------------------------------------------------------
// Extension Policy
// ----------------------------------------------------------------------------

/// Denylist policy applied to server-proposed extensions.
///
/// Both flags default to off, so every proposed extension is accepted unless
/// the host opts into denial before initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionPolicy {
    /// Refuse compression extensions (`deflate-stream`, `deflate-frame`).
    pub deny_deflate: bool,
    /// Refuse the multiplexing extension (`x-google-mux`).
    pub deny_mux: bool,
}

impl ExtensionPolicy {
    /// Fully permissive policy.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Evaluate a proposed extension name against the policy.
    pub fn evaluate(&self, extension: &str) -> Disposition {
        if self.deny_deflate && DEFLATE_EXTENSIONS.contains(&extension) {
            return Disposition::Reject;
        }
        if self.deny_mux && extension == MUX_EXTENSION {
            return Disposition::Reject;
        }
        Disposition::Continue
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_policy_accepts_everything() {
        let policy = ExtensionPolicy::permissive();
        assert_eq!(policy.evaluate("deflate-frame"), Disposition::Continue);
        assert_eq!(policy.evaluate("deflate-stream"), Disposition::Continue);
        assert_eq!(policy.evaluate("x-google-mux"), Disposition::Continue);
        assert_eq!(policy.evaluate("permessage-deflate"), Disposition::Continue);
    }

    #[test]
    fn test_deny_deflate_rejects_both_deflate_names() {
        let policy = ExtensionPolicy {
            deny_deflate: true,
            deny_mux: false,
        };
        assert_eq!(policy.evaluate("deflate-frame"), Disposition::Reject);
        assert_eq!(policy.evaluate("deflate-stream"), Disposition::Reject);
        // Mux denial is off, so the mux extension still passes.
        assert_eq!(policy.evaluate("x-google-mux"), Disposition::Continue);
    }

    #[test]
    fn test_deny_mux_rejects_only_mux() {
        let policy = ExtensionPolicy {
            deny_deflate: false,
            deny_mux: true,
        };
        assert_eq!(policy.evaluate("x-google-mux"), Disposition::Reject);
        assert_eq!(policy.evaluate("deflate-frame"), Disposition::Continue);
    }

    #[test]
    fn test_unknown_extension_always_continues() {
        let policy = ExtensionPolicy {
            deny_deflate: true,
            deny_mux: true,
        };
        assert_eq!(policy.evaluate("some-future-extension"), Disposition::Continue);
    }
}
