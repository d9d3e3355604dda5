//! Event callback bridge
//!
//! Forwards transport events to the registered host handler. Dispatch is
//! synchronous: the service tick does not resume transport processing until
//! the handler returns, so handlers must not block.

use tracing::{trace, warn};

use sockline_core::{Disposition, EventHandler, EventKind, ExtensionPolicy};

// ----------------------------------------------------------------------------
// Callback Bridge
// ----------------------------------------------------------------------------

pub(crate) struct CallbackBridge {
    handler: Box<dyn EventHandler>,
    policy: ExtensionPolicy,
}

impl CallbackBridge {
    pub(crate) fn new(handler: Box<dyn EventHandler>, policy: ExtensionPolicy) -> Self {
        Self { handler, policy }
    }

    /// Notify the handler, then evaluate extension proposals against the
    /// policy. Every other event kind yields the neutral continue code.
    pub(crate) fn dispatch(&mut self, kind: EventKind, payload: Option<&str>) -> Disposition {
        trace!(code = kind.code(), %kind, "dispatching event");
        self.handler.on_event(kind, payload);

        if kind == EventKind::ExtensionNegotiation {
            let extension = payload.unwrap_or_default();
            let disposition = self.policy.evaluate(extension);
            if disposition.is_reject() {
                warn!(extension, "denied extension");
            }
            return disposition;
        }
        Disposition::Continue
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
