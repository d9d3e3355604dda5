//! Outbound frame staging
//!
//! Payloads are staged into a buffer with a reserved pre-padding region ahead
//! of the payload bytes so the frame header can be written in place by the
//! transport without a second allocation. The buffer is dropped after
//! dispatch on every path, success or failure.

/// Bytes reserved ahead of the payload for the frame header.
pub const SEND_PRE_PADDING: usize = 16;

// ----------------------------------------------------------------------------
// Frame Buffer
// ----------------------------------------------------------------------------

/// A staged outbound payload: `SEND_PRE_PADDING` zeroed bytes followed by the
/// payload bytes.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    /// Stage a payload, reserving the pre-padding region ahead of it.
    pub fn stage(payload: &[u8]) -> Self {
        let mut buf = vec![0u8; SEND_PRE_PADDING + payload.len()];
        buf[SEND_PRE_PADDING..].copy_from_slice(payload);
        Self { buf }
    }

    /// The staged payload bytes (padding excluded).
    pub fn payload(&self) -> &[u8] {
        &self.buf[SEND_PRE_PADDING..]
    }

    /// Length of the staged payload in bytes.
    pub fn payload_len(&self) -> usize {
        self.buf.len() - SEND_PRE_PADDING
    }

    /// Consume the buffer, returning the payload bytes and releasing the
    /// padding region.
    pub fn into_payload(mut self) -> Vec<u8> {
        self.buf.split_off(SEND_PRE_PADDING)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_reserves_padding() {
        let staged = FrameBuffer::stage(b"ping");
        assert_eq!(staged.payload_len(), 4);
        assert_eq!(staged.payload(), b"ping");
        // The reserved region is zeroed.
        assert_eq!(&staged.buf[..SEND_PRE_PADDING], &[0u8; SEND_PRE_PADDING]);
        assert_eq!(staged.buf.len(), SEND_PRE_PADDING + 4);
    }

    #[test]
    fn test_empty_payload_stages_padding_only() {
        let staged = FrameBuffer::stage(b"");
        assert_eq!(staged.payload_len(), 0);
        assert!(staged.payload().is_empty());
        assert_eq!(staged.buf.len(), SEND_PRE_PADDING);
    }

    #[test]
    fn test_into_payload_strips_padding() {
        let staged = FrameBuffer::stage(b"hello");
        assert_eq!(staged.into_payload(), b"hello".to_vec());
    }
}
