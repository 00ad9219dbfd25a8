//! Capacity-bounded, append-only output buffer.
use std::fmt;

/// Returned when a frame does not fit into the remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    /// Bytes the rejected frame needed.
    pub needed: usize,
    /// Bytes still free when the frame was rejected.
    pub remaining: usize,
}

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "output capacity exceeded (frame needs {} bytes, {} remaining)",
            self.needed, self.remaining
        )
    }
}

impl std::error::Error for CapacityExceeded {}

/// Append-only byte buffer that never grows past `capacity`.
///
/// Frames are appended whole with [`OutputBuffer::push_frame`]; a frame
/// that does not fit is rejected without touching the buffer, so the
/// contents always end on a frame boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl OutputBuffer {
    /// Empty buffer that accepts at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity,
        }
    }

    /// Append `frame` if it fits entirely.
    pub fn push_frame(&mut self, frame: &[u8]) -> Result<(), CapacityExceeded> {
        let remaining = self.remaining();
        if frame.len() > remaining {
            return Err(CapacityExceeded {
                needed: frame.len(),
                remaining,
            });
        }
        self.bytes.extend_from_slice(frame);
        Ok(())
    }

    /// Maximum number of bytes the buffer accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.bytes.len())
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` while no frame has been written.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `true` once no further byte can be appended.
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// The frames written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer and return its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for OutputBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
