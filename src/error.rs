use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when working with sensor protocol data
#[derive(Error, Debug)]
pub enum VelolinkError {
    /// No codec is registered for the characteristic
    #[error("No codec registered for characteristic {0}")]
    UnknownCharacteristic(Uuid),

    /// Buffer is shorter than the mandatory lead of the message
    #[error("Message for {characteristic} truncated before its mandatory lead")]
    Truncated {
        /// Characteristic the buffer was notified for
        characteristic: Uuid,
    },

    /// A response carried an op code this crate recognizes the shape of
    /// but does not decode
    #[error("Unhandled op code: {opcode:02X}")]
    UnhandledOpCode {
        /// Raw op code byte
        opcode: u8,
    },

    /// Invalid command parameters
    #[error("Invalid command parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for velolink operations
pub type Result<T> = std::result::Result<T, VelolinkError>;

impl VelolinkError {
    /// Check if this error is an identified-but-unhandled condition rather
    /// than a malfunction
    #[must_use]
    pub const fn is_unhandled(&self) -> bool {
        matches!(self, Self::UnhandledOpCode { .. })
    }

    /// Check if this error is recoverable by retrying with corrected input
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::InvalidParameters(_) | Self::UnhandledOpCode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let unknown = VelolinkError::UnknownCharacteristic(Uuid::nil());
        assert!(!unknown.is_unhandled());
        assert!(!unknown.is_recoverable());

        let unhandled = VelolinkError::UnhandledOpCode { opcode: 0x42 };
        assert!(unhandled.is_unhandled());
        assert!(unhandled.is_recoverable());

        let truncated = VelolinkError::Truncated {
            characteristic: Uuid::nil(),
        };
        assert!(!truncated.is_unhandled());
        assert!(truncated.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = VelolinkError::InvalidParameters("grade out of range".to_string());
        let error_string = format!("{error}");
        assert!(error_string.contains("Invalid command parameters"));
        assert!(error_string.contains("grade out of range"));
    }
}
