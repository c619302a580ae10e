//! Wire-form parse errors.
//!
//! Every malformed hash, address, nonce or signature received over HTTP is
//! rejected with one of these variants before it reaches domain logic.

use thiserror::Error;

/// Failure to parse a primitive from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not valid hex for the named field.
    #[error("invalid {what} hex: {input:?}")]
    InvalidHex {
        /// Field being parsed.
        what: &'static str,
        /// The offending input.
        input: String,
    },

    /// Valid hex, wrong byte count.
    #[error("{what} must be {expected} bytes, got {got}")]
    BadLength {
        /// Field being parsed.
        what: &'static str,
        /// Required byte count.
        expected: usize,
        /// Actual byte count.
        got: usize,
    },

    /// Not a `0x`-prefixed 40-hex-digit account address.
    #[error("invalid account address: {0:?}")]
    InvalidAddress(String),

    /// Not a decimal nonce in `1..=u32::MAX`.
    #[error("invalid nonce: {0:?}")]
    InvalidNonce(String),
}
