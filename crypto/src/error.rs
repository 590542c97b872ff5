use thiserror::Error;

/// Problems with a cipher configuration, detected before any data is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("key size {actual} is not one of {legal:?}")]
    InvalidKeySize {
        legal: &'static [usize],
        actual: usize,
    },

    #[error("IV size {actual} does not fit a {expected} byte register")]
    InvalidIvSize { expected: usize, actual: usize },

    #[error("tweak size must be {expected}, got {actual}")]
    InvalidTweakSize { expected: usize, actual: usize },

    #[error("{cipher} does not take a tweak")]
    TweakNotSupported { cipher: &'static str },

    #[error("block size {actual} is not one of {legal:?}")]
    InvalidBlockSize {
        legal: &'static [usize],
        actual: usize,
    },

    #[error("feedback size {feedback} must be in [1, {block_size}]")]
    InvalidFeedbackSize { feedback: usize, block_size: usize },

    #[error("{mode} has no configurable feedback size")]
    FeedbackNotSupported { mode: &'static str },

    #[error("stride exponent {0} must be in [0, 8]")]
    InvalidStrideExponent(u8),

    #[error("{mode} requires a padding scheme")]
    PaddingRequired { mode: &'static str },

    #[error("{mode} is a streaming mode and cannot use {padding} padding")]
    PaddingForbidden {
        mode: &'static str,
        padding: &'static str,
    },

    #[error("wrapper direction does not match the direction the engine was initialized for")]
    DirectionMismatch,
}

/// Errors produced by the cipher engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid tweak length: expected {expected}, got {actual}")]
    InvalidTweakLength { expected: usize, actual: usize },

    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIVLength { expected: usize, actual: usize },

    #[error("plaintext block has the wrong length")]
    InvalidPlaintextLength,

    #[error("ciphertext block has the wrong length")]
    InvalidCiphertextLength,

    #[error("cipher used before init")]
    NotInitialized,

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("padding of the final block is corrupt")]
    CorruptPadding,

    #[error("final chunk of {length} bytes is not valid for block size {block_size}")]
    InvalidFinalLength { length: usize, block_size: usize },
}

#[cfg(test)]
mod error_test {
    use super::*;

    #[test]
    fn config_error_converts() {
        let err: CipherError = ConfigError::InvalidStrideExponent(9).into();
        assert_eq!(err, CipherError::Config(ConfigError::InvalidStrideExponent(9)));
        assert_eq!(
            err.to_string(),
            "invalid configuration: stride exponent 9 must be in [0, 8]"
        );
    }

    #[test]
    fn display_buffer_too_small() {
        let err = CipherError::BufferTooSmall { needed: 32, actual: 31 };
        assert_eq!(err.to_string(), "buffer too small: need 32 bytes, got 31");
    }

    #[test]
    fn display_padding_forbidden() {
        let err = ConfigError::PaddingForbidden {
            mode: "CFB",
            padding: "PKCS7",
        };
        assert_eq!(
            err.to_string(),
            "CFB is a streaming mode and cannot use PKCS7 padding"
        );
    }
}
