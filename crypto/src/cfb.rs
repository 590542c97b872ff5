//! Cipher feedback mode with a configurable feedback width.
//!
//! The primitive only ever runs forward. Each step encrypts the register,
//! XORs the first `feedback_size` bytes of keystream over the input, then
//! shifts the register left by `feedback_size` and appends the ciphertext
//! just produced (or consumed, when decrypting). A corrupted ciphertext unit
//! therefore garbles at most `ceil(block_size / feedback_size)` following
//! units before decryption falls back into step.

use super::mode::{check_block_size, check_stride, CipherMode, ModeKind};
use super::utils::xor_into;
use super::{CipherBlock, CipherError, ConfigError, KeyParams};

use tracing::debug;
use zeroize::Zeroize;

pub struct Cfb {
    cipher: Box<dyn CipherBlock>,
    block_size: usize,
    feedback_size: usize,
    iv: Vec<u8>,
    register: Vec<u8>,
    keystream: Vec<u8>,
    encryption: bool,
    initialized: bool,
}

impl Cfb {
    /// Full-block feedback.
    pub fn new(cipher: Box<dyn CipherBlock>) -> Result<Cfb, CipherError> {
        let feedback_size = cipher.block_size();
        Cfb::with_feedback(cipher, feedback_size)
    }

    pub fn with_feedback(cipher: Box<dyn CipherBlock>, feedback_size: usize) -> Result<Cfb, CipherError> {
        let block_size = check_block_size(cipher.as_ref())?;
        if feedback_size == 0 || feedback_size > block_size {
            return Err(ConfigError::InvalidFeedbackSize {
                feedback: feedback_size,
                block_size,
            }
            .into());
        }

        Ok(Cfb {
            cipher,
            block_size,
            feedback_size,
            iv: vec![0u8; block_size],
            register: vec![0u8; block_size],
            keystream: vec![0u8; block_size],
            encryption: true,
            initialized: false,
        })
    }

    pub fn feedback_size(&self) -> usize {
        self.feedback_size
    }

    /// Size of the shift register, the primitive's block size.
    pub fn register_size(&self) -> usize {
        self.block_size
    }
}

impl CipherMode for Cfb {
    fn kind(&self) -> ModeKind {
        ModeKind::Cfb
    }

    fn cipher_name(&self) -> &'static str {
        self.cipher.name()
    }

    fn block_size(&self) -> usize {
        self.feedback_size
    }

    fn is_encryption(&self) -> bool {
        self.encryption
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn init(&mut self, encryption: bool, params: &KeyParams) -> Result<(), CipherError> {
        let iv = params.iv();
        if iv.len() > self.block_size {
            return Err(CipherError::InvalidIVLength {
                expected: self.block_size,
                actual: iv.len(),
            });
        }
        self.cipher.init(params.key(), params.tweak())?;

        // short IVs are right-aligned in the register
        let pad = self.block_size - iv.len();
        self.iv[..pad].fill(0);
        self.iv[pad..].copy_from_slice(iv);

        self.encryption = encryption;
        self.initialized = true;
        self.reset();
        debug!(
            cipher = self.cipher.name(),
            encryption,
            feedback = self.feedback_size,
            "CFB initialized"
        );
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CipherError> {
        if !self.initialized {
            return Err(CipherError::NotInitialized);
        }
        let f = self.feedback_size;
        check_stride(input, output, f)?;

        self.cipher.encrypt(&self.register, &mut self.keystream)?;
        xor_into(&mut output[..f], &input[..f], &self.keystream);

        let tail = self.block_size - f;
        self.register.copy_within(f.., 0);
        let fed_back = if self.encryption { &output[..f] } else { &input[..f] };
        self.register[tail..].copy_from_slice(fed_back);

        Ok(f)
    }

    fn reset(&mut self) {
        self.register.copy_from_slice(&self.iv);
        self.keystream.fill(0);
    }
}

impl Drop for Cfb {
    fn drop(&mut self) {
        self.iv.zeroize();
        self.register.zeroize();
        self.keystream.zeroize();
    }
}
