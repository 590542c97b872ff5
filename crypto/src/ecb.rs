use super::mode::{check_block_size, check_stride, CipherMode, ModeKind};
use super::{CipherBlock, CipherError, KeyParams};

use tracing::debug;

/// Electronic codebook: every block goes through the primitive on its own.
pub struct Ecb {
    cipher: Box<dyn CipherBlock>,
    block_size: usize,
    encryption: bool,
    initialized: bool,
}

impl Ecb {
    pub fn new(cipher: Box<dyn CipherBlock>) -> Result<Ecb, CipherError> {
        let block_size = check_block_size(cipher.as_ref())?;

        Ok(Ecb {
            cipher,
            block_size,
            encryption: true,
            initialized: false,
        })
    }
}

impl CipherMode for Ecb {
    fn kind(&self) -> ModeKind {
        ModeKind::Ecb
    }

    fn cipher_name(&self) -> &'static str {
        self.cipher.name()
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn is_encryption(&self) -> bool {
        self.encryption
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn init(&mut self, encryption: bool, params: &KeyParams) -> Result<(), CipherError> {
        self.cipher.init(params.key(), params.tweak())?;
        self.encryption = encryption;
        self.initialized = true;
        debug!(cipher = self.cipher.name(), encryption, "ECB initialized");
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CipherError> {
        if !self.initialized {
            return Err(CipherError::NotInitialized);
        }
        check_stride(input, output, self.block_size)?;

        let src = &input[..self.block_size];
        if self.encryption {
            self.cipher.encrypt(src, output)?;
        } else {
            self.cipher.decrypt(src, output)?;
        }
        Ok(self.block_size)
    }

    fn reset(&mut self) {}
}
