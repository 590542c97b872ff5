use super::mode::{check_block_size, check_iv, check_stride, CipherMode, ModeKind};
use super::utils::{increment_be, xor_into};
use super::{CipherBlock, CipherError, KeyParams};

use tracing::debug;
use zeroize::Zeroize;

/// Counter mode. The IV is the initial counter, incremented big-endian per block.
pub struct Ctr {
    cipher: Box<dyn CipherBlock>,
    block_size: usize,
    iv: Vec<u8>,
    counter: Vec<u8>,
    buffer: Vec<u8>,
    encryption: bool,
    initialized: bool,
}

impl Ctr {
    pub fn new(cipher: Box<dyn CipherBlock>) -> Result<Ctr, CipherError> {
        let block_size = check_block_size(cipher.as_ref())?;

        Ok(Ctr {
            cipher,
            block_size,
            iv: vec![0u8; block_size],
            counter: vec![0u8; block_size],
            buffer: vec![0u8; block_size],
            encryption: true,
            initialized: false,
        })
    }
}

impl CipherMode for Ctr {
    fn kind(&self) -> ModeKind {
        ModeKind::Ctr
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
        check_iv(params.iv(), self.block_size)?;
        self.cipher.init(params.key(), params.tweak())?;

        self.iv.copy_from_slice(params.iv());
        self.encryption = encryption;
        self.initialized = true;
        self.reset();
        debug!(cipher = self.cipher.name(), encryption, "CTR initialized");
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CipherError> {
        if !self.initialized {
            return Err(CipherError::NotInitialized);
        }
        check_stride(input, output, self.block_size)?;

        self.cipher.encrypt(&self.counter, &mut self.buffer)?;
        increment_be(&mut self.counter);
        xor_into(&mut output[..self.block_size], input, &self.buffer);

        Ok(self.block_size)
    }

    fn reset(&mut self) {
        self.counter.copy_from_slice(&self.iv);
        self.buffer.fill(0);
    }
}

impl Drop for Ctr {
    fn drop(&mut self) {
        self.iv.zeroize();
        self.counter.zeroize();
        self.buffer.zeroize();
    }
}
