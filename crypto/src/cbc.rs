use super::mode::{check_block_size, check_iv, check_stride, CipherMode, ModeKind};
use super::utils::xor_in_place;
use super::{CipherBlock, CipherError, KeyParams};

use tracing::debug;
use zeroize::Zeroize;

/// Cipher block chaining: `c[i] = E(p[i] ^ c[i-1])`, `c[-1] = IV`.
pub struct Cbc {
    cipher: Box<dyn CipherBlock>,
    block_size: usize,
    iv: Vec<u8>,
    register: Vec<u8>,
    encryption: bool,
    initialized: bool,
}

impl Cbc {
    pub fn new(cipher: Box<dyn CipherBlock>) -> Result<Cbc, CipherError> {
        let block_size = check_block_size(cipher.as_ref())?;

        Ok(Cbc {
            cipher,
            block_size,
            iv: vec![0u8; block_size],
            register: vec![0u8; block_size],
            encryption: true,
            initialized: false,
        })
    }

    fn encrypt_block(&mut self, src_block: &[u8], dst_block: &mut [u8]) -> Result<(), CipherError> {
        xor_in_place(&mut self.register, src_block);

        self.cipher.encrypt(&self.register, dst_block)?;
        self.register.copy_from_slice(&dst_block[..self.block_size]);
        Ok(())
    }

    fn decrypt_block(&mut self, src_block: &[u8], dst_block: &mut [u8]) -> Result<(), CipherError> {
        self.cipher.decrypt(src_block, dst_block)?;

        xor_in_place(&mut dst_block[..self.block_size], &self.register);
        self.register.copy_from_slice(src_block);
        Ok(())
    }
}

impl CipherMode for Cbc {
    fn kind(&self) -> ModeKind {
        ModeKind::Cbc
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
        debug!(cipher = self.cipher.name(), encryption, "CBC initialized");
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CipherError> {
        if !self.initialized {
            return Err(CipherError::NotInitialized);
        }
        check_stride(input, output, self.block_size)?;

        let src = &input[..self.block_size];
        if self.encryption {
            self.encrypt_block(src, output)?;
        } else {
            self.decrypt_block(src, output)?;
        }
        Ok(self.block_size)
    }

    fn reset(&mut self) {
        self.register.copy_from_slice(&self.iv);
    }
}

impl Drop for Cbc {
    fn drop(&mut self) {
        self.iv.zeroize();
        self.register.zeroize();
    }
}
