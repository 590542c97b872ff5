//! Stride-oriented encrypt/decrypt sessions over block modes and stream engines.
//!
//! A session is driven with any number of [`CipherWrapper::process_bytes`]
//! calls, each exactly [`CipherWrapper::operation_size`] bytes, then exactly
//! one [`CipherWrapper::process_final`] for the tail. Offsets passed in are
//! trusted to be sane; only the lengths each call needs are checked.

use super::constants::MAX_STRIDE_EXPONENT;
use super::padding::NoPadding;
use super::{
    CipherError, CipherMode, ConfigError, PaddingKind, PaddingScheme, StreamCipher,
};

use tracing::{debug, warn};
use zeroize::Zeroize;

pub trait CipherWrapper: Send {
    fn name(&self) -> String;
    fn is_encrypting(&self) -> bool;
    fn block_size(&self) -> usize;

    /// Bytes consumed and produced by every `process_bytes` call.
    fn operation_size(&self) -> usize;

    /// Whether an encrypted message ends in a padded, whole final block.
    fn pads_final_block(&self) -> bool;

    fn process_bytes(
        &mut self,
        input: &[u8],
        in_offset: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize, CipherError>;

    /// Processes the last `length` bytes of the message and returns how many
    /// bytes of output it produced.
    fn process_final(
        &mut self,
        input: &[u8],
        in_offset: usize,
        length: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize, CipherError>;

    fn reset(&mut self);

    /// Runs a whole message through the session.
    fn process_all(&mut self, input: &[u8]) -> Result<Vec<u8>, CipherError> {
        let stride = self.operation_size();
        let padded = self.pads_final_block();
        let encrypting = self.is_encrypting();

        // a padded ciphertext always hands its last block to process_final
        let interior = if padded && !encrypting {
            input.len().saturating_sub(1) / stride
        } else {
            input.len() / stride
        };
        let extra = if padded && encrypting { stride } else { 0 };
        let mut output = vec![0u8; input.len() + extra];

        for i in 0..interior {
            self.process_bytes(input, i * stride, &mut output, i * stride)?;
        }

        let offset = interior * stride;
        let written = self.process_final(input, offset, input.len() - offset, &mut output, offset)?;
        output.truncate(offset + written);

        Ok(output)
    }
}

fn check_len(buf: &[u8], offset: usize, length: usize) -> Result<(), CipherError> {
    let needed = offset.saturating_add(length);
    if buf.len() < needed {
        return Err(CipherError::BufferTooSmall { needed, actual: buf.len() });
    }
    Ok(())
}

/// Wraps a block [`CipherMode`] and its [`PaddingScheme`].
pub struct BlockCipherWrapper {
    encrypting: bool,
    mode: Box<dyn CipherMode>,
    padding: Box<dyn PaddingScheme>,
    block_size: usize,
    scratch_in: Vec<u8>,
    scratch_out: Vec<u8>,
}

impl BlockCipherWrapper {
    /// `mode` must already be initialized for the same direction. A missing
    /// padding scheme means [`PaddingKind::None`].
    pub fn new(
        encrypting: bool,
        mode: Box<dyn CipherMode>,
        padding: Option<Box<dyn PaddingScheme>>,
    ) -> Result<BlockCipherWrapper, CipherError> {
        let padding = padding.unwrap_or_else(|| Box::new(NoPadding));

        let kind = mode.kind();
        let unpadded = padding.kind() == PaddingKind::None;
        if kind.requires_padding() && unpadded {
            return Err(ConfigError::PaddingRequired { mode: kind.name() }.into());
        }
        if !kind.requires_padding() && !unpadded {
            return Err(ConfigError::PaddingForbidden {
                mode: kind.name(),
                padding: padding.name(),
            }
            .into());
        }
        if !mode.is_initialized() {
            return Err(CipherError::NotInitialized);
        }
        if mode.is_encryption() != encrypting {
            return Err(ConfigError::DirectionMismatch.into());
        }

        let block_size = mode.block_size();
        debug!(
            cipher = mode.cipher_name(),
            mode = kind.name(),
            padding = padding.name(),
            encrypting,
            "block cipher wrapper ready"
        );

        Ok(BlockCipherWrapper {
            encrypting,
            mode,
            padding,
            block_size,
            scratch_in: vec![0u8; block_size],
            scratch_out: vec![0u8; block_size],
        })
    }

    fn finalize(
        &mut self,
        input: &[u8],
        in_offset: usize,
        length: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize, CipherError> {
        let bs = self.block_size;

        if self.mode.supports_partial() {
            if length > bs {
                return Err(CipherError::InvalidFinalLength { length, block_size: bs });
            }
            if length == 0 {
                return Ok(0);
            }
            check_len(input, in_offset, length)?;
            check_len(output, out_offset, length)?;

            self.scratch_in[..length].copy_from_slice(&input[in_offset..in_offset + length]);
            self.scratch_in[length..].fill(0);
            self.mode.transform(&self.scratch_in, &mut self.scratch_out)?;
            output[out_offset..out_offset + length].copy_from_slice(&self.scratch_out[..length]);

            return Ok(length);
        }

        if self.encrypting {
            if length >= bs {
                return Err(CipherError::InvalidFinalLength { length, block_size: bs });
            }
            check_len(input, in_offset, length)?;
            check_len(output, out_offset, bs)?;

            self.scratch_in[..length].copy_from_slice(&input[in_offset..in_offset + length]);
            self.padding.add_padding(&mut self.scratch_in, length);
            self.mode.transform(&self.scratch_in, &mut output[out_offset..out_offset + bs])?;

            return Ok(bs);
        }

        if length == bs {
            check_len(input, in_offset, bs)?;

            self.mode.transform(&input[in_offset..in_offset + bs], &mut self.scratch_out)?;
            let count = self.pad_count_of(None)?;
            let data = bs - count;
            check_len(output, out_offset, data)?;
            output[out_offset..out_offset + data].copy_from_slice(&self.scratch_out[..data]);

            Ok(data)
        } else if length == 0 && out_offset >= bs {
            // the final block already went through process_bytes; its
            // plaintext sits just before out_offset
            check_len(output, out_offset - bs, bs)?;
            let count = self.pad_count_of(Some(&output[out_offset - bs..out_offset]))?;

            Ok(bs - count)
        } else {
            Err(CipherError::InvalidFinalLength { length, block_size: bs })
        }
    }

    fn pad_count_of(&self, block: Option<&[u8]>) -> Result<usize, CipherError> {
        let block = block.unwrap_or(&self.scratch_out);
        self.padding.pad_count(block).map_err(|e| {
            warn!(padding = self.padding.name(), "rejected final block padding");
            e
        })
    }
}

impl CipherWrapper for BlockCipherWrapper {
    fn name(&self) -> String {
        format!("{}/{}/{}", self.mode.cipher_name(), self.mode.name(), self.padding.name())
    }

    fn is_encrypting(&self) -> bool {
        self.encrypting
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn operation_size(&self) -> usize {
        self.block_size
    }

    fn pads_final_block(&self) -> bool {
        !self.mode.supports_partial()
    }

    fn process_bytes(
        &mut self,
        input: &[u8],
        in_offset: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize, CipherError> {
        let bs = self.block_size;
        check_len(input, in_offset, bs)?;
        check_len(output, out_offset, bs)?;

        self.mode.transform(&input[in_offset..in_offset + bs], &mut output[out_offset..out_offset + bs])
    }

    /// Always leaves the wrapper reset, whether or not the call succeeded.
    fn process_final(
        &mut self,
        input: &[u8],
        in_offset: usize,
        length: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize, CipherError> {
        let result = self.finalize(input, in_offset, length, output, out_offset);
        self.reset();
        result
    }

    fn reset(&mut self) {
        self.mode.reset();
        self.scratch_in.fill(0);
        self.scratch_out.fill(0);
    }
}

impl Drop for BlockCipherWrapper {
    fn drop(&mut self) {
        self.scratch_in.zeroize();
        self.scratch_out.zeroize();
    }
}

/// Wraps a [`StreamCipher`], batching `2^stride_exponent` internal blocks per call.
pub struct StreamCipherWrapper {
    encrypting: bool,
    engine: Box<dyn StreamCipher>,
    operation_size: usize,
}

impl StreamCipherWrapper {
    pub fn new(
        encrypting: bool,
        engine: Box<dyn StreamCipher>,
        stride_exponent: u8,
    ) -> Result<StreamCipherWrapper, CipherError> {
        if stride_exponent > MAX_STRIDE_EXPONENT {
            return Err(ConfigError::InvalidStrideExponent(stride_exponent).into());
        }
        if !engine.is_initialized() {
            return Err(CipherError::NotInitialized);
        }

        let operation_size = engine.state_size() << stride_exponent;
        debug!(cipher = engine.name(), operation_size, encrypting, "stream cipher wrapper ready");

        Ok(StreamCipherWrapper {
            encrypting,
            engine,
            operation_size,
        })
    }
}

impl CipherWrapper for StreamCipherWrapper {
    fn name(&self) -> String {
        self.engine.name().to_string()
    }

    fn is_encrypting(&self) -> bool {
        self.encrypting
    }

    fn block_size(&self) -> usize {
        self.engine.state_size()
    }

    fn operation_size(&self) -> usize {
        self.operation_size
    }

    fn pads_final_block(&self) -> bool {
        false
    }

    fn process_bytes(
        &mut self,
        input: &[u8],
        in_offset: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize, CipherError> {
        let size = self.operation_size;
        check_len(input, in_offset, size)?;
        check_len(output, out_offset, size)?;

        self.engine.transform(&input[in_offset..in_offset + size], &mut output[out_offset..out_offset + size])?;
        Ok(size)
    }

    /// An empty final chunk changes nothing; otherwise the engine is rewound afterwards.
    fn process_final(
        &mut self,
        input: &[u8],
        in_offset: usize,
        length: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize, CipherError> {
        if length == 0 {
            return Ok(0);
        }
        check_len(input, in_offset, length)?;
        check_len(output, out_offset, length)?;

        let result = self
            .engine
            .transform(&input[in_offset..in_offset + length], &mut output[out_offset..out_offset + length]);
        self.reset();
        result.map(|_| length)
    }

    fn reset(&mut self) {
        self.engine.reset();
    }
}
