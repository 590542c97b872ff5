//! Symmetric cipher processing engine.
//!
//! Layers, leaves first:
//!
//! ```text
//! CipherBlock    (Threefish-256: one block in, one block out)
//! CipherMode     (ECB, CBC, CFB, OFB, CTR: chains blocks, owns the register)
//! PaddingScheme  (fills and validates the final block)
//! CipherWrapper  (stride-oriented process_bytes / process_final / reset)
//! ```
//!
//! Stream engines ([`StreamCipher`], ChaCha20) plug straight into the
//! stream wrapper. [`config::CipherConfig`] validates a whole stack and
//! builds the wrapper in one step.
//!
//! ```
//! use crypto::{CipherConfig, KeyParams, ModeKind, PaddingKind, BlockCipherKind};
//!
//! let params = KeyParams::new(vec![7u8; 32], vec![1u8; 32]).with_tweak(vec![0u8; 16]);
//! let config = CipherConfig::block(BlockCipherKind::Threefish256, ModeKind::Cbc, PaddingKind::Pkcs7);
//!
//! let mut enc = config.build(true, &params).unwrap();
//! let mut dec = config.build(false, &params).unwrap();
//!
//! let ciphertext = enc.process_all(b"attack at dawn").unwrap();
//! assert_eq!(ciphertext.len(), 32);
//! assert_eq!(dec.process_all(&ciphertext).unwrap(), b"attack at dawn");
//! ```

mod mix;
mod utils;
mod constants;
pub mod error;
pub mod params;
pub mod threefish256;
pub mod chacha20;
pub mod padding;
pub mod mode;
pub mod ecb;
pub mod cbc;
pub mod cfb;
pub mod ofb;
pub mod ctr;
pub mod wrapper;
pub mod config;

pub use error::{CipherError, ConfigError};
pub use params::KeyParams;
pub use padding::{PaddingKind, PaddingScheme};
pub use mode::{CipherMode, ModeKind};
pub use wrapper::{BlockCipherWrapper, CipherWrapper, StreamCipherWrapper};
pub use config::{BlockCipherKind, CipherConfig, StreamCipherKind};

/// A keyed permutation over fixed-size blocks.
pub trait CipherBlock: Send {
    fn name(&self) -> &'static str;
    fn block_size(&self) -> usize;
    fn legal_key_sizes(&self) -> &'static [usize];

    /// Required tweak length, `None` for untweakable ciphers.
    fn tweak_size(&self) -> Option<usize> {
        None
    }

    fn is_initialized(&self) -> bool;

    /// Derives the key (and tweak) schedule, replacing any previous one.
    fn init(&mut self, key: &[u8], tweak: Option<&[u8]>) -> Result<(), CipherError>;

    /// `src` must be exactly one block, `dst` at least one block.
    fn encrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CipherError>;
    fn decrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CipherError>;
}

/// A keystream generator that encrypts and decrypts by XOR, any length per call.
pub trait StreamCipher: Send {
    fn name(&self) -> &'static str;

    /// Bytes of keystream produced per internal block.
    fn state_size(&self) -> usize;
    fn legal_key_sizes(&self) -> &'static [usize];
    fn iv_size(&self) -> usize;
    fn is_initialized(&self) -> bool;
    fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<(), CipherError>;

    /// XORs keystream over `input` into `output[..input.len()]`; the keystream
    /// position carries over to the next call.
    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError>;

    /// Rewinds the keystream to its starting position under the same key and IV.
    fn reset(&mut self);
}
