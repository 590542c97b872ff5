use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::constants::LEGAL_BLOCK_SIZES;
use super::{
    cbc::Cbc, cfb::Cfb, ctr::Ctr, ecb::Ecb, ofb::Ofb, CipherBlock, CipherError, ConfigError,
    KeyParams,
};

/// Chains a [`CipherBlock`] over successive blocks.
///
/// `transform` reads exactly `block_size()` bytes from the front of `input`
/// and writes as many to the front of `output`.
pub trait CipherMode: Send {
    fn kind(&self) -> ModeKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Underlying primitive's name.
    fn cipher_name(&self) -> &'static str;

    /// The stride the mode consumes per call.
    fn block_size(&self) -> usize;

    fn is_encryption(&self) -> bool;
    fn is_initialized(&self) -> bool;

    /// Whether a short final block can be processed without padding.
    fn supports_partial(&self) -> bool {
        !self.kind().requires_padding()
    }

    fn init(&mut self, encryption: bool, params: &KeyParams) -> Result<(), CipherError>;
    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CipherError>;

    /// Restores the register to the IV.
    fn reset(&mut self);
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Ecb,
    Cbc,
    Cfb,
    Ofb,
    Ctr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeCapability {
    pub requires_padding: bool,
    pub uses_iv: bool,
    pub variable_feedback: bool,
}

const CAPABILITIES: [(ModeKind, ModeCapability); 5] = [
    (ModeKind::Ecb, ModeCapability { requires_padding: true,  uses_iv: false, variable_feedback: false }),
    (ModeKind::Cbc, ModeCapability { requires_padding: true,  uses_iv: true,  variable_feedback: false }),
    (ModeKind::Cfb, ModeCapability { requires_padding: false, uses_iv: true,  variable_feedback: true  }),
    (ModeKind::Ofb, ModeCapability { requires_padding: false, uses_iv: true,  variable_feedback: false }),
    (ModeKind::Ctr, ModeCapability { requires_padding: false, uses_iv: true,  variable_feedback: false }),
];

impl ModeKind {
    pub const ALL: [ModeKind; 5] = [
        ModeKind::Ecb,
        ModeKind::Cbc,
        ModeKind::Cfb,
        ModeKind::Ofb,
        ModeKind::Ctr,
    ];

    pub fn capability(self) -> ModeCapability {
        CAPABILITIES[self as usize].1
    }

    pub fn requires_padding(self) -> bool {
        self.capability().requires_padding
    }

    pub fn name(self) -> &'static str {
        match self {
            ModeKind::Ecb => "ECB",
            ModeKind::Cbc => "CBC",
            ModeKind::Cfb => "CFB",
            ModeKind::Ofb => "OFB",
            ModeKind::Ctr => "CTR",
        }
    }

    /// Builds an uninitialized mode around `cipher`.
    pub fn build(
        self,
        cipher: Box<dyn CipherBlock>,
        feedback_size: Option<usize>,
    ) -> Result<Box<dyn CipherMode>, CipherError> {
        if feedback_size.is_some() && !self.capability().variable_feedback {
            return Err(ConfigError::FeedbackNotSupported { mode: self.name() }.into());
        }

        let mode: Box<dyn CipherMode> = match self {
            ModeKind::Ecb => Box::new(Ecb::new(cipher)?),
            ModeKind::Cbc => Box::new(Cbc::new(cipher)?),
            ModeKind::Cfb => {
                let feedback = feedback_size.unwrap_or_else(|| cipher.block_size());
                Box::new(Cfb::with_feedback(cipher, feedback)?)
            }
            ModeKind::Ofb => Box::new(Ofb::new(cipher)?),
            ModeKind::Ctr => Box::new(Ctr::new(cipher)?),
        };
        Ok(mode)
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModeKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown cipher mode: {}", s))
    }
}

pub(crate) fn check_block_size(cipher: &dyn CipherBlock) -> Result<usize, CipherError> {
    let block_size = cipher.block_size();
    if !LEGAL_BLOCK_SIZES.contains(&block_size) {
        return Err(ConfigError::InvalidBlockSize {
            legal: &LEGAL_BLOCK_SIZES,
            actual: block_size,
        }
        .into());
    }
    Ok(block_size)
}

/// IV must fill the register exactly.
pub(crate) fn check_iv(iv: &[u8], block_size: usize) -> Result<(), CipherError> {
    if iv.len() != block_size {
        return Err(CipherError::InvalidIVLength {
            expected: block_size,
            actual: iv.len(),
        });
    }
    Ok(())
}

/// Bounds for one `transform` call.
#[inline]
pub(crate) fn check_stride(
    input: &[u8],
    output: &[u8],
    stride: usize,
) -> Result<(), CipherError> {
    if input.len() < stride {
        return Err(CipherError::BufferTooSmall { needed: stride, actual: input.len() });
    }
    if output.len() < stride {
        return Err(CipherError::BufferTooSmall { needed: stride, actual: output.len() });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Identity "cipher" with a configurable block size.
    pub struct NullCipher {
        pub block_size: usize,
        pub initialized: bool,
    }

    impl NullCipher {
        pub fn boxed(block_size: usize) -> Box<dyn CipherBlock> {
            Box::new(NullCipher { block_size, initialized: false })
        }
    }

    impl CipherBlock for NullCipher {
        fn name(&self) -> &'static str {
            "Null"
        }

        fn block_size(&self) -> usize {
            self.block_size
        }

        fn legal_key_sizes(&self) -> &'static [usize] {
            &[0]
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn init(&mut self, _key: &[u8], _tweak: Option<&[u8]>) -> Result<(), CipherError> {
            self.initialized = true;
            Ok(())
        }

        fn encrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CipherError> {
            dst[..self.block_size].copy_from_slice(src);
            Ok(())
        }

        fn decrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CipherError> {
            dst[..self.block_size].copy_from_slice(src);
            Ok(())
        }
    }
}

#[cfg(test)]
mod mode_test {
    use super::test_support::NullCipher;
    use super::*;
    use crate::threefish256::Threefish256;

    #[test]
    fn capability_table_is_indexed_by_kind() {
        for kind in ModeKind::ALL {
            assert_eq!(CAPABILITIES[kind as usize].0, kind);
        }
    }

    #[test]
    fn padding_requirement() {
        assert!(ModeKind::Ecb.requires_padding());
        assert!(ModeKind::Cbc.requires_padding());
        assert!(!ModeKind::Cfb.requires_padding());
        assert!(!ModeKind::Ofb.requires_padding());
        assert!(!ModeKind::Ctr.requires_padding());
    }

    #[test]
    fn feedback_only_for_cfb() {
        let r = ModeKind::Cbc.build(Box::new(Threefish256::new()), Some(8));
        assert_eq!(
            r.err(),
            Some(CipherError::Config(ConfigError::FeedbackNotSupported { mode: "CBC" }))
        );

        let cfb = ModeKind::Cfb.build(Box::new(Threefish256::new()), Some(8)).unwrap();
        assert_eq!(cfb.block_size(), 8);
        assert!(cfb.supports_partial());

        let cfb = ModeKind::Cfb.build(Box::new(Threefish256::new()), None).unwrap();
        assert_eq!(cfb.block_size(), 32);
    }

    #[test]
    fn odd_block_size_is_rejected() {
        for kind in ModeKind::ALL {
            let r = kind.build(NullCipher::boxed(24), None);
            assert!(
                matches!(r, Err(CipherError::Config(ConfigError::InvalidBlockSize { actual: 24, .. }))),
                "{}", kind
            );
        }
    }

    #[test]
    fn kind_parses() {
        assert_eq!("cfb".parse::<ModeKind>().unwrap(), ModeKind::Cfb);
        assert_eq!("CTR".parse::<ModeKind>().unwrap(), ModeKind::Ctr);
        assert!("gcm".parse::<ModeKind>().is_err());
    }
}
