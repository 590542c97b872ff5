use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CipherError;

/// Fills the tail of a final block and, after decryption, measures it again.
pub trait PaddingScheme: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> PaddingKind;

    /// Pads `block[offset..]` and returns the number of bytes written.
    fn add_padding(&self, block: &mut [u8], offset: usize) -> usize;

    /// Number of trailing padding bytes in a decrypted final block.
    fn pad_count(&self, block: &[u8]) -> Result<usize, CipherError>;
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaddingKind {
    None,
    Pkcs7,
    X923,
    Iso7816,
    Tbc,
}

impl PaddingKind {
    pub const ALL: [PaddingKind; 5] = [
        PaddingKind::None,
        PaddingKind::Pkcs7,
        PaddingKind::X923,
        PaddingKind::Iso7816,
        PaddingKind::Tbc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaddingKind::None => "None",
            PaddingKind::Pkcs7 => "PKCS7",
            PaddingKind::X923 => "X923",
            PaddingKind::Iso7816 => "ISO7816",
            PaddingKind::Tbc => "TBC",
        }
    }

    pub fn build(self) -> Box<dyn PaddingScheme> {
        match self {
            PaddingKind::None => Box::new(NoPadding),
            PaddingKind::Pkcs7 => Box::new(Pkcs7),
            PaddingKind::X923 => Box::new(X923),
            PaddingKind::Iso7816 => Box::new(Iso7816),
            PaddingKind::Tbc => Box::new(Tbc),
        }
    }
}

impl fmt::Display for PaddingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaddingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaddingKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown padding scheme: {}", s))
    }
}

/// Streaming modes: nothing is added and nothing is expected.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPadding;

impl PaddingScheme for NoPadding {
    fn name(&self) -> &'static str {
        "None"
    }

    fn kind(&self) -> PaddingKind {
        PaddingKind::None
    }

    fn add_padding(&self, _block: &mut [u8], _offset: usize) -> usize {
        0
    }

    fn pad_count(&self, _block: &[u8]) -> Result<usize, CipherError> {
        Ok(0)
    }
}

/// Every padding byte holds the padding length.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pkcs7;

impl PaddingScheme for Pkcs7 {
    fn name(&self) -> &'static str {
        "PKCS7"
    }

    fn kind(&self) -> PaddingKind {
        PaddingKind::Pkcs7
    }

    fn add_padding(&self, block: &mut [u8], offset: usize) -> usize {
        let count = block.len() - offset;
        block[offset..].fill(count as u8);
        count
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize, CipherError> {
        let count = trailing_length(block)?;

        // accumulate instead of returning early on the first bad byte
        let diff = block[block.len() - count..]
            .iter()
            .fold(0u8, |acc, &b| acc | (b ^ count as u8));

        if diff != 0 {
            return Err(CipherError::CorruptPadding);
        }
        Ok(count)
    }
}

/// ANSI X9.23: zero bytes, the last one holding the padding length.
#[derive(Clone, Copy, Debug, Default)]
pub struct X923;

impl PaddingScheme for X923 {
    fn name(&self) -> &'static str {
        "X923"
    }

    fn kind(&self) -> PaddingKind {
        PaddingKind::X923
    }

    fn add_padding(&self, block: &mut [u8], offset: usize) -> usize {
        let count = block.len() - offset;
        if count == 0 {
            return 0;
        }
        block[offset..].fill(0);
        block[block.len() - 1] = count as u8;
        count
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize, CipherError> {
        let count = trailing_length(block)?;

        let diff = block[block.len() - count..block.len() - 1]
            .iter()
            .fold(0u8, |acc, &b| acc | b);

        if diff != 0 {
            return Err(CipherError::CorruptPadding);
        }
        Ok(count)
    }
}

/// ISO/IEC 7816-4: a single `0x80` marker followed by zero bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Iso7816;

const ISO7816_MARKER: u8 = 0x80;

impl PaddingScheme for Iso7816 {
    fn name(&self) -> &'static str {
        "ISO7816"
    }

    fn kind(&self) -> PaddingKind {
        PaddingKind::Iso7816
    }

    fn add_padding(&self, block: &mut [u8], offset: usize) -> usize {
        let count = block.len() - offset;
        if count == 0 {
            return 0;
        }
        block[offset] = ISO7816_MARKER;
        block[offset + 1..].fill(0);
        count
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize, CipherError> {
        let marker = block
            .iter()
            .rposition(|&b| b != 0)
            .ok_or(CipherError::CorruptPadding)?;

        if block[marker] != ISO7816_MARKER {
            return Err(CipherError::CorruptPadding);
        }
        Ok(block.len() - marker)
    }
}

/// Trailing bit complement: pad bytes are the complement of the last data bit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tbc;

impl PaddingScheme for Tbc {
    fn name(&self) -> &'static str {
        "TBC"
    }

    fn kind(&self) -> PaddingKind {
        PaddingKind::Tbc
    }

    fn add_padding(&self, block: &mut [u8], offset: usize) -> usize {
        let code = if offset > 0 && block[offset - 1] & 1 == 1 {
            0x00
        } else {
            0xFF
        };
        block[offset..].fill(code);
        block.len() - offset
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize, CipherError> {
        let code = *block.last().ok_or(CipherError::CorruptPadding)?;
        if code != 0x00 && code != 0xFF {
            return Err(CipherError::CorruptPadding);
        }

        let count = block.iter().rev().take_while(|&&b| b == code).count();

        // a block made only of padding is written for an empty final chunk,
        // and that always uses 0xFF
        if count == block.len() && code != 0xFF {
            return Err(CipherError::CorruptPadding);
        }
        Ok(count)
    }
}

/// Reads a trailing length byte and checks it fits the block.
fn trailing_length(block: &[u8]) -> Result<usize, CipherError> {
    let count = *block.last().ok_or(CipherError::CorruptPadding)? as usize;
    if count == 0 || count > block.len() {
        return Err(CipherError::CorruptPadding);
    }
    Ok(count)
}
