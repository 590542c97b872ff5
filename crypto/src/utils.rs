use byteorder::{ByteOrder, LittleEndian};

use super::CipherError;
use super::constants::*;

pub fn load_word(src: &[u8]) -> u64 {
    assert!(src.len() == 8, "Slice length is not 8");

    LittleEndian::read_u64(src)
}

pub fn store_word(src: u64, dst: &mut [u8]) {
    assert!(dst.len() >= 8, "Slice length must be at least 8");

    LittleEndian::write_u64(&mut dst[..8], src);
}

pub fn load_words256(src: &[u8]) -> [u64; NUM_WORDS256] {
    let mut words = [0u64; NUM_WORDS256];
    LittleEndian::read_u64_into(&src[..BLOCK_SIZE256], &mut words);
    words
}

pub fn store_words256(words: &[u64; NUM_WORDS256], dst: &mut [u8]) {
    LittleEndian::write_u64_into(words, &mut dst[..BLOCK_SIZE256]);
}

pub fn calculate_tweak(tweak: &[u8]) -> Result<[u64; TWEAK_COUNT], CipherError> {
    if tweak.len() != TWEAK_SIZE {
        return Err(CipherError::InvalidTweakLength {
            expected: TWEAK_SIZE,
            actual: tweak.len(),
        });
    }

    let word0 = load_word(&tweak[0..8]);
    let word1 = load_word(&tweak[8..16]);

    Ok([word0, word1, word0 ^ word1])
}

/// XORs `src` and `key` into `dst`, over the length of `dst`.
pub fn xor_into(dst: &mut [u8], src: &[u8], key: &[u8]) {
    dst.iter_mut()
        .zip(src.iter().zip(key.iter()))
        .for_each(|(d, (s, k))| *d = s ^ k);
}

pub fn xor_in_place(dst: &mut [u8], key: &[u8]) {
    dst.iter_mut()
        .zip(key.iter())
        .for_each(|(x1, x2)| *x1 ^= x2);
}

/// Big-endian counter increment, wrapping at the register width.
pub fn increment_be(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        let (next, carry) = byte.overflowing_add(1);
        *byte = next;
        if !carry {
            break;
        }
    }
}
