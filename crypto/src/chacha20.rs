use super::constants::*;
use super::{CipherError, StreamCipher};

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// ChaCha20 as in RFC 8439: 256-bit key, 96-bit nonce, 32-bit block counter.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20 {
    state: [u32; 16],
    keystream: [u8; CHACHA_STATE_SIZE],
    #[zeroize(skip)]
    position: usize,
    #[zeroize(skip)]
    initial_counter: u32,
    #[zeroize(skip)]
    initialized: bool,
}

impl ChaCha20 {
    pub fn new() -> ChaCha20 {
        ChaCha20::with_counter(0)
    }

    /// Starts the block counter at `counter` instead of zero.
    pub fn with_counter(counter: u32) -> ChaCha20 {
        ChaCha20 {
            state: [0; 16],
            keystream: [0; CHACHA_STATE_SIZE],
            position: CHACHA_STATE_SIZE,
            initial_counter: counter,
            initialized: false,
        }
    }

    fn refill(&mut self) {
        block(&self.state, &mut self.keystream);
        self.state[CHACHA_COUNTER_WORD] = self.state[CHACHA_COUNTER_WORD].wrapping_add(1);
        self.position = 0;
    }
}

impl Default for ChaCha20 {
    fn default() -> Self {
        ChaCha20::new()
    }
}

impl StreamCipher for ChaCha20 {
    fn name(&self) -> &'static str {
        "ChaCha20"
    }

    fn state_size(&self) -> usize {
        CHACHA_STATE_SIZE
    }

    fn legal_key_sizes(&self) -> &'static [usize] {
        &LEGAL_CHACHA_KEY_SIZES
    }

    fn iv_size(&self) -> usize {
        CHACHA_NONCE_SIZE
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
        if key.len() != CHACHA_KEY_SIZE {
            return Err(CipherError::InvalidKeyLength {
                expected: CHACHA_KEY_SIZE,
                actual: key.len(),
            });
        }
        if iv.len() != CHACHA_NONCE_SIZE {
            return Err(CipherError::InvalidIVLength {
                expected: CHACHA_NONCE_SIZE,
                actual: iv.len(),
            });
        }

        self.state[..4].copy_from_slice(&CHACHA_SIGMA);
        LittleEndian::read_u32_into(key, &mut self.state[4..12]);
        LittleEndian::read_u32_into(iv, &mut self.state[13..16]);
        self.initialized = true;
        self.reset();
        debug!(counter = self.initial_counter, "ChaCha20 initialized");
        Ok(())
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError> {
        if !self.initialized {
            return Err(CipherError::NotInitialized);
        }
        if output.len() < input.len() {
            return Err(CipherError::BufferTooSmall {
                needed: input.len(),
                actual: output.len(),
            });
        }

        let mut done = 0;
        while done < input.len() {
            if self.position == CHACHA_STATE_SIZE {
                self.refill();
            }
            let take = (CHACHA_STATE_SIZE - self.position).min(input.len() - done);
            let keystream = &self.keystream[self.position..self.position + take];

            output[done..done + take]
                .iter_mut()
                .zip(input[done..done + take].iter().zip(keystream))
                .for_each(|(o, (i, k))| *o = i ^ k);

            self.position += take;
            done += take;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.state[CHACHA_COUNTER_WORD] = self.initial_counter;
        self.keystream.zeroize();
        self.position = CHACHA_STATE_SIZE;
    }
}

#[inline(always)]
fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]); x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]); x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]); x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]); x[b] = (x[b] ^ x[c]).rotate_left(7);
}

fn block(input: &[u32; 16], out: &mut [u8; CHACHA_STATE_SIZE]) {
    let mut x = *input;

    for _ in 0..CHACHA_DOUBLE_ROUNDS {
        quarter_round(&mut x, 0, 4,  8, 12);
        quarter_round(&mut x, 1, 5,  9, 13);
        quarter_round(&mut x, 2, 6, 10, 14);
        quarter_round(&mut x, 3, 7, 11, 15);

        quarter_round(&mut x, 0, 5, 10, 15);
        quarter_round(&mut x, 1, 6, 11, 12);
        quarter_round(&mut x, 2, 7,  8, 13);
        quarter_round(&mut x, 3, 4,  9, 14);
    }

    for (word, initial) in x.iter_mut().zip(input.iter()) {
        *word = word.wrapping_add(*initial);
    }
    LittleEndian::write_u32_into(&x, out);
    x.zeroize();
}


#[cfg(test)]
mod chacha20_test {
    use super::*;

    fn engine(key: &[u8], nonce: &[u8], counter: u32) -> ChaCha20 {
        let mut c = ChaCha20::with_counter(counter);
        c.init(key, nonce).unwrap();
        c
    }

    #[test]
    fn zero_key_keystream() {
        let mut c = engine(&[0u8; 32], &[0u8; 12], 0);
        let mut out = [0u8; 64];
        c.transform(&[0u8; 64], &mut out).unwrap();

        let expected = hex::decode(
            "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7\
             da41597c5157488d7724e03fb8d84a376a43b8f41518a11cc387b669b2ee6586",
        )
        .unwrap();
        assert_eq!(out.to_vec(), expected);
    }

    #[test]
    fn block_function_vector() {
        let key: Vec<u8> = (0..32).collect();
        let nonce = hex::decode("000000090000004a00000000").unwrap();
        let mut c = engine(&key, &nonce, 1);
        let mut out = [0u8; 64];
        c.transform(&[0u8; 64], &mut out).unwrap();

        let expected = hex::decode(
            "10f1e7e4d13b5915500fdd1fa32071c4c7d1f4c733c068030422aa9ac3d46c4e\
             d2826446079faa0914c2d705d98b02a2b5129cd1de164eb9cbd083e8a2503c4e",
        )
        .unwrap();
        assert_eq!(out.to_vec(), expected);
    }

    #[test]
    fn sunscreen_vector() {
        let key: Vec<u8> = (0..32).collect();
        let nonce = hex::decode("000000000000004a00000000").unwrap();
        let plaintext = b"Ladies and Gentlemen of the class of '99: If I could offer you only one tip for the future, sunscreen would be it.";

        let expected = hex::decode(
            "6e2e359a2568f98041ba0728dd0d6981e97e7aec1d4360c20a27afccfd9fae0b\
             f91b65c5524733ab8f593dabcd62b3571639d624e65152ab8f530c359f0861d8\
             07ca0dbf500d6a6156a38e088a22b65e52bc514d16ccf806818ce91ab7793736\
             5af90bbf74a35be6b40b8eedf2785e42874d",
        )
        .unwrap();

        // uneven call sizes must not disturb the keystream position
        let mut c = engine(&key, &nonce, 1);
        let mut out = vec![0u8; plaintext.len()];
        let mut offset = 0;
        for step in [1usize, 63, 7, 30] {
            c.transform(&plaintext[offset..offset + step], &mut out[offset..offset + step]).unwrap();
            offset += step;
        }
        c.transform(&plaintext[offset..], &mut out[offset..]).unwrap();
        assert_eq!(out, expected);

        c.reset();
        let mut again = vec![0u8; plaintext.len()];
        c.transform(&expected, &mut again).unwrap();
        assert_eq!(&again[..], &plaintext[..]);
    }

    #[test]
    fn init_errors() {
        let mut c = ChaCha20::new();
        assert_eq!(
            c.init(&[0u8; 16], &[0u8; 12]).unwrap_err(),
            CipherError::InvalidKeyLength { expected: 32, actual: 16 }
        );
        assert_eq!(
            c.init(&[0u8; 32], &[0u8; 8]).unwrap_err(),
            CipherError::InvalidIVLength { expected: 12, actual: 8 }
        );

        let mut out = [0u8; 4];
        assert_eq!(c.transform(&[0u8; 4], &mut out).unwrap_err(), CipherError::NotInitialized);
    }
}
