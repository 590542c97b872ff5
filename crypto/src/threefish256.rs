use super::{constants::*, utils::*, mix::*, CipherError, CipherBlock};

use std::fmt;
use std::sync::OnceLock;

use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

type KeySchedule = [[u64; NUM_WORDS256]; ROUND_KEYS_COUNT];
type BlockFn = fn(&KeySchedule, &mut [u64; NUM_WORDS256]);

/// Round implementation used by [`Threefish256`].
///
/// Both backends compute the same permutation; `Unrolled` runs eight rounds
/// per loop iteration with the rotation constants inlined and the word
/// permutation folded into register renaming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundBackend {
    Portable,
    Unrolled,
}

impl RoundBackend {
    /// Backend for this host, chosen once per process.
    pub fn detect() -> RoundBackend {
        static SELECTED: OnceLock<RoundBackend> = OnceLock::new();

        *SELECTED.get_or_init(|| {
            // the unrolled loop keeps all four words live in registers
            let backend = if cfg!(target_pointer_width = "64") {
                RoundBackend::Unrolled
            } else {
                RoundBackend::Portable
            };
            debug!(?backend, "selected threefish-256 round backend");
            backend
        })
    }

    fn encrypt_fn(self) -> BlockFn {
        match self {
            RoundBackend::Portable => encrypt_portable,
            RoundBackend::Unrolled => encrypt_unrolled,
        }
    }

    fn decrypt_fn(self) -> BlockFn {
        match self {
            RoundBackend::Portable => decrypt_portable,
            RoundBackend::Unrolled => decrypt_unrolled,
        }
    }
}

/// Threefish-256: 256-bit block, 256-bit key, 128-bit tweak, 72 rounds.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Threefish256 {
    k:  [u64; NUM_WORDS256 + 1],
    t:  [u64; TWEAK_COUNT],
    ks: KeySchedule,
    #[zeroize(skip)]
    initialized: bool,
    #[zeroize(skip)]
    backend: RoundBackend,
    #[zeroize(skip)]
    encrypt_fn: BlockFn,
    #[zeroize(skip)]
    decrypt_fn: BlockFn,
}

impl Threefish256 {
    /// Creates an uninitialized cipher; call [`CipherBlock::init`] before use.
    pub fn new() -> Threefish256 {
        Threefish256::with_backend(RoundBackend::detect())
    }

    pub fn with_backend(backend: RoundBackend) -> Threefish256 {
        Threefish256 {
            k: [0; NUM_WORDS256 + 1],
            t: [0; TWEAK_COUNT],
            ks: [[0; NUM_WORDS256]; ROUND_KEYS_COUNT],
            initialized: false,
            backend,
            encrypt_fn: backend.encrypt_fn(),
            decrypt_fn: backend.decrypt_fn(),
        }
    }

    /// The key argument must be 32 bytes and the tweak argument must be 16 bytes.
    pub fn with_key(key: &[u8], tweak: &[u8]) -> Result<Threefish256, CipherError> {
        let mut c = Threefish256::new();
        c.init(key, Some(tweak))?;
        Ok(c)
    }

    pub fn backend(&self) -> RoundBackend {
        self.backend
    }

    /// Replaces the tweak, keeping the expanded key.
    pub fn set_tweak(&mut self, tweak: &[u8]) -> Result<(), CipherError> {
        self.t = calculate_tweak(tweak)?;
        self.derive_subkeys();
        Ok(())
    }

    fn expand_key(&mut self, key: &[u8]) -> Result<(), CipherError> {
        // Length check the provided key
        if key.len() != KEY_SIZE256 {
            return Err(CipherError::InvalidKeyLength {
                expected: KEY_SIZE256,
                actual: key.len(),
            });
        }

        self.k[NUM_WORDS256] = C240;
        for i in 0..NUM_WORDS256 {
            self.k[i] = load_word(&key[i*8..(i+1)*8]);
            self.k[NUM_WORDS256] ^= self.k[i];
        }
        Ok(())
    }

    fn derive_subkeys(&mut self) {
        for s in 0..ROUND_KEYS_COUNT {
            for i in 0..NUM_WORDS256 {
                self.ks[s][i] = self.k[(s+i)%(NUM_WORDS256+1)];
            }
            self.ks[s][1] = self.ks[s][1].wrapping_add(self.t[s%3]);
            self.ks[s][2] = self.ks[s][2].wrapping_add(self.t[(s+1)%3]);
            self.ks[s][3] = self.ks[s][3].wrapping_add(s as u64);
        }
    }

    /// Encrypts one block held as four little-endian words.
    pub fn encrypt_words(&self, words: &mut [u64; NUM_WORDS256]) {
        (self.encrypt_fn)(&self.ks, words);
    }

    pub fn decrypt_words(&self, words: &mut [u64; NUM_WORDS256]) {
        (self.decrypt_fn)(&self.ks, words);
    }

    fn check_lengths(&self, src: &[u8], dst: &[u8], encrypting: bool) -> Result<(), CipherError> {
        if !self.initialized {
            return Err(CipherError::NotInitialized);
        }

        let (src_err, dst_err) = if encrypting {
            (CipherError::InvalidPlaintextLength, CipherError::InvalidCiphertextLength)
        } else {
            (CipherError::InvalidCiphertextLength, CipherError::InvalidPlaintextLength)
        };

        if src.len() != BLOCK_SIZE256 {
            return Err(src_err);
        }

        if dst.len() < BLOCK_SIZE256 {
            return Err(dst_err);
        }

        Ok(())
    }
}

impl Default for Threefish256 {
    fn default() -> Self {
        Threefish256::new()
    }
}

impl fmt::Debug for Threefish256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Threefish256")
            .field("initialized", &self.initialized)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl CipherBlock for Threefish256 {
    fn name(&self) -> &'static str {
        "Threefish-256"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE256
    }

    fn legal_key_sizes(&self) -> &'static [usize] {
        &LEGAL_KEY_SIZES256
    }

    fn tweak_size(&self) -> Option<usize> {
        Some(TWEAK_SIZE)
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn init(&mut self, key: &[u8], tweak: Option<&[u8]>) -> Result<(), CipherError> {
        // validate both before touching the schedule
        let t = match tweak {
            Some(tweak) => calculate_tweak(tweak)?,
            None => [0; TWEAK_COUNT],
        };
        self.expand_key(key)?;
        self.t = t;
        self.derive_subkeys();
        self.initialized = true;

        Ok(())
    }

    fn encrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CipherError> {
        self.check_lengths(src, dst, true)?;

        let mut words = load_words256(src);
        self.encrypt_words(&mut words);
        store_words256(&words, dst);

        Ok(())
    }

    /// Decrypt loads ciphertext from src, decrypts it, and stores it in dst.
    fn decrypt(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CipherError> {
        self.check_lengths(src, dst, false)?;

        let mut words = load_words256(src);
        self.decrypt_words(&mut words);
        store_words256(&words, dst);

        Ok(())
    }
}

#[inline(always)]
fn inject(words: &mut [u64; NUM_WORDS256], subkey: &[u64; NUM_WORDS256]) {
    for i in 0..NUM_WORDS256 {
        words[i] = words[i].wrapping_add(subkey[i]);
    }
}

#[inline(always)]
fn eject(words: &mut [u64; NUM_WORDS256], subkey: &[u64; NUM_WORDS256]) {
    for i in 0..NUM_WORDS256 {
        words[i] = words[i].wrapping_sub(subkey[i]);
    }
}

fn encrypt_portable(ks: &KeySchedule, words: &mut [u64; NUM_WORDS256]) {
    for round in 0..NUM_ROUNDS256 {
        if round % 4 == 0 {
            inject(words, &ks[round / 4]);
        }

        for j in 0..(NUM_WORDS256/2) {
            let mix = Mix::new(round, j);
            (words[2*j], words[2*j+1]) = mix.mix(words[2*j], words[2*j+1]);
        }

        words.swap(1, 3);
    }

    inject(words, &ks[ROUND_KEYS_COUNT-1]);
}

fn decrypt_portable(ks: &KeySchedule, words: &mut [u64; NUM_WORDS256]) {
    eject(words, &ks[ROUND_KEYS_COUNT-1]);

    for round in (0..NUM_ROUNDS256).rev() {
        words.swap(1, 3);

        for j in (0..NUM_WORDS256/2).rev() {
            let mix = Mix::new(round, j);
            (words[2*j], words[2*j+1]) = mix.demix(words[2*j], words[2*j+1]);
        }

        if round % 4 == 0 {
            eject(words, &ks[round / 4]);
        }
    }
}

// Four rounds starting at row `r`. Even rounds mix (x0,x1),(x2,x3); the swap
// of words 1 and 3 makes odd rounds mix (x0,x3),(x2,x1).
macro_rules! four_rounds {
    ($x0:ident, $x1:ident, $x2:ident, $x3:ident, $r:expr) => {
        ($x0, $x1) = mix($x0, $x1, R4[$r][0]);
        ($x2, $x3) = mix($x2, $x3, R4[$r][1]);
        ($x0, $x3) = mix($x0, $x3, R4[$r + 1][0]);
        ($x2, $x1) = mix($x2, $x1, R4[$r + 1][1]);
        ($x0, $x1) = mix($x0, $x1, R4[$r + 2][0]);
        ($x2, $x3) = mix($x2, $x3, R4[$r + 2][1]);
        ($x0, $x3) = mix($x0, $x3, R4[$r + 3][0]);
        ($x2, $x1) = mix($x2, $x1, R4[$r + 3][1]);
    };
}

macro_rules! four_rounds_inv {
    ($x0:ident, $x1:ident, $x2:ident, $x3:ident, $r:expr) => {
        ($x2, $x1) = demix($x2, $x1, R4[$r + 3][1]);
        ($x0, $x3) = demix($x0, $x3, R4[$r + 3][0]);
        ($x2, $x3) = demix($x2, $x3, R4[$r + 2][1]);
        ($x0, $x1) = demix($x0, $x1, R4[$r + 2][0]);
        ($x2, $x1) = demix($x2, $x1, R4[$r + 1][1]);
        ($x0, $x3) = demix($x0, $x3, R4[$r + 1][0]);
        ($x2, $x3) = demix($x2, $x3, R4[$r][1]);
        ($x0, $x1) = demix($x0, $x1, R4[$r][0]);
    };
}

fn encrypt_unrolled(ks: &KeySchedule, words: &mut [u64; NUM_WORDS256]) {
    let [mut x0, mut x1, mut x2, mut x3] = *words;

    for d in (0..ROUND_KEYS_COUNT-1).step_by(2) {
        x0 = x0.wrapping_add(ks[d][0]);
        x1 = x1.wrapping_add(ks[d][1]);
        x2 = x2.wrapping_add(ks[d][2]);
        x3 = x3.wrapping_add(ks[d][3]);
        four_rounds!(x0, x1, x2, x3, 0);

        x0 = x0.wrapping_add(ks[d+1][0]);
        x1 = x1.wrapping_add(ks[d+1][1]);
        x2 = x2.wrapping_add(ks[d+1][2]);
        x3 = x3.wrapping_add(ks[d+1][3]);
        four_rounds!(x0, x1, x2, x3, 4);
    }

    *words = [x0, x1, x2, x3];
    inject(words, &ks[ROUND_KEYS_COUNT-1]);
}

fn decrypt_unrolled(ks: &KeySchedule, words: &mut [u64; NUM_WORDS256]) {
    eject(words, &ks[ROUND_KEYS_COUNT-1]);
    let [mut x0, mut x1, mut x2, mut x3] = *words;

    for d in (0..ROUND_KEYS_COUNT-1).step_by(2).rev() {
        four_rounds_inv!(x0, x1, x2, x3, 4);
        x0 = x0.wrapping_sub(ks[d+1][0]);
        x1 = x1.wrapping_sub(ks[d+1][1]);
        x2 = x2.wrapping_sub(ks[d+1][2]);
        x3 = x3.wrapping_sub(ks[d+1][3]);

        four_rounds_inv!(x0, x1, x2, x3, 0);
        x0 = x0.wrapping_sub(ks[d][0]);
        x1 = x1.wrapping_sub(ks[d][1]);
        x2 = x2.wrapping_sub(ks[d][2]);
        x3 = x3.wrapping_sub(ks[d][3]);
    }

    *words = [x0, x1, x2, x3];
}
