pub const BLOCK_SIZE256: usize = 32;
pub const KEY_SIZE256: usize = 32;
pub const NUM_ROUNDS256: usize = 72;
pub const NUM_WORDS256: usize = 4;
pub const TWEAK_SIZE: usize = 16;
pub const C240: u64 = 0x1bd11bdaa9fc1a22;


pub const TWEAK_COUNT: usize = (TWEAK_SIZE / 8) + 1;
pub const ROUND_KEYS_COUNT: usize = (NUM_ROUNDS256 / 4) + 1;

pub const LEGAL_KEY_SIZES256: [usize; 1] = [KEY_SIZE256];


pub const R4: [[u32; 2]; 8] = [
    [14, 16],
    [52, 57],
    [23, 40],
    [5,  37],
    [25, 33],
    [46, 12],
    [58, 22],
    [32, 32],
];

// "expand 32-byte k"
pub const CHACHA_SIGMA: [u32; 4] = [0x61707865, 0x3320646e, 0x79622d32, 0x6b206574];
pub const CHACHA_KEY_SIZE: usize = 32;
pub const CHACHA_NONCE_SIZE: usize = 12;
pub const CHACHA_STATE_SIZE: usize = 64;
pub const CHACHA_DOUBLE_ROUNDS: usize = 10;
pub const CHACHA_COUNTER_WORD: usize = 12;

pub const LEGAL_CHACHA_KEY_SIZES: [usize; 1] = [CHACHA_KEY_SIZE];

pub const LEGAL_BLOCK_SIZES: [usize; 4] = [16, 32, 64, 128];
pub const MAX_STRIDE_EXPONENT: u8 = 8;
