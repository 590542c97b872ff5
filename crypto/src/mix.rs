use crate::constants;

/// One Threefish MIX step: round `d` picks the rotation row, `j` the word pair.
pub struct Mix {
    d: usize,
    j: usize
}

impl Mix {
    pub fn new(d: usize, j: usize) -> Mix {
        Mix {d,j}
    }

    fn shift(&self) -> u32 {
        constants::R4[self.d % 8][self.j]
    }

    #[inline]
    pub fn mix(&self, x0: u64, x1: u64) -> (u64, u64) {
        mix(x0, x1, self.shift())
    }

    #[inline]
    pub fn demix(&self, y0: u64, y1: u64) -> (u64, u64) {
        demix(y0, y1, self.shift())
    }
}

#[inline(always)]
pub fn mix(x0: u64, x1: u64, r: u32) -> (u64, u64) {
    let y0 = x0.wrapping_add(x1);
    let y1 = x1.rotate_left(r) ^ y0;
    (y0, y1)
}

#[inline(always)]
pub fn demix(y0: u64, y1: u64, r: u32) -> (u64, u64) {
    let x1 = (y1 ^ y0).rotate_right(r);
    let x0 = y0.wrapping_sub(x1);
    (x0, x1)
}


#[cfg(test)]
mod mix_tests {
    use super::*;

    #[test]
    fn mix_overflow() {
        let mix = Mix::new(0, 1);
        let (x0, x1) = (u64::MAX, 2);
        let (y0, _) = mix.mix(x0, x1);

        assert_eq!(y0, 1);
    }

    #[test]
    fn mix_check_res() {
        let mix = Mix::new(4, 1);
        let (x0, x1) = (15, 44);
        let (y0, y1) = mix.mix(x0, x1);

        assert_eq!(y0, 59);
        assert_eq!(y1, 377957122107);


        let mix = Mix::new(2, 0);
        let (x0, x1) = (0x198248612874123, 0x123127121824178);
        let (y0, y1) = mix.mix(x0, x1);

        assert_eq!(y0, 196811444078609051);
        assert_eq!(y1, 4191716383270703890);
    }

    #[test]
    fn demix_check_res() {
        let mix = Mix::new(4, 1);
        let (y0, y1) = (59, 377957122107);
        let (x0, x1) = mix.demix(y0, y1);

        assert_eq!(x0, 15);
        assert_eq!(x1, 44);

        let mix = Mix::new(2, 0);
        let (y0, y1) = (196811444078609051, 4191716383270703890);
        let (x0, x1) = mix.demix(y0, y1);

        assert_eq!(x0, 0x198248612874123);
        assert_eq!(x1, 0x123127121824178);
    }

    #[test]
    fn rotation_row_wraps_every_eight_rounds() {
        let a = Mix::new(3, 0).mix(0xdead_beef, 0x1234_5678_9abc);
        let b = Mix::new(11, 0).mix(0xdead_beef, 0x1234_5678_9abc);
        assert_eq!(a, b);
    }
}
