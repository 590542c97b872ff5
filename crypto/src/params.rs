use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key material handed to a mode or stream engine at init. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyParams {
    key: Vec<u8>,
    iv: Vec<u8>,
    tweak: Option<Vec<u8>>,
}

impl KeyParams {
    pub fn new(key: impl Into<Vec<u8>>, iv: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            iv: iv.into(),
            tweak: None,
        }
    }

    pub fn with_tweak(mut self, tweak: impl Into<Vec<u8>>) -> Self {
        self.tweak = Some(tweak.into());
        self
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn tweak(&self) -> Option<&[u8]> {
        self.tweak.as_deref()
    }
}

impl fmt::Debug for KeyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyParams")
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("iv", &format_args!("<{} bytes>", self.iv.len()))
            .field("tweak", &self.tweak.as_ref().map(|t| t.len()))
            .finish()
    }
}

#[cfg(test)]
mod params_test {
    use super::*;

    #[test]
    fn debug_hides_key_material() {
        let params = KeyParams::new(vec![0xAB; 32], vec![0xCD; 32]).with_tweak(vec![0xEF; 16]);
        let out = format!("{:?}", params);

        assert!(out.contains("<32 bytes>"));
        assert!(!out.contains("171"));
        assert_eq!(params.tweak().map(<[u8]>::len), Some(16));
    }

    #[test]
    fn zeroize_clears_everything() {
        let mut params = KeyParams::new(vec![1; 32], vec![2; 32]).with_tweak(vec![3; 16]);
        params.zeroize();

        assert!(params.key().is_empty());
        assert!(params.iv().is_empty());
        assert!(params.tweak().is_none());
    }
}
