use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chacha20::ChaCha20;
use super::constants::*;
use super::threefish256::Threefish256;
use super::{
    BlockCipherWrapper, CipherBlock, CipherError, CipherWrapper, ConfigError, KeyParams, ModeKind,
    PaddingKind, StreamCipher, StreamCipherWrapper,
};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlockCipherKind {
    Threefish256,
}

impl BlockCipherKind {
    pub fn name(self) -> &'static str {
        match self {
            BlockCipherKind::Threefish256 => "Threefish-256",
        }
    }

    pub fn block_size(self) -> usize {
        match self {
            BlockCipherKind::Threefish256 => BLOCK_SIZE256,
        }
    }

    pub fn legal_key_sizes(self) -> &'static [usize] {
        match self {
            BlockCipherKind::Threefish256 => &LEGAL_KEY_SIZES256,
        }
    }

    pub fn tweak_size(self) -> Option<usize> {
        match self {
            BlockCipherKind::Threefish256 => Some(TWEAK_SIZE),
        }
    }

    pub fn build(self) -> Box<dyn CipherBlock> {
        match self {
            BlockCipherKind::Threefish256 => Box::new(Threefish256::new()),
        }
    }
}

impl fmt::Display for BlockCipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockCipherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threefish256" | "threefish-256" => Ok(BlockCipherKind::Threefish256),
            _ => Err(format!("unknown block cipher: {}", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamCipherKind {
    ChaCha20,
}

impl StreamCipherKind {
    pub fn name(self) -> &'static str {
        match self {
            StreamCipherKind::ChaCha20 => "ChaCha20",
        }
    }

    pub fn state_size(self) -> usize {
        match self {
            StreamCipherKind::ChaCha20 => CHACHA_STATE_SIZE,
        }
    }

    pub fn legal_key_sizes(self) -> &'static [usize] {
        match self {
            StreamCipherKind::ChaCha20 => &LEGAL_CHACHA_KEY_SIZES,
        }
    }

    pub fn iv_size(self) -> usize {
        match self {
            StreamCipherKind::ChaCha20 => CHACHA_NONCE_SIZE,
        }
    }

    pub fn build(self) -> Box<dyn StreamCipher> {
        match self {
            StreamCipherKind::ChaCha20 => Box::new(ChaCha20::new()),
        }
    }
}

impl fmt::Display for StreamCipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamCipherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chacha20" => Ok(StreamCipherKind::ChaCha20),
            _ => Err(format!("unknown stream cipher: {}", s)),
        }
    }
}

/// Everything needed to build a [`CipherWrapper`] apart from the key material.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CipherConfig {
    Block {
        cipher: BlockCipherKind,
        mode: ModeKind,
        padding: PaddingKind,
        /// CFB only; defaults to the full block.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback_size: Option<usize>,
    },
    Stream {
        cipher: StreamCipherKind,
        #[serde(default)]
        stride_exponent: u8,
    },
}

impl CipherConfig {
    pub fn block(cipher: BlockCipherKind, mode: ModeKind, padding: PaddingKind) -> CipherConfig {
        CipherConfig::Block {
            cipher,
            mode,
            padding,
            feedback_size: None,
        }
    }

    pub fn stream(cipher: StreamCipherKind) -> CipherConfig {
        CipherConfig::Stream {
            cipher,
            stride_exponent: 0,
        }
    }

    /// No effect on stream configurations.
    pub fn with_feedback_size(mut self, size: usize) -> CipherConfig {
        if let CipherConfig::Block { ref mut feedback_size, .. } = self {
            *feedback_size = Some(size);
        }
        self
    }

    /// No effect on block configurations.
    pub fn with_stride_exponent(mut self, exponent: u8) -> CipherConfig {
        if let CipherConfig::Stream { ref mut stride_exponent, .. } = self {
            *stride_exponent = exponent;
        }
        self
    }

    pub fn name(&self) -> String {
        match *self {
            CipherConfig::Block { cipher, mode, padding, .. } => {
                format!("{}/{}/{}", cipher, mode, padding)
            }
            CipherConfig::Stream { cipher, .. } => cipher.name().to_string(),
        }
    }

    /// Checks the configuration against `params` without touching any cipher state.
    pub fn validate(&self, params: &KeyParams) -> Result<(), ConfigError> {
        match *self {
            CipherConfig::Block { cipher, mode, padding, feedback_size } => {
                check_key(cipher.legal_key_sizes(), params.key())?;

                let block_size = cipher.block_size();
                let capability = mode.capability();
                if capability.uses_iv {
                    let actual = params.iv().len();
                    let fits = if capability.variable_feedback {
                        actual <= block_size
                    } else {
                        actual == block_size
                    };
                    if !fits {
                        return Err(ConfigError::InvalidIvSize { expected: block_size, actual });
                    }
                }

                match (cipher.tweak_size(), params.tweak()) {
                    (Some(expected), Some(tweak)) if tweak.len() != expected => {
                        return Err(ConfigError::InvalidTweakSize { expected, actual: tweak.len() });
                    }
                    (None, Some(_)) => {
                        return Err(ConfigError::TweakNotSupported { cipher: cipher.name() });
                    }
                    _ => {}
                }

                if let Some(feedback) = feedback_size {
                    if !capability.variable_feedback {
                        return Err(ConfigError::FeedbackNotSupported { mode: mode.name() });
                    }
                    if feedback == 0 || feedback > block_size {
                        return Err(ConfigError::InvalidFeedbackSize { feedback, block_size });
                    }
                }

                let padded = padding != PaddingKind::None;
                if capability.requires_padding && !padded {
                    return Err(ConfigError::PaddingRequired { mode: mode.name() });
                }
                if !capability.requires_padding && padded {
                    return Err(ConfigError::PaddingForbidden {
                        mode: mode.name(),
                        padding: padding.name(),
                    });
                }
            }
            CipherConfig::Stream { cipher, stride_exponent } => {
                check_key(cipher.legal_key_sizes(), params.key())?;

                if params.iv().len() != cipher.iv_size() {
                    return Err(ConfigError::InvalidIvSize {
                        expected: cipher.iv_size(),
                        actual: params.iv().len(),
                    });
                }
                if params.tweak().is_some() {
                    return Err(ConfigError::TweakNotSupported { cipher: cipher.name() });
                }
                if stride_exponent > MAX_STRIDE_EXPONENT {
                    return Err(ConfigError::InvalidStrideExponent(stride_exponent));
                }
            }
        }
        Ok(())
    }

    /// Validates, then returns a keyed wrapper ready for its first call.
    pub fn build(
        &self,
        encrypting: bool,
        params: &KeyParams,
    ) -> Result<Box<dyn CipherWrapper>, CipherError> {
        self.validate(params)?;

        let wrapper: Box<dyn CipherWrapper> = match *self {
            CipherConfig::Block { cipher, mode, padding, feedback_size } => {
                let mut engine = mode.build(cipher.build(), feedback_size)?;
                engine.init(encrypting, params)?;
                Box::new(BlockCipherWrapper::new(encrypting, engine, Some(padding.build()))?)
            }
            CipherConfig::Stream { cipher, stride_exponent } => {
                let mut engine = cipher.build();
                engine.init(params.key(), params.iv())?;
                Box::new(StreamCipherWrapper::new(encrypting, engine, stride_exponent)?)
            }
        };

        debug!(config = %self.name(), encrypting, "cipher wrapper built");
        Ok(wrapper)
    }
}

fn check_key(legal: &'static [usize], key: &[u8]) -> Result<(), ConfigError> {
    if !legal.contains(&key.len()) {
        return Err(ConfigError::InvalidKeySize { legal, actual: key.len() });
    }
    Ok(())
}


#[cfg(test)]
mod config_test {
    use super::*;
    use rstest::rstest;

    fn block_params(iv_len: usize) -> KeyParams {
        KeyParams::new(vec![1u8; 32], vec![2u8; iv_len]).with_tweak(vec![3u8; 16])
    }

    fn stream_params() -> KeyParams {
        KeyParams::new(vec![1u8; 32], vec![2u8; 12])
    }

    fn threefish(mode: ModeKind, padding: PaddingKind) -> CipherConfig {
        CipherConfig::block(BlockCipherKind::Threefish256, mode, padding)
    }

    #[rstest]
    #[case(ModeKind::Ecb, PaddingKind::Pkcs7, true)]
    #[case(ModeKind::Ecb, PaddingKind::None, false)]
    #[case(ModeKind::Cbc, PaddingKind::Tbc, true)]
    #[case(ModeKind::Cbc, PaddingKind::None, false)]
    #[case(ModeKind::Cfb, PaddingKind::None, true)]
    #[case(ModeKind::Cfb, PaddingKind::Pkcs7, false)]
    #[case(ModeKind::Ofb, PaddingKind::X923, false)]
    #[case(ModeKind::Ctr, PaddingKind::None, true)]
    #[case(ModeKind::Ctr, PaddingKind::Iso7816, false)]
    fn padding_table(#[case] mode: ModeKind, #[case] padding: PaddingKind, #[case] ok: bool) {
        assert_eq!(threefish(mode, padding).validate(&block_params(32)).is_ok(), ok);
    }

    #[test]
    fn key_size_checked_first() {
        let params = KeyParams::new(vec![0u8; 16], vec![0u8; 3]);
        let r = threefish(ModeKind::Cbc, PaddingKind::None).validate(&params);
        assert_eq!(r.unwrap_err(), ConfigError::InvalidKeySize { legal: &[32], actual: 16 });
    }

    #[test]
    fn iv_rules_follow_mode() {
        let cbc = threefish(ModeKind::Cbc, PaddingKind::Pkcs7);
        assert_eq!(
            cbc.validate(&block_params(16)).unwrap_err(),
            ConfigError::InvalidIvSize { expected: 32, actual: 16 }
        );

        // ECB ignores the IV entirely
        assert!(threefish(ModeKind::Ecb, PaddingKind::Pkcs7).validate(&block_params(5)).is_ok());

        let cfb = threefish(ModeKind::Cfb, PaddingKind::None);
        assert!(cfb.validate(&block_params(16)).is_ok());
        assert_eq!(
            cfb.validate(&block_params(33)).unwrap_err(),
            ConfigError::InvalidIvSize { expected: 32, actual: 33 }
        );
    }

    #[test]
    fn tweak_rules() {
        let params = KeyParams::new(vec![1u8; 32], vec![2u8; 32]).with_tweak(vec![0u8; 8]);
        assert_eq!(
            threefish(ModeKind::Ctr, PaddingKind::None).validate(&params).unwrap_err(),
            ConfigError::InvalidTweakSize { expected: 16, actual: 8 }
        );

        let untweaked = KeyParams::new(vec![1u8; 32], vec![2u8; 32]);
        assert!(threefish(ModeKind::Ctr, PaddingKind::None).validate(&untweaked).is_ok());

        let params = stream_params().with_tweak(vec![0u8; 16]);
        assert_eq!(
            CipherConfig::stream(StreamCipherKind::ChaCha20).validate(&params).unwrap_err(),
            ConfigError::TweakNotSupported { cipher: "ChaCha20" }
        );
    }

    #[test]
    fn feedback_rules() {
        let params = block_params(32);
        let cfb = threefish(ModeKind::Cfb, PaddingKind::None);

        assert!(cfb.with_feedback_size(1).validate(&params).is_ok());
        assert!(cfb.with_feedback_size(32).validate(&params).is_ok());
        assert_eq!(
            cfb.with_feedback_size(0).validate(&params).unwrap_err(),
            ConfigError::InvalidFeedbackSize { feedback: 0, block_size: 32 }
        );
        assert_eq!(
            cfb.with_feedback_size(33).validate(&params).unwrap_err(),
            ConfigError::InvalidFeedbackSize { feedback: 33, block_size: 32 }
        );
        assert_eq!(
            threefish(ModeKind::Ofb, PaddingKind::None).with_feedback_size(8).validate(&params).unwrap_err(),
            ConfigError::FeedbackNotSupported { mode: "OFB" }
        );
    }

    #[test]
    fn stream_rules() {
        let chacha = CipherConfig::stream(StreamCipherKind::ChaCha20);
        assert!(chacha.with_stride_exponent(8).validate(&stream_params()).is_ok());
        assert_eq!(
            chacha.with_stride_exponent(9).validate(&stream_params()).unwrap_err(),
            ConfigError::InvalidStrideExponent(9)
        );
        assert_eq!(
            chacha.validate(&KeyParams::new(vec![1u8; 32], vec![2u8; 8])).unwrap_err(),
            ConfigError::InvalidIvSize { expected: 12, actual: 8 }
        );
    }

    #[test]
    fn build_reports_config_errors() {
        let r = threefish(ModeKind::Cfb, PaddingKind::Pkcs7).build(true, &block_params(32));
        assert!(matches!(
            r,
            Err(CipherError::Config(ConfigError::PaddingForbidden { mode: "CFB", padding: "PKCS7" }))
        ));
    }

    #[test]
    fn build_gives_working_pair() {
        let message: Vec<u8> = (0..100u8).collect();

        for config in [
            threefish(ModeKind::Cbc, PaddingKind::Pkcs7),
            threefish(ModeKind::Cfb, PaddingKind::None).with_feedback_size(8),
            CipherConfig::stream(StreamCipherKind::ChaCha20).with_stride_exponent(1),
        ] {
            let params = match config {
                CipherConfig::Block { .. } => block_params(32),
                CipherConfig::Stream { .. } => stream_params(),
            };
            let mut enc = config.build(true, &params).unwrap();
            let mut dec = config.build(false, &params).unwrap();

            let ciphertext = enc.process_all(&message).unwrap();
            assert_ne!(ciphertext[..16], message[..16], "{}", config.name());
            assert_eq!(dec.process_all(&ciphertext).unwrap(), message, "{}", config.name());
        }
    }

    #[test]
    fn serde_round_trip() {
        let config = threefish(ModeKind::Cfb, PaddingKind::None).with_feedback_size(4);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"block","cipher":"threefish256","mode":"cfb","padding":"none","feedback_size":4}"#
        );
        assert_eq!(serde_json::from_str::<CipherConfig>(&json).unwrap(), config);

        let stream: CipherConfig = serde_json::from_str(r#"{"kind":"stream","cipher":"chacha20"}"#).unwrap();
        assert_eq!(stream, CipherConfig::stream(StreamCipherKind::ChaCha20));
    }

    #[test]
    fn names_and_parsing() {
        assert_eq!(threefish(ModeKind::Cbc, PaddingKind::Pkcs7).name(), "Threefish-256/CBC/PKCS7");
        assert_eq!("Threefish-256".parse::<BlockCipherKind>().unwrap(), BlockCipherKind::Threefish256);
        assert_eq!("CHACHA20".parse::<StreamCipherKind>().unwrap(), StreamCipherKind::ChaCha20);
        assert!("aes".parse::<BlockCipherKind>().is_err());
    }
}
