use rand::rngs::OsRng;
use rand::RngCore;

use crate::{HostError, Result};

/// Anything that can hand out a few random bytes; quality is not critical
pub trait EntropySource {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// Random bytes from a `rand` generator, the operating system's by default
pub struct SystemEntropy<R: RngCore = OsRng> {
    rng: R,
}

impl SystemEntropy {
    pub fn new() -> Self {
        Self::from_rng(OsRng)
    }
}

impl<R: RngCore> SystemEntropy<R> {
    pub fn from_rng(rng: R) -> Self {
        SystemEntropy { rng }
    }
}

impl Default for SystemEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> EntropySource for SystemEntropy<R> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.rng
            .try_fill_bytes(buf)
            .map_err(|source| HostError::Entropy { source })
    }
}

#[cfg(test)]
mod entropy_tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io;

    /// Generator whose source has run dry
    struct Exhausted;

    impl RngCore for Exhausted {
        fn next_u32(&mut self) -> u32 {
            panic!("infallible read from an exhausted source")
        }

        fn next_u64(&mut self) -> u64 {
            panic!("infallible read from an exhausted source")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            panic!("infallible read from an exhausted source")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new(io::Error::from(io::ErrorKind::UnexpectedEof)))
        }
    }

    #[test]
    fn test_seeded_source_is_repeatable() {
        let mut first = [0u8; 6];
        let mut second = [0u8; 6];
        SystemEntropy::from_rng(StdRng::seed_from_u64(9)).fill(&mut first).unwrap();
        SystemEntropy::from_rng(StdRng::seed_from_u64(9)).fill(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failing_source_is_an_error() {
        let mut buf = [0u8; 6];
        let err = SystemEntropy::from_rng(Exhausted).fill(&mut buf).unwrap_err();
        assert!(matches!(err, HostError::Entropy { .. }));
        assert!(err.to_string().starts_with("cannot get random bytes: "));
        assert_eq!(buf, [0u8; 6]);
    }

    #[test]
    fn test_system_source() {
        let mut buf = [0u8; 6];
        SystemEntropy::new().fill(&mut buf).unwrap();
    }
}
