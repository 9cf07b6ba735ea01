//! Host side of newmac: the `/dev/mem` register window and the entropy
//! source used for random addresses.

use std::io;
use std::path::PathBuf;

pub mod devmem;
pub mod entropy;

pub use devmem::DevMem;
pub use entropy::{EntropySource, SystemEntropy};

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot map {len:#x} bytes at physical {phys:#010x}: {source}")]
    Map {
        phys: u64,
        len: usize,
        source: io::Error,
    },
    #[error("cannot get random bytes: {source}")]
    Entropy { source: rand::Error },
}
