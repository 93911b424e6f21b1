//! Incremental digest accumulators, one variant per supported algorithm.

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use super::AlgorithmId;

/// Stateful hasher that ingests chunks and yields a hex digest once finalized.
///
/// `finalize` consumes the accumulator, so it cannot be fed after finishing.
/// Accumulators are never reset or shared between verification runs.
#[derive(Clone)]
pub enum Accumulator {
    Md5(Md5),
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Sha3_224(Sha3_224),
    Sha3_256(Sha3_256),
    Sha3_384(Sha3_384),
    Sha3_512(Sha3_512),
}

/// Fresh accumulator for `id`.
pub fn create(id: AlgorithmId) -> Accumulator {
    match id {
        AlgorithmId::Md5 => Accumulator::Md5(Md5::new()),
        AlgorithmId::Sha1 => Accumulator::Sha1(Sha1::new()),
        AlgorithmId::Sha224 => Accumulator::Sha224(Sha224::new()),
        AlgorithmId::Sha256 => Accumulator::Sha256(Sha256::new()),
        AlgorithmId::Sha384 => Accumulator::Sha384(Sha384::new()),
        AlgorithmId::Sha512 => Accumulator::Sha512(Sha512::new()),
        AlgorithmId::Sha3_224 => Accumulator::Sha3_224(Sha3_224::new()),
        AlgorithmId::Sha3_256 => Accumulator::Sha3_256(Sha3_256::new()),
        AlgorithmId::Sha3_384 => Accumulator::Sha3_384(Sha3_384::new()),
        AlgorithmId::Sha3_512 => Accumulator::Sha3_512(Sha3_512::new()),
    }
}

/// Accumulator for a harvested name; `None` when the name is not supported.
pub fn create_by_name(name: &str) -> Option<Accumulator> {
    AlgorithmId::parse(name).map(create)
}

impl Accumulator {
    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            Accumulator::Md5(_) => AlgorithmId::Md5,
            Accumulator::Sha1(_) => AlgorithmId::Sha1,
            Accumulator::Sha224(_) => AlgorithmId::Sha224,
            Accumulator::Sha256(_) => AlgorithmId::Sha256,
            Accumulator::Sha384(_) => AlgorithmId::Sha384,
            Accumulator::Sha512(_) => AlgorithmId::Sha512,
            Accumulator::Sha3_224(_) => AlgorithmId::Sha3_224,
            Accumulator::Sha3_256(_) => AlgorithmId::Sha3_256,
            Accumulator::Sha3_384(_) => AlgorithmId::Sha3_384,
            Accumulator::Sha3_512(_) => AlgorithmId::Sha3_512,
        }
    }

    /// Appends `data` to the running digest.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Accumulator::Md5(h) => h.update(data),
            Accumulator::Sha1(h) => h.update(data),
            Accumulator::Sha224(h) => h.update(data),
            Accumulator::Sha256(h) => h.update(data),
            Accumulator::Sha384(h) => h.update(data),
            Accumulator::Sha512(h) => h.update(data),
            Accumulator::Sha3_224(h) => h.update(data),
            Accumulator::Sha3_256(h) => h.update(data),
            Accumulator::Sha3_384(h) => h.update(data),
            Accumulator::Sha3_512(h) => h.update(data),
        }
    }

    /// Finishes the digest and returns it as lower-case hex.
    pub fn finalize(self) -> String {
        match self {
            Accumulator::Md5(h) => hex::encode(h.finalize()),
            Accumulator::Sha1(h) => hex::encode(h.finalize()),
            Accumulator::Sha224(h) => hex::encode(h.finalize()),
            Accumulator::Sha256(h) => hex::encode(h.finalize()),
            Accumulator::Sha384(h) => hex::encode(h.finalize()),
            Accumulator::Sha512(h) => hex::encode(h.finalize()),
            Accumulator::Sha3_224(h) => hex::encode(h.finalize()),
            Accumulator::Sha3_256(h) => hex::encode(h.finalize()),
            Accumulator::Sha3_384(h) => hex::encode(h.finalize()),
            Accumulator::Sha3_512(h) => hex::encode(h.finalize()),
        }
    }
}

impl std::fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Accumulator").field(&self.algorithm()).finish()
    }
}
