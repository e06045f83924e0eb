//! Program-derived escrow addresses.
//!
//! Mirrors the host ledger's derivation rule so that addresses computed
//! off-chain match the ones the program checks:
//! `sha256(seeds.. || bump || program_id || "ProgramDerivedAddress")`,
//! searching `bump` downward from 255 for the first digest that is *not*
//! a valid ed25519 point (so no private key can sign for it).

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

use crate::{EscrowError, Identity, Result};

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Derives the escrow address for `owner`, returning the address and its canonical bump.
pub fn derive_escrow_address(
    seed: &[u8],
    owner: &Identity,
    program_id: &Identity,
) -> Result<(Identity, u8)> {
    find_program_address(&[seed, owner.as_ref()], program_id)
}

/// Finds the first off-curve address for `seeds`, trying bumps `255..=0`.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Identity) -> Result<(Identity, u8)> {
    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump = seeds.to_vec();
        with_bump.push(&bump_seed);
        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(EscrowError::NoViableBump) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(EscrowError::NoViableBump)
}

/// Hashes `seeds` (bump included) into an address.
///
/// # Errors
///
/// Returns `EscrowError::MaxSeedLengthExceeded` for an oversized seed and
/// `EscrowError::NoViableBump` if the digest lands on the curve.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Identity) -> Result<Identity> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        if seed.len() > MAX_SEED_LEN {
            return Err(EscrowError::MaxSeedLengthExceeded {
                len: seed.len(),
                max: MAX_SEED_LEN,
            });
        }
        hasher.update(seed);
    }
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    let digest: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&digest) {
        return Err(EscrowError::NoViableBump);
    }
    Ok(Identity::new(digest))
}

/// Whether `bytes` decompress to an ed25519 point.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use core::str::FromStr as _;

    use super::*;
    use crate::interface::ESCROW_SEED;

    fn program_id() -> Identity {
        Identity::from_str("GhdEns4NgkpVd22VwH624rfxYW4Yg4oXrHDtCQ7451Ja").unwrap()
    }

    #[test]
    fn known_addresses() {
        let (address, bump) =
            derive_escrow_address(ESCROW_SEED, &Identity::new([0u8; 32]), &program_id()).unwrap();
        assert_eq!(
            address.to_string(),
            "3zuhJ2D86LQuMTVuYTw5hD5dyerTcDFkoHvZNVjnRKjN"
        );
        assert_eq!(bump, 254);

        let (address, bump) =
            derive_escrow_address(ESCROW_SEED, &Identity::new([1u8; 32]), &program_id()).unwrap();
        assert_eq!(
            address.to_string(),
            "Fdb3H22o3t4UdgWTbpCBSXwfg8ZUjKUk26Stb1fa9qk4"
        );
        assert_eq!(bump, 252);
    }

    #[test]
    fn deterministic_and_distinct() {
        let alice = Identity::new([7u8; 32]);
        let bob = Identity::new([8u8; 32]);

        let (a1, bump) = derive_escrow_address(ESCROW_SEED, &alice, &program_id()).unwrap();
        let (a2, _) = derive_escrow_address(ESCROW_SEED, &alice, &program_id()).unwrap();
        let (b, _) = derive_escrow_address(ESCROW_SEED, &bob, &program_id()).unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(!is_on_curve(a1.as_bytes()));

        // the canonical bump re-derives the same address
        let recreated =
            create_program_address(&[ESCROW_SEED, alice.as_ref(), &[bump]], &program_id())
                .unwrap();
        assert_eq!(recreated, a1);
    }

    #[test]
    fn oversized_seed() {
        let seed = [0u8; MAX_SEED_LEN + 1];
        assert_eq!(
            derive_escrow_address(&seed, &Identity::default(), &program_id()),
            Err(EscrowError::MaxSeedLengthExceeded {
                len: MAX_SEED_LEN + 1,
                max: MAX_SEED_LEN
            })
        );
    }
}
