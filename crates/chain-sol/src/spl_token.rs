//! SPL Token account addressing for Solana.
//!
//! Token balances live in associated token accounts (ATAs), not in the
//! wallet account itself. The wallet derives the ATA locally and asks the
//! RPC node for that account's balance, without pulling in the
//! `solana-sdk` or the `spl-token` crates.

use sha2::{Digest, Sha256};

use crate::address::{address_to_bytes, bytes_to_address, is_on_curve};
use crate::error::SolError;

// ---------------------------------------------------------------------------
// Well-known program IDs
// ---------------------------------------------------------------------------

/// SPL Token Program ID: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79,
    0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff,
    0x00, 0xa9,
];

/// Associated Token Account Program ID: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: [u8; 32] = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d,
    0x83, 0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9,
    0xf8, 0x59,
];

/// The string appended to PDA derivation: "ProgramDerivedAddress".
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Derive the associated token account for a wallet + mint given as Base58
/// strings, returning the account address as Base58.
pub fn associated_token_address_for(wallet: &str, mint: &str) -> Result<String, SolError> {
    let wallet = address_to_bytes(wallet)?;
    let mint = address_to_bytes(mint)?;
    let ata = derive_associated_token_address(&wallet, &mint)?;
    Ok(bytes_to_address(&ata))
}

/// Derive the associated token account address for a wallet + mint pair.
///
/// The ATA is a Program Derived Address (PDA) with seeds:
///   `[wallet_address, token_program_id, mint_address]`
/// derived from the Associated Token Account program.
pub fn derive_associated_token_address(
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[wallet.as_ref(), &TOKEN_PROGRAM_ID, mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}

/// Iterates bump seeds from 255 down to 0 and returns the first derived
/// address that is NOT a valid Ed25519 point.
fn find_program_address(
    seeds: &[&[u8]],
    program_id: &[u8; 32],
) -> Result<([u8; 32], u8), SolError> {
    for bump in (0u8..=255).rev() {
        if let Some(address) = try_create_program_address(seeds, &[bump], program_id) {
            return Ok((address, bump));
        }
    }

    Err(SolError::InvalidAddress(
        "could not find valid PDA bump seed".into(),
    ))
}

/// `SHA-256(seeds || bump || program_id || "ProgramDerivedAddress")`, or
/// `None` when the hash lands on the curve.
fn try_create_program_address(
    seeds: &[&[u8]],
    bump_seed: &[u8],
    program_id: &[u8; 32],
) -> Option<[u8; 32]> {
    let mut hasher = Sha256::new();

    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(bump_seed);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);

    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return None;
    }

    Some(hash)
}
