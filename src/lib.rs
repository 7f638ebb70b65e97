//! Rust implementation of the FF1 and FF3 methods for format-preserving
//! encryption, specified in
//! [NIST Special Publication 800-38G](https://nvlpubs.nist.gov/nistpubs/SpecialPublications/NIST.SP.800-38G.pdf).
//!
//! Both modes permute numeral strings: sequences of digits over a radix in
//! `[2, 2^16]`, transformed in place so the ciphertext has the same length
//! and alphabet as the plaintext. Each mode is offered in two parameter
//! sets, selected with [`Variant`] at construction time:
//!
//! * [`Variant::Nist`] follows SP 800-38G exactly and matches its sample
//!   vectors, including the big-endian counter blocks of the FF1 output
//!   expansion.
//! * [`Variant::Hardened`] scales the round count with the input length to
//!   resist the message-recovery attack of Bellare, Hoang, and Tessaro
//!   (<https://eprint.iacr.org/2016/794>), and for FF3 switches to a 6 byte
//!   tweak that keeps the round index out of the tweak material, the fix
//!   suggested by Durak and Vaudenay (<https://eprint.iacr.org/2017/521>).
//!
//! Ciphertexts from different parameter sets do not interoperate.
//!
//! # Example
//!
//! ```rust
//! # use aes::{
//! #     cipher::{generic_array::GenericArray, NewBlockCipher},
//! #     Aes128,
//! # };
//! # use radix_fpe::{Variant, FF1};
//! #
//! const KEY: [u8; 16] = [
//!     0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6,
//!     0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F, 0x3C,
//! ];
//!
//! let cipher = Aes128::new(GenericArray::from_slice(&KEY));
//! let ff1 = FF1::new(&cipher, &[], 10, Variant::Nist).unwrap();
//!
//! let mut x: [u16; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
//! ff1.encrypt(&mut x).unwrap();
//! assert_eq!(x, [2, 4, 3, 3, 4, 7, 7, 4, 8, 4]);
//! ff1.decrypt(&mut x).unwrap();
//! assert_eq!(x, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
//! ```
//!
//! # FF3 key convention
//!
//! FF3 requires the block cipher to be keyed with the byte-reversed key;
//! the library does not reverse it silently. Apply [`rev_b`] to the key
//! bytes before constructing the cipher passed to [`FF3::new`].

#![deny(missing_docs)]

mod error;
mod ff1;
mod ff3;
mod numeral;
mod prf;

pub use crate::{
    error::Error,
    ff1::FF1,
    ff3::FF3,
    numeral::{bytes_to_numeral_string, numeral_string_to_bytes, rev_b},
};

/// Parameter set of an [`FF1`] or [`FF3`] context.
///
/// The choice fixes the Feistel round schedule (and, for FF3, the tweak
/// length) for the lifetime of the context. The two parameter sets are not
/// interoperable: a ciphertext produced under one cannot be decrypted under
/// the other.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Variant {
    /// The parameters of NIST SP 800-38G: 10 rounds for FF1, 8 rounds and
    /// an 8 byte tweak for FF3. Matches the published sample vectors.
    Nist,
    /// Length-scaled round counts and a 6 byte FF3 tweak that is kept
    /// disjoint from the round index. See the crate-level documentation
    /// for the attacks these parameters address.
    Hardened,
}

/// Round count for the hardened parameter set, scaled so short inputs get
/// more rounds: 12 for n >= 32, up to 36 below 10 numerals.
fn scaled_rounds(n: usize) -> usize {
    match n {
        _ if n >= 32 => 12,
        _ if n >= 20 => 18,
        _ if n >= 14 => 24,
        _ if n >= 10 => 30,
        _ => 36,
    }
}
