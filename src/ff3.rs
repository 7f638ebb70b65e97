use cipher::{
    generic_array::{typenum::U16, GenericArray},
    BlockCipher, BlockEncrypt,
};
use num::bigint::BigUint;

use crate::numeral::{
    add_mod_pow, as_b_bytes, bytes_to_numeral_string, domain_is_large_enough,
    is_numeral_string_valid, num, num_radix, numeral_string_to_bytes, rev, rev_b, str_m_radix,
    sub_mod_pow,
};
use crate::prf::BLOCK_SIZE;
use crate::{scaled_rounds, Error, Variant};

// The radix must be in [2..2^16].
const MIN_RADIX: u32 = 2;
const MAX_RADIX: u32 = 1 << 16;
// The minimum length of the numeral string is 2; the maximum depends on
// the radix.
const MIN_LEN: usize = 2;

const NIST_ROUNDS: usize = 8;
const NIST_TWEAK_LEN: usize = 8;
const HARDENED_TWEAK_LEN: usize = 6;

/// A struct for performing FF3 encryption and decryption over an arbitrary
/// radix in `[2, 2^16]`.
///
/// The block cipher must have a 16 byte block size and should be AES-128,
/// AES-192, or AES-256, keyed with the **byte-reversed** key: FF3 applies
/// the cipher to reversed blocks under a reversed key, and this library
/// leaves the key reversal to the caller. Use [`rev_b`] on the key bytes
/// before constructing the cipher; external FF3 test vectors only match
/// when the reversal is applied.
///
/// [`rev_b`]: crate::rev_b
pub struct FF3<'a, C> {
    cipher: &'a C,
    tweak: Vec<u8>,
    radix: u32,
    variant: Variant,
}

impl<'a, C> FF3<'a, C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt,
{
    /// Creates an [`FF3`] context for a given block cipher, tweak, radix,
    /// and parameter set.
    ///
    /// [`Variant::Nist`] requires an 8 byte tweak; [`Variant::Hardened`]
    /// requires 6 bytes, keeping the round index out of the tweak material.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTweakLength`] if the tweak length does not
    /// match the parameter set, and [`Error::InvalidRadix`] if the radix is
    /// outside `[2, 2^16]`.
    pub fn new(cipher: &'a C, tweak: &[u8], radix: u32, variant: Variant) -> Result<Self, Error> {
        if tweak.len() != tweak_len(variant) {
            return Err(Error::InvalidTweakLength);
        }
        if radix < MIN_RADIX || radix > MAX_RADIX {
            return Err(Error::InvalidRadix);
        }
        Ok(Self {
            cipher,
            tweak: tweak.to_vec(),
            radix,
            variant,
        })
    }

    /// The parameter set this context was constructed with.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Replaces the tweak, re-validating its length against the parameter
    /// set.
    pub fn set_tweak(&mut self, tweak: &[u8]) -> Result<(), Error> {
        if tweak.len() != tweak_len(self.variant) {
            return Err(Error::InvalidTweakLength);
        }
        self.tweak = tweak.to_vec();
        Ok(())
    }

    /// Replaces the radix, re-validating its bounds.
    pub fn set_radix(&mut self, radix: u32) -> Result<(), Error> {
        if radix < MIN_RADIX || radix > MAX_RADIX {
            return Err(Error::InvalidRadix);
        }
        self.radix = radix;
        Ok(())
    }

    /// Encrypts the given numeral string in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInputLength`] if the length of `x` is
    /// outside `[2, 2 * floor(96 / log2(radix))]`, [`Error::DomainTooSmall`]
    /// if `radix^n < 100`, and [`Error::InvalidNumeralString`] if any
    /// numeral is not less than the radix.
    pub fn encrypt(&self, x: &mut [u16]) -> Result<(), Error> {
        self.check_input(x)?;

        let n = x.len();
        let u = (n + 1) / 2;
        let v = n - u;
        let (tl, tr) = self.tweak_halves();

        let (mut a, mut b) = {
            let (left, right) = x.split_at(u);
            (left.to_vec(), right.to_vec())
        };

        for i in 0..self.rounds(n) {
            let (m, w) = if i % 2 == 0 { (u, tr) } else { (v, tl) };
            let y = self.round_output(w, i, &b)?;
            let c = add_mod_pow(&num_radix(&rev(&a), self.radix), &y, self.radix, m);
            a = rev(&str_m_radix(self.radix, m, &c)?);
            core::mem::swap(&mut a, &mut b);
        }

        x[..a.len()].copy_from_slice(&a);
        x[a.len()..].copy_from_slice(&b);
        Ok(())
    }

    /// Decrypts the given numeral string in place.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FF3::encrypt`].
    pub fn decrypt(&self, x: &mut [u16]) -> Result<(), Error> {
        self.check_input(x)?;

        let n = x.len();
        let u = (n + 1) / 2;
        let v = n - u;
        let (tl, tr) = self.tweak_halves();

        let (mut a, mut b) = {
            let (left, right) = x.split_at(u);
            (left.to_vec(), right.to_vec())
        };

        for i in (0..self.rounds(n)).rev() {
            let (m, w) = if i % 2 == 0 { (u, tr) } else { (v, tl) };
            let y = self.round_output(w, i, &a)?;
            let c = sub_mod_pow(&num_radix(&rev(&b), self.radix), &y, self.radix, m);
            b = rev(&str_m_radix(self.radix, m, &c)?);
            core::mem::swap(&mut a, &mut b);
        }

        x[..a.len()].copy_from_slice(&a);
        x[a.len()..].copy_from_slice(&b);
        Ok(())
    }

    /// Encrypts a byte string holding two big-endian bytes per numeral.
    ///
    /// A trailing unpaired byte is not part of any numeral and is left
    /// untouched.
    pub fn encrypt_bytes(&self, data: &mut [u8]) -> Result<(), Error> {
        let mut digits = bytes_to_numeral_string(data);
        self.encrypt(&mut digits)?;
        let bytes = numeral_string_to_bytes(&digits);
        data[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    /// Decrypts a byte string holding two big-endian bytes per numeral.
    ///
    /// A trailing unpaired byte is not part of any numeral and is left
    /// untouched.
    pub fn decrypt_bytes(&self, data: &mut [u8]) -> Result<(), Error> {
        let mut digits = bytes_to_numeral_string(data);
        self.decrypt(&mut digits)?;
        let bytes = numeral_string_to_bytes(&digits);
        data[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    fn rounds(&self, n: usize) -> usize {
        match self.variant {
            Variant::Nist => NIST_ROUNDS,
            Variant::Hardened => scaled_rounds(n),
        }
    }

    fn tweak_halves(&self) -> (&[u8], &[u8]) {
        match self.variant {
            Variant::Nist => (&self.tweak[..4], &self.tweak[4..]),
            Variant::Hardened => (&self.tweak[..3], &self.tweak[3..]),
        }
    }

    fn check_input(&self, x: &[u16]) -> Result<(), Error> {
        let n = x.len();
        if n < MIN_LEN || n > max_len(self.radix) {
            return Err(Error::InvalidInputLength);
        }
        if !domain_is_large_enough(self.radix, n) {
            return Err(Error::DomainTooSmall);
        }
        if !is_numeral_string_valid(x, self.radix) {
            return Err(Error::InvalidNumeralString);
        }
        Ok(())
    }

    /// One invocation of the round function:
    /// `y = num(rev_b(CIPH(rev_b(P))))` with P built from the tweak half,
    /// the round index, and the reversed numeral half.
    fn round_output(&self, w: &[u8], i: usize, half: &[u16]) -> Result<BigUint, Error> {
        let p = self.block_p(w, i, half)?;
        let mut block = GenericArray::clone_from_slice(&rev_b(&p));
        self.cipher.encrypt_block(&mut block);
        Ok(num(&rev_b(&block)))
    }

    /// P places the tweak half and the round index in the first four bytes
    /// and the reversed numeral half, as a 12 byte integer, in the rest.
    ///
    /// The NIST layout XORs the round index over the 4 byte half; the
    /// hardened layout keeps the 3 byte half and the index byte disjoint so
    /// the tweak can never mask the round counter.
    fn block_p(&self, w: &[u8], i: usize, half: &[u16]) -> Result<[u8; BLOCK_SIZE], Error> {
        let mut p = [0u8; BLOCK_SIZE];
        match self.variant {
            Variant::Nist => {
                p[..4].copy_from_slice(w);
                for (dst, src) in p[..4].iter_mut().zip(&(i as u32).to_be_bytes()) {
                    *dst ^= src;
                }
            }
            Variant::Hardened => {
                p[..3].copy_from_slice(w);
                p[3] = i as u8;
            }
        }

        let value = num_radix(&rev(half), self.radix);
        p[4..].copy_from_slice(&as_b_bytes(&value, 12)?);
        Ok(p)
    }
}

fn tweak_len(variant: Variant) -> usize {
    match variant {
        Variant::Nist => NIST_TWEAK_LEN,
        Variant::Hardened => HARDENED_TWEAK_LEN,
    }
}

/// maxlen = 2 * floor(96 / log2(radix)): both halves must stay below 2^96
/// so their values fit the 12 byte field of P.
fn max_len(radix: u32) -> usize {
    (2.0 * (96.0 / f64::from(radix).log2()).floor()) as usize
}
