use num::bigint::{BigInt, BigUint, Sign};
use num::traits::{Pow, ToPrimitive, Zero};
use num::Integer;

use crate::Error;

/// Returns the integer that the numeral string `x` represents in base
/// `radix`, with the numerals valued in decreasing order of significance.
/// An empty string represents zero.
pub(crate) fn num_radix(x: &[u16], radix: u32) -> BigUint {
    let r = BigUint::from(radix);
    let mut out = BigUint::zero();
    for &digit in x {
        out *= &r;
        out += BigUint::from(digit);
    }
    out
}

/// Returns the integer that the byte string `x` represents when the bytes
/// are valued in decreasing order of significance.
pub(crate) fn num(x: &[u8]) -> BigUint {
    BigUint::from_bytes_be(x)
}

/// Returns the representation of `x` as a string of `m` numerals in base
/// `radix`, in decreasing order of significance.
///
/// Fails with [`Error::ValueOutOfRange`] unless `x < radix^m`.
pub(crate) fn str_m_radix(radix: u32, m: usize, x: &BigUint) -> Result<Vec<u16>, Error> {
    if *x >= pow_radix(radix, m) {
        return Err(Error::ValueOutOfRange);
    }

    let r = BigUint::from(radix);
    let mut out = vec![0u16; m];
    let mut x = x.clone();
    for digit in out.iter_mut().rev() {
        let (q, rem) = x.div_rem(&r);
        *digit = rem.to_u16().expect("remainder below radix");
        x = q;
    }
    Ok(out)
}

/// Returns the representation of `x` as a string of exactly `b` bytes in
/// decreasing order of significance, left-padded with zeros.
///
/// Fails with [`Error::ValueOutOfRange`] unless `x < 256^b`.
pub(crate) fn as_b_bytes(x: &BigUint, b: usize) -> Result<Vec<u8>, Error> {
    if x.bits() as usize > b * 8 {
        return Err(Error::ValueOutOfRange);
    }

    let mut out = vec![0u8; b];
    if !x.is_zero() {
        let bytes = x.to_bytes_be();
        out[b - bytes.len()..].copy_from_slice(&bytes);
    }
    Ok(out)
}

/// Returns the numeral string that consists of the numerals of `x` in
/// reverse order.
pub(crate) fn rev(x: &[u16]) -> Vec<u16> {
    x.iter().rev().copied().collect()
}

/// Returns the byte string that consists of the bytes of `x` in reverse
/// order.
///
/// FF3 keys the block cipher with the byte-reversed key; this function is
/// exported so callers can apply the reversal (see [`FF3::new`]).
///
/// [`FF3::new`]: crate::FF3::new
pub fn rev_b(x: &[u8]) -> Vec<u8> {
    x.iter().rev().copied().collect()
}

/// Returns true iff every numeral of `x` is less than `radix`.
pub(crate) fn is_numeral_string_valid(x: &[u16], radix: u32) -> bool {
    x.iter().all(|&digit| u32::from(digit) < radix)
}

/// Serializes a numeral string as a byte string, each numeral stored as two
/// big-endian bytes.
pub fn numeral_string_to_bytes(x: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 * x.len());
    for &digit in x {
        out.extend_from_slice(&digit.to_be_bytes());
    }
    out
}

/// Deserializes a byte string into a numeral string, reading each numeral
/// as two big-endian bytes. A trailing unpaired byte is ignored.
pub fn bytes_to_numeral_string(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

/// radix^m
pub(crate) fn pow_radix(radix: u32, m: usize) -> BigUint {
    BigUint::from(radix).pow(m as u32)
}

/// radix^n >= 100, evaluated without constructing radix^n for large n.
pub(crate) fn domain_is_large_enough(radix: u32, n: usize) -> bool {
    // Seven digits cover at least 2^7 = 128 values for any valid radix.
    n >= 7 || u128::from(radix).pow(n as u32) >= 100
}

/// (a + y) mod radix^m, in the nonnegative representative.
pub(crate) fn add_mod_pow(a: &BigUint, y: &BigUint, radix: u32, m: usize) -> BigUint {
    (a + y) % pow_radix(radix, m)
}

/// (a - y) mod radix^m, in the nonnegative representative.
pub(crate) fn sub_mod_pow(a: &BigUint, y: &BigUint, radix: u32, m: usize) -> BigUint {
    let modulus = BigInt::from(pow_radix(radix, m));
    let mut c = (BigInt::from(a.clone()) - BigInt::from(y.clone())) % &modulus;
    if c.sign() == Sign::Minus {
        c += &modulus;
    }
    c.to_biguint().expect("nonnegative after reduction")
}
