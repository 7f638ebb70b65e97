use cipher::{generic_array::typenum::U16, BlockCipher, BlockEncrypt};
use num::bigint::BigUint;

use crate::numeral::{
    add_mod_pow, as_b_bytes, bytes_to_numeral_string, domain_is_large_enough,
    is_numeral_string_valid, num, num_radix, numeral_string_to_bytes, str_m_radix, sub_mod_pow,
};
use crate::prf::{Prf, BLOCK_SIZE};
use crate::{scaled_rounds, Error, Variant};

// The tweak length must be in [0..2^16].
const MAX_TWEAK_LEN: usize = 1 << 16;
// The radix must be in [2..2^16].
const MIN_RADIX: u32 = 2;
const MAX_RADIX: u32 = 1 << 16;
// The numeral string length must be in [2..2^32 - 1].
const MIN_LEN: usize = 2;
const MAX_LEN: usize = u32::MAX as usize;

const NIST_ROUNDS: usize = 10;

/// A struct for performing FF1 encryption and decryption over an arbitrary
/// radix in `[2, 2^16]`.
///
/// The block cipher must have a 16 byte block size and should be AES-128,
/// AES-192, or AES-256. The context borrows the cipher and owns a copy of
/// the tweak; transforms take `&self` and may run concurrently on distinct
/// inputs.
pub struct FF1<'a, C> {
    cipher: &'a C,
    tweak: Vec<u8>,
    radix: u32,
    variant: Variant,
}

impl<'a, C> FF1<'a, C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt,
{
    /// Creates an [`FF1`] context for a given block cipher, tweak, radix,
    /// and parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTweakLength`] if the tweak is longer than
    /// 2^16 bytes, and [`Error::InvalidRadix`] if the radix is outside
    /// `[2, 2^16]`.
    pub fn new(cipher: &'a C, tweak: &[u8], radix: u32, variant: Variant) -> Result<Self, Error> {
        if tweak.len() > MAX_TWEAK_LEN {
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

    /// Replaces the tweak, re-validating its length.
    pub fn set_tweak(&mut self, tweak: &[u8]) -> Result<(), Error> {
        if tweak.len() > MAX_TWEAK_LEN {
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
    /// outside `[2, 2^32 - 1]`, [`Error::DomainTooSmall`] if
    /// `radix^n < 100`, and [`Error::InvalidNumeralString`] if any numeral
    /// is not less than the radix.
    pub fn encrypt(&self, x: &mut [u16]) -> Result<(), Error> {
        self.check_input(x)?;

        let n = x.len();
        let u = n / 2;
        let v = n - u;
        let beta = num_bytes(v, self.radix);
        let d = 4 * ((beta + 3) / 4) + 4;
        let p = self.block_p(u, n);
        let z = pad_len(self.tweak.len(), beta);

        let (mut a, mut b) = {
            let (left, right) = x.split_at(u);
            (left.to_vec(), right.to_vec())
        };

        for i in 0..self.rounds(n) {
            let y = self.round_output(&p, z, i, &b, beta, d)?;
            let m = if i % 2 == 0 { u } else { v };
            let c = add_mod_pow(&num_radix(&a, self.radix), &y, self.radix, m);
            a = str_m_radix(self.radix, m, &c)?;
            core::mem::swap(&mut a, &mut b);
        }

        x[..a.len()].copy_from_slice(&a);
        x[a.len()..].copy_from_slice(&b);
        Ok(())
    }

    /// Decrypts the given numeral string in place.
    ///
    /// This is the inverse of [`FF1::encrypt`]: the rounds run backwards
    /// and the round output is subtracted instead of added.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FF1::encrypt`].
    pub fn decrypt(&self, x: &mut [u16]) -> Result<(), Error> {
        self.check_input(x)?;

        let n = x.len();
        let u = n / 2;
        let v = n - u;
        let beta = num_bytes(v, self.radix);
        let d = 4 * ((beta + 3) / 4) + 4;
        let p = self.block_p(u, n);
        let z = pad_len(self.tweak.len(), beta);

        let (mut a, mut b) = {
            let (left, right) = x.split_at(u);
            (left.to_vec(), right.to_vec())
        };

        for i in (0..self.rounds(n)).rev() {
            let y = self.round_output(&p, z, i, &a, beta, d)?;
            let m = if i % 2 == 0 { u } else { v };
            let c = sub_mod_pow(&num_radix(&b, self.radix), &y, self.radix, m);
            b = str_m_radix(self.radix, m, &c)?;
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

    fn check_input(&self, x: &[u16]) -> Result<(), Error> {
        let n = x.len();
        if n < MIN_LEN || n > MAX_LEN {
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

    /// One invocation of the round function: CBC-MAC over
    /// `P || T || [0]^z || [i]^1 || [num_radix(half)]^beta`, expanded in
    /// counter mode to `d` bytes and interpreted as an integer.
    fn round_output(
        &self,
        p: &[u8; BLOCK_SIZE],
        z: usize,
        i: usize,
        half: &[u16],
        beta: usize,
        d: usize,
    ) -> Result<BigUint, Error> {
        let mut prf = Prf::new(self.cipher);
        prf.write(p);
        prf.write(&self.tweak);
        prf.pad(z);
        prf.write(&[i as u8]);
        prf.write(&as_b_bytes(&num_radix(half, self.radix), beta)?);
        Ok(num(&prf.expand(d)))
    }

    /// P = [1]^1 || [2]^1 || [1]^1 || [radix]^3 || [10]^1 || [u mod 256]^1
    ///     || [n]^4 || [t]^4
    fn block_p(&self, u: usize, n: usize) -> [u8; BLOCK_SIZE] {
        let mut p = [0u8; BLOCK_SIZE];
        p[0] = 1;
        p[1] = 2;
        p[2] = 1;
        p[3..6].copy_from_slice(&self.radix.to_be_bytes()[1..]);
        p[6] = 10;
        p[7] = (u % 256) as u8;
        p[8..12].copy_from_slice(&(n as u32).to_be_bytes());
        p[12..16].copy_from_slice(&(self.tweak.len() as u32).to_be_bytes());
        p
    }
}

/// beta = ceil(ceil(v * log2(radix)) / 8), the minimum number of bytes that
/// can hold a v-digit number in base radix.
fn num_bytes(v: usize, radix: u32) -> usize {
    let bits = (v as f64 * f64::from(radix).log2()).ceil();
    (bits / 8.0).ceil() as usize
}

/// z = (-(t + beta + 1)) mod 16, the zero padding that aligns P || Q to the
/// block size ahead of the round-dependent suffix.
fn pad_len(t: usize, beta: usize) -> usize {
    (BLOCK_SIZE - (t + beta + 1) % BLOCK_SIZE) % BLOCK_SIZE
}

#[cfg(test)]
mod tests {
    use super::FF1;
    use crate::numeral::domain_is_large_enough;
    use crate::{Error, Variant};

    use aes::{
        cipher::{generic_array::GenericArray, NewBlockCipher},
        Aes256,
    };

    use lazy_static::lazy_static;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    lazy_static! {
        static ref CIPHER: Aes256 = {
            const KEY: [u8; 32] = [
                0xF9, 0xE8, 0x38, 0x9F, 0x5B, 0x80, 0x71, 0x2E, 0x38, 0x86, 0xCC, 0x1F, 0xA2, 0xD2,
                0x8A, 0x3B, 0x8C, 0x9C, 0xD8, 0x8A, 0x2D, 0x4A, 0x54, 0xC6, 0xAA, 0x86, 0xCE, 0x0F,
                0xEF, 0x94, 0x4B, 0xE0,
            ];
            Aes256::new(GenericArray::from_slice(&KEY))
        };
    }

    fn narrow(tweak: Vec<u8>, digits: Vec<u16>, radix: u32) -> Option<(Vec<u8>, Vec<u16>, u32)> {
        let radix = 2 + radix % ((1 << 16) - 1);
        let digits: Vec<u16> = digits
            .into_iter()
            .take(64)
            .map(|digit| (u32::from(digit) % radix) as u16)
            .collect();

        if digits.len() < 2 || !domain_is_large_enough(radix, digits.len()) {
            return None;
        }
        Some((tweak, digits, radix))
    }

    fn variant_of(hardened: bool) -> Variant {
        if hardened {
            Variant::Hardened
        } else {
            Variant::Nist
        }
    }

    #[quickcheck]
    fn encrypt_then_decrypt(
        tweak: Vec<u8>,
        digits: Vec<u16>,
        radix: u32,
        hardened: bool,
    ) -> TestResult {
        let (tweak, digits, radix) = match narrow(tweak, digits, radix) {
            Some(args) => args,
            None => return TestResult::discard(),
        };

        let ff1 = FF1::new(&*CIPHER, &tweak, radix, variant_of(hardened)).unwrap();

        let mut output = digits.clone();
        ff1.encrypt(&mut output).unwrap();

        // Format preservation: same length, same alphabet.
        assert_eq!(output.len(), digits.len());
        assert!(output.iter().all(|&digit| u32::from(digit) < radix));

        ff1.decrypt(&mut output).unwrap();
        TestResult::from_bool(output == digits)
    }

    #[quickcheck]
    fn decrypt_then_encrypt(
        tweak: Vec<u8>,
        digits: Vec<u16>,
        radix: u32,
        hardened: bool,
    ) -> TestResult {
        let (tweak, digits, radix) = match narrow(tweak, digits, radix) {
            Some(args) => args,
            None => return TestResult::discard(),
        };

        let ff1 = FF1::new(&*CIPHER, &tweak, radix, variant_of(hardened)).unwrap();

        let mut output = digits.clone();
        ff1.decrypt(&mut output).unwrap();
        ff1.encrypt(&mut output).unwrap();
        TestResult::from_bool(output == digits)
    }

    /// A context must not become input-specific: encrypting two different
    /// plaintexts alternately has to keep producing the same ciphertexts.
    #[quickcheck]
    fn encrypt_reuse_multiple_plaintexts(
        tweak: Vec<u8>,
        x1: Vec<u16>,
        x2: Vec<u16>,
        radix: u32,
    ) -> TestResult {
        let radix = 2 + radix % ((1 << 16) - 1);
        let normalize = |x: Vec<u16>| -> Vec<u16> {
            x.into_iter()
                .take(32)
                .map(|digit| (u32::from(digit) % radix) as u16)
                .collect()
        };

        let x1 = normalize(x1);
        let x2 = normalize(x2);
        if x1.len() != x2.len()
            || x1 == x2
            || x1.len() < 2
            || !domain_is_large_enough(radix, x1.len())
        {
            return TestResult::discard();
        }

        let ff1 = FF1::new(&*CIPHER, &tweak, radix, Variant::Nist).unwrap();
        let encrypt = |x: &[u16]| {
            let mut output = x.to_vec();
            ff1.encrypt(&mut output).unwrap();
            output
        };

        let expected_1 = encrypt(&x1);
        let expected_2 = encrypt(&x2);
        if expected_1 == expected_2 {
            return TestResult::failed();
        }

        TestResult::from_bool(
            (0..10).all(|_| encrypt(&x1) == expected_1 && encrypt(&x2) == expected_2),
        )
    }

    #[test]
    fn radix_bounds() {
        assert_eq!(
            FF1::new(&*CIPHER, &[], 1, Variant::Nist).err(),
            Some(Error::InvalidRadix)
        );
        assert_eq!(
            FF1::new(&*CIPHER, &[], (1 << 16) + 1, Variant::Nist).err(),
            Some(Error::InvalidRadix)
        );

        // Both ends of the radix range round-trip.
        for radix in [2_u32, 1 << 16] {
            let ff1 = FF1::new(&*CIPHER, &[], radix, Variant::Nist).unwrap();
            let digits: Vec<u16> = (0..8).map(|i| (i % radix) as u16).collect();
            let mut output = digits.clone();
            ff1.encrypt(&mut output).unwrap();
            ff1.decrypt(&mut output).unwrap();
            assert_eq!(output, digits);
        }
    }

    #[test]
    fn tweak_bounds() {
        assert!(FF1::new(&*CIPHER, &[], 10, Variant::Nist).is_ok());
        assert!(FF1::new(&*CIPHER, &vec![0; 1 << 16], 10, Variant::Nist).is_ok());
        assert_eq!(
            FF1::new(&*CIPHER, &vec![0; (1 << 16) + 1], 10, Variant::Nist).err(),
            Some(Error::InvalidTweakLength)
        );

        let mut ff1 = FF1::new(&*CIPHER, &[], 10, Variant::Nist).unwrap();
        assert_eq!(
            ff1.set_tweak(&vec![0; (1 << 16) + 1]),
            Err(Error::InvalidTweakLength)
        );
        assert!(ff1.set_tweak(&[1, 2, 3]).is_ok());
    }

    #[test]
    fn input_bounds() {
        let ff1 = FF1::new(&*CIPHER, &[], 10, Variant::Nist).unwrap();

        assert_eq!(ff1.encrypt(&mut []), Err(Error::InvalidInputLength));
        assert_eq!(ff1.encrypt(&mut [7]), Err(Error::InvalidInputLength));
        assert_eq!(
            ff1.encrypt(&mut [1, 2, 10]),
            Err(Error::InvalidNumeralString)
        );

        // radix^n = 100 is accepted on the boundary; 81 is not.
        let mut x = [9, 9];
        ff1.encrypt(&mut x).unwrap();

        let ff1 = FF1::new(&*CIPHER, &[], 9, Variant::Nist).unwrap();
        assert_eq!(ff1.encrypt(&mut [8, 8]), Err(Error::DomainTooSmall));

        let ff1 = FF1::new(&*CIPHER, &[], 2, Variant::Nist).unwrap();
        assert_eq!(
            ff1.encrypt(&mut [1, 0, 1, 0, 1, 0]),
            Err(Error::DomainTooSmall)
        );
        let mut x = [1, 0, 1, 0, 1, 0, 1];
        ff1.encrypt(&mut x).unwrap();
    }

    #[test]
    fn tweak_changes_ciphertext() {
        let digits = [0_u16, 1, 2, 3, 4, 5, 6, 7, 8, 9];

        let mut with_t1 = digits;
        FF1::new(&*CIPHER, &[0; 8], 10, Variant::Nist)
            .unwrap()
            .encrypt(&mut with_t1)
            .unwrap();

        let mut with_t2 = digits;
        FF1::new(&*CIPHER, &[1; 8], 10, Variant::Nist)
            .unwrap()
            .encrypt(&mut with_t2)
            .unwrap();

        assert_ne!(with_t1, with_t2);

        // set_tweak reconfigures an existing context to match.
        let mut ff1 = FF1::new(&*CIPHER, &[0; 8], 10, Variant::Nist).unwrap();
        ff1.set_tweak(&[1; 8]).unwrap();
        let mut output = digits;
        ff1.encrypt(&mut output).unwrap();
        assert_eq!(output, with_t2);
    }

    #[test]
    fn variants_do_not_interoperate() {
        let digits = [0_u16, 1, 2, 3, 4, 5, 6, 7, 8, 9];

        let nist = FF1::new(&*CIPHER, &[], 10, Variant::Nist).unwrap();
        let hardened = FF1::new(&*CIPHER, &[], 10, Variant::Hardened).unwrap();
        assert_eq!(nist.variant(), Variant::Nist);
        assert_eq!(hardened.variant(), Variant::Hardened);

        let mut a = digits;
        nist.encrypt(&mut a).unwrap();
        let mut b = digits;
        hardened.encrypt(&mut b).unwrap();
        assert_ne!(a, b);

        // Each variant still inverts itself.
        hardened.decrypt(&mut b).unwrap();
        assert_eq!(b, digits);
    }

    #[test]
    fn set_radix_revalidates() {
        let mut ff1 = FF1::new(&*CIPHER, &[], 10, Variant::Nist).unwrap();
        assert_eq!(ff1.set_radix(1), Err(Error::InvalidRadix));
        ff1.set_radix(16).unwrap();

        let mut x = [15_u16, 0, 15, 0];
        ff1.encrypt(&mut x).unwrap();
        assert!(x.iter().all(|&digit| digit < 16));
        ff1.decrypt(&mut x).unwrap();
        assert_eq!(x, [15, 0, 15, 0]);
    }

    #[test]
    fn byte_adapter_matches_numeral_path() {
        let ff1 = FF1::new(&*CIPHER, &[7; 4], 10, Variant::Nist).unwrap();

        let digits = [0_u16, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut expected = digits;
        ff1.encrypt(&mut expected).unwrap();

        let mut bytes = crate::numeral_string_to_bytes(&digits);
        ff1.encrypt_bytes(&mut bytes).unwrap();
        assert_eq!(crate::bytes_to_numeral_string(&bytes), expected);

        ff1.decrypt_bytes(&mut bytes).unwrap();
        assert_eq!(bytes, crate::numeral_string_to_bytes(&digits));
    }
}
