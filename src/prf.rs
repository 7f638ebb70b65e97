use cipher::{
    generic_array::{typenum::U16, GenericArray},
    BlockCipher, BlockEncrypt,
};

pub(crate) const BLOCK_SIZE: usize = 16;

/// CBC-MAC over a borrowed block cipher with an all-zero IV.
///
/// This is a secure PRF only for fixed-length inputs; the FF1 driver
/// guarantees that by padding `P || Q` to a block boundary before the
/// round-dependent suffix.
pub(crate) struct Prf<'a, C> {
    cipher: &'a C,
    offset: usize,
    state: GenericArray<u8, U16>,
}

impl<'a, C> Prf<'a, C>
where
    C: BlockCipher<BlockSize = U16> + BlockEncrypt,
{
    pub fn new(cipher: &'a C) -> Self {
        Self {
            cipher,
            offset: 0,
            state: GenericArray::default(),
        }
    }

    fn ciph(&mut self) {
        self.cipher.encrypt_block(&mut self.state);
    }

    /// Absorbs `buf` into the MAC state, encrypting each completed block.
    pub fn write(&mut self, buf: &[u8]) {
        let offset = self.offset;
        let needed = BLOCK_SIZE - offset;

        if needed > buf.len() {
            xor_slice(&mut self.state[offset..offset + buf.len()], buf);
            self.offset += buf.len();
        } else {
            xor_slice(&mut self.state[offset..], &buf[..needed]);
            self.ciph();

            let mut chunks = buf[needed..].chunks_exact(BLOCK_SIZE);
            for block in chunks.by_ref() {
                xor_slice(&mut self.state, block);
                self.ciph();
            }

            let remainder = chunks.remainder();
            xor_slice(&mut self.state[..remainder.len()], remainder);
            self.offset = remainder.len();
        }
    }

    /// Absorbs `n` zero bytes. XOR with zero leaves the state unchanged, so
    /// only block boundaries crossed along the way cost an encryption.
    pub fn pad(&mut self, n: usize) {
        let offset = self.offset + n;
        for _ in 0..offset / BLOCK_SIZE {
            self.ciph();
        }
        self.offset = offset % BLOCK_SIZE;
    }

    /// Returns the final CBC-MAC block.
    ///
    /// Panics if the absorbed input is not a multiple of the block size.
    pub fn output(&self) -> [u8; BLOCK_SIZE] {
        assert_eq!(self.offset, 0, "incomplete block");
        let mut out = [0; BLOCK_SIZE];
        out.copy_from_slice(&self.state);
        out
    }

    /// Expands the MAC block R into the `d`-byte string
    /// `R || CIPH(R xor [1]^16) || CIPH(R xor [2]^16) || ...`, truncated to
    /// `d` bytes. `[j]^16` encodes the counter as a 16-byte big-endian
    /// block, the layout specified in SP 800-38G.
    pub fn expand(&self, d: usize) -> Vec<u8> {
        let mut s = Vec::with_capacity((d + BLOCK_SIZE - 1) / BLOCK_SIZE * BLOCK_SIZE);
        s.extend_from_slice(&self.output());

        let mut counter: u32 = 1;
        while s.len() < d {
            let mut block = self.state;
            xor_slice(&mut block[BLOCK_SIZE - 4..], &counter.to_be_bytes());
            self.cipher.encrypt_block(&mut block);
            s.extend_from_slice(&block);
            counter += 1;
        }

        s.truncate(d);
        s
    }
}

fn xor_slice(dst: &mut [u8], src: &[u8]) {
    assert_eq!(
        dst.len(),
        src.len(),
        "destination and source slices have different lengths"
    );
    for (lhs, &rhs) in dst.iter_mut().zip(src.iter()) {
        *lhs ^= rhs;
    }
}
