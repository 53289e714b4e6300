//! A non-standard MD5 variant used only to finalize the Continuum key
//! expansion table. The initialization vector and all 64 round constants
//! are XORed with a caller-supplied "mangler" word, so this cannot be
//! expressed with a stock MD5 crate — it is a deliberately different
//! permutation of the standard algorithm.

const S: [[u32; 4]; 4] =
    [[7, 12, 17, 22], [5, 9, 14, 20], [4, 11, 16, 23], [6, 10, 15, 21]];

const ROUND1_K: [u32; 16] = [
    0xd76a5478, 0xe867b756, 0x242073db, 0xc18d3eee, 0xf57308af, 0x4787c62a, 0xa8384613, 0xfd469501, 0x688098d8,
    0x8b44f7af, 0xff8f5bb1, 0x898cd7be, 0x6b901822, 0xfd987193, 0xa679438e, 0x49740821,
];
const ROUND2_K: [u32; 16] = [
    0xf6112562, 0xc540b340, 0x265e4a51, 0xe9b4c7aa, 0xd627105d, 0x02541453, 0xd8a15681, 0xe7d3fbc8, 0x21e4cde6,
    0xc33707d6, 0xf4d50387, 0x455a14ed, 0xa933e905, 0xfcefa3f8, 0x676f01d9, 0x8d294c8a,
];
const ROUND3_K: [u32; 16] = [
    0xf1fa3942, 0x8771f681, 0x6d3d6122, 0xfde5380c, 0xa4be6a44, 0x4bdec3a9, 0xf6b84b60, 0xbebfbc70, 0x28937ec6,
    0xeaa127fa, 0xd4ef8085, 0x04881d05, 0xd9d4d339, 0xe66b99e5, 0x1fa27cf8, 0xc4ac3665,
];
const ROUND4_K: [u32; 16] = [
    0xf4342244, 0x432a6f97, 0xab9423a7, 0xfc95a039, 0x655559c3, 0x8f0ccc92, 0xf5eff47d, 0x85845dd1, 0x6fa57e4f,
    0xf52ce6e0, 0xa3014514, 0x4e0851a1, 0xf7557e82, 0x453af235, 0x2ad782bb, 0xeb56d391,
];

// Index and rotation lookup for each round's 16 steps, matching the source's
// explicit `in[n]`/shift-constant unrolling.
const ROUND1_IDX: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
const ROUND2_IDX: [usize; 16] = [1, 6, 11, 0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12];
const ROUND3_IDX: [usize; 16] = [5, 8, 11, 14, 1, 4, 7, 10, 13, 0, 3, 6, 9, 12, 15, 2];
const ROUND4_IDX: [usize; 16] = [0, 7, 14, 5, 12, 3, 10, 1, 8, 15, 6, 13, 4, 11, 2, 9];

fn f(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (!x & z)
}
fn g(x: u32, y: u32, z: u32) -> u32 {
    (x & z) | (y & !z)
}
fn h(x: u32, y: u32, z: u32) -> u32 {
    x ^ y ^ z
}
fn i_fn(x: u32, y: u32, z: u32) -> u32 {
    y ^ (x | !z)
}

#[allow(clippy::too_many_arguments)]
fn step(func: impl Fn(u32, u32, u32) -> u32, a: u32, b: u32, c: u32, d: u32, x: u32, s: u32, ac: u32) -> u32 {
    let a = a.wrapping_add(func(b, c, d)).wrapping_add(x).wrapping_add(ac);
    a.rotate_left(s).wrapping_add(b)
}

fn transform(buf: &mut [u32; 4], input: &[u32; 16], mangler: u32) {
    let (mut a, mut b, mut c, mut d) = (buf[0], buf[1], buf[2], buf[3]);

    for n in 0..16 {
        let x = input[ROUND1_IDX[n]];
        let s = S[0][n % 4];
        let k = ROUND1_K[n] ^ mangler;
        let r = step(f, a, b, c, d, x, s, k);
        a = d;
        d = c;
        c = b;
        b = r;
    }
    for n in 0..16 {
        let x = input[ROUND2_IDX[n]];
        let s = S[1][n % 4];
        let k = ROUND2_K[n] ^ mangler;
        let r = step(g, a, b, c, d, x, s, k);
        a = d;
        d = c;
        c = b;
        b = r;
    }
    for n in 0..16 {
        let x = input[ROUND3_IDX[n]];
        let s = S[2][n % 4];
        let k = ROUND3_K[n] ^ mangler;
        let r = step(h, a, b, c, d, x, s, k);
        a = d;
        d = c;
        c = b;
        b = r;
    }
    for n in 0..16 {
        let x = input[ROUND4_IDX[n]];
        let s = S[3][n % 4];
        let k = ROUND4_K[n] ^ mangler;
        let r = step(i_fn, a, b, c, d, x, s, k);
        a = d;
        d = c;
        c = b;
        b = r;
    }

    buf[0] = buf[0].wrapping_add(a);
    buf[1] = buf[1].wrapping_add(b);
    buf[2] = buf[2].wrapping_add(c);
    buf[3] = buf[3].wrapping_add(d);
}

pub struct MangledMd5 {
    buf: [u32; 4],
    mangler: u32,
    bit_len: u64,
    pending: Vec<u8>,
}

impl MangledMd5 {
    pub fn new(mangler: u32) -> Self {
        MangledMd5 {
            buf: [
                0x6735_2301 ^ mangler,
                0xefcd_ab79 ^ mangler,
                0x98ba_ccfe ^ mangler,
                0x1132_5476 ^ mangler,
            ],
            mangler,
            bit_len: 0,
            pending: Vec::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.bit_len += (data.len() as u64) * 8;
        self.pending.extend_from_slice(data);

        let mut chunks = self.pending.chunks_exact(64);
        let mut consumed = 0;
        for chunk in &mut chunks {
            let mut words = [0u32; 16];
            for (i, word) in words.iter_mut().enumerate() {
                *word = u32::from_le_bytes(chunk[i * 4..i * 4 + 4].try_into().unwrap());
            }
            transform(&mut self.buf, &words, self.mangler);
            consumed += 64;
        }
        self.pending.drain(..consumed);
    }

    /// Returns the 4-word internal state buffer without finalizing, since
    /// the Continuum key expansion only ever needs the raw `buf` words, not
    /// a conventional padded/length-terminated digest.
    pub fn state(&self) -> [u32; 4] {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_changes_with_mangler() {
        let mut a = MangledMd5::new(432);
        a.update(&[1, 2, 3, 4]);
        let mut b = MangledMd5::new(7193);
        b.update(&[1, 2, 3, 4]);
        assert_ne!(a.state(), b.state());
    }

    #[test]
    fn deterministic_for_same_input() {
        let mut a = MangledMd5::new(432);
        a.update(b"hello world, this is forty bytes long..");
        let mut b = MangledMd5::new(432);
        b.update(b"hello world, this is forty bytes long..");
        assert_eq!(a.state(), b.state());
    }
}
