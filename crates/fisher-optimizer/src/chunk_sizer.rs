//! Sub-linear chunk sizing.
//!
//! For a batch of `n` operations the working set is bounded by
//! `floor(sqrt(n)) * floor(log2(n))`, so peak buffer memory grows as
//! `O(sqrt(n) log n)` instead of `O(n)`.
//!
//! ```text
//! n        sqrt  log2  chunk
//! 100      10    6     60
//! 1_000    31    9     279
//! 10_000   100   13    1_300
//! ```

/// Integer square root by Newton iteration. `isqrt(n)^2 <= n < (isqrt(n)+1)^2`.
#[must_use]
pub fn isqrt(n: usize) -> usize {
    if n < 2 {
        return n;
    }
    // Start from a power of two that is guaranteed to be >= sqrt(n).
    let mut x: usize = 1 << (ilog2(n) / 2 + 1);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Integer base-2 logarithm: bit length minus one. `ilog2(0) == 0`.
#[must_use]
pub fn ilog2(n: usize) -> u32 {
    if n == 0 {
        return 0;
    }
    usize::BITS - 1 - n.leading_zeros()
}

/// Processing-unit size for a batch of `n` operations.
///
/// `n <= 1` returns `n`; otherwise `isqrt(n) * ilog2(n)`, which is at
/// least 1 and non-decreasing in `n`.
#[must_use]
pub fn chunk_size(n: usize) -> usize {
    if n <= 1 {
        return n;
    }
    isqrt(n).saturating_mul(ilog2(n) as usize)
}
