//! `pclmulqdq`-accelerated multiplier for modern x86/x86_64 CPUs.
//!
//! GHASH's field and POLYVAL's field (RFC 8452) use mutually reversed
//! polynomials; the product in one is the byte-reversed product in the
//! other after multiplying the key by `x`. The fast path exploits this:
//! the key schedule maps `H` into the POLYVAL domain once, and each
//! multiplication byte-reverses the operand in, performs a Karatsuba
//! carry-less multiply with Montgomery reduction, and byte-reverses the
//! result back out.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::Block;
use core::ptr;
use zeroize::Zeroize;

/// Carry-less multiplier holding the POLYVAL-domain image of `H`.
pub(crate) struct Clmul {
    h: Block,
}

impl Clmul {
    /// Map `H` into the POLYVAL domain (`mulx(reverse(H))`) and store it.
    ///
    /// Callers must only construct this when `pclmulqdq` is available.
    pub(crate) fn new(h: &Block) -> Self {
        let mut hr = *h;
        hr.reverse();
        let mapped = mulx(&hr);
        hr.zeroize();
        Self { h: mapped }
    }

    /// Multiply `x` by `H` in place.
    #[inline]
    pub(crate) fn mul(&self, x: &mut Block) {
        x.reverse();
        // SAFETY: `Clmul` values are only created after runtime detection
        // of the `pclmulqdq` feature.
        unsafe { self.polymul_block(x) };
        x.reverse();
    }

    #[target_feature(enable = "sse2,pclmulqdq")]
    unsafe fn polymul_block(&self, x: &mut Block) {
        // `_mm_loadu_si128`/`_mm_storeu_si128` perform unaligned accesses
        let h = _mm_loadu_si128(self.h.as_ptr().cast());
        let xv = _mm_loadu_si128(x.as_ptr().cast());
        let product = polymul(xv, h);
        _mm_storeu_si128(x.as_mut_ptr().cast(), product);
    }
}

impl Zeroize for Clmul {
    fn zeroize(&mut self) {
        self.h.zeroize();
    }
}

/// Multiply a POLYVAL field element by `x`.
fn mulx(block: &Block) -> Block {
    let mut v = u128::from_le_bytes(*block);
    let v_hi = v >> 127;

    v <<= 1;
    v ^= v_hi ^ (v_hi << 127) ^ (v_hi << 126) ^ (v_hi << 121);
    v.to_le_bytes()
}

#[inline]
#[target_feature(enable = "sse2,pclmulqdq")]
unsafe fn polymul(x: __m128i, y: __m128i) -> __m128i {
    let (h, m, l) = karatsuba1(x, y);
    let (h, l) = karatsuba2(h, m, l);
    mont_reduce(h, l)
}

/// Karatsuba decomposition for `x*y`.
#[inline]
#[target_feature(enable = "sse2,pclmulqdq")]
unsafe fn karatsuba1(x: __m128i, y: __m128i) -> (__m128i, __m128i, __m128i) {
    // First Karatsuba step: decompose x and y.
    //
    // (x1*y0 + x0*y1) = (x1+x0) * (y1+y0) + (x1*y1) + (x0*y0)
    //        M                                 H         L
    //
    // m = x.hi^x.lo * y.hi^y.lo
    let m = pmull(
        _mm_xor_si128(x, _mm_shuffle_epi32(x, 0xee)),
        _mm_xor_si128(y, _mm_shuffle_epi32(y, 0xee)),
    );
    let h = pmull2(y, x); // h = x.hi * y.hi
    let l = pmull(y, x); // l = x.lo * y.lo
    (h, m, l)
}

/// Karatsuba combine.
#[inline]
#[target_feature(enable = "sse2,pclmulqdq")]
unsafe fn karatsuba2(h: __m128i, m: __m128i, l: __m128i) -> (__m128i, __m128i) {
    // Second Karatsuba step: combine into a 2n-bit product.
    //
    // m0 ^= l0 ^ h0 // = m0^(l0^h0)
    // m1 ^= l1 ^ h1 // = m1^(l1^h1)
    // l1 ^= m0      // = l1^(m0^l0^h0)
    // h0 ^= l0 ^ m1 // = h0^(l0^m1^l1^h1)
    // h1 ^= l1      // = h1^(l1^m0^l0^h0)
    let t = {
        //   {m0, m1} ^ {l1, h0}
        // = {m0^l1, m1^h0}
        let t0 = _mm_xor_si128(
            m,
            _mm_castps_si128(_mm_shuffle_ps(
                _mm_castsi128_ps(l),
                _mm_castsi128_ps(h),
                0x4e,
            )),
        );

        //   {h0, h1} ^ {l0, l1}
        // = {h0^l0, h1^l1}
        let t1 = _mm_xor_si128(h, l);

        //   {m0^l1, m1^h0} ^ {h0^l0, h1^l1}
        // = {m0^l1^h0^l0, m1^h0^h1^l1}
        _mm_xor_si128(t0, t1)
    };

    // {m0^l1^h0^l0, l0}
    let x01 = _mm_unpacklo_epi64(l, t);

    // {h1, m1^h0^h1^l1}
    let x23 = _mm_castps_si128(_mm_movehl_ps(_mm_castsi128_ps(h), _mm_castsi128_ps(t)));

    (x23, x01)
}

#[inline]
#[target_feature(enable = "sse2,pclmulqdq")]
unsafe fn mont_reduce(x23: __m128i, x01: __m128i) -> __m128i {
    // Perform the Montgomery reduction over the 256-bit X.
    //    [A1:A0] = X0 * poly
    //    [B1:B0] = [X0 ^ A1 : X1 ^ A0]
    //    [C1:C0] = B0 * poly
    //    [D1:D0] = [B0 ^ C1 : B1 ^ C0]
    // Output: [D1 ^ X3 : D0 ^ X2]
    static POLY: u128 = 1 << 127 | 1 << 126 | 1 << 121 | 1 << 63 | 1 << 62 | 1 << 57;
    let poly = _mm_loadu_si128(ptr::addr_of!(POLY).cast());
    let a = pmull(x01, poly);
    let b = _mm_xor_si128(x01, _mm_shuffle_epi32(a, 0x4e));
    let c = pmull2(b, poly);
    _mm_xor_si128(x23, _mm_xor_si128(c, b))
}

/// Multiplies the low bits in `a` and `b`.
#[inline]
#[target_feature(enable = "sse2,pclmulqdq")]
unsafe fn pmull(a: __m128i, b: __m128i) -> __m128i {
    _mm_clmulepi64_si128(a, b, 0x00)
}

/// Multiplies the high bits in `a` and `b`.
#[inline]
#[target_feature(enable = "sse2,pclmulqdq")]
unsafe fn pmull2(a: __m128i, b: __m128i) -> __m128i {
    _mm_clmulepi64_si128(a, b, 0x11)
}
