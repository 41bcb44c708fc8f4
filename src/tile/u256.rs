use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Shl, Shr};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Unsigned 256-bit integer as stored in one ledger slot.
///
/// Limbs are little-endian (`0` is the least significant 64 bits).  Only the
/// operations the tile codec and the ABI layer need are provided: bit-field
/// extraction, shifts, masks, decimal/hex parsing and formatting.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct U256([u64; 4]);

#[inline]
fn mask(width: u32) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

impl U256 {
    pub const ZERO: Self = Self([0; 4]);
    pub const MAX: Self = Self([u64::MAX; 4]);

    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0, 0])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    /// Interpret 32 big-endian bytes (one ABI word).
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, chunk) in bytes.chunks_exact(8).enumerate() {
            let mut b = [0u8; 8];
            b.copy_from_slice(chunk);
            limbs[3 - i] = u64::from_be_bytes(b);
        }
        Self(limbs)
    }

    /// Left-pads `slice` to 32 bytes.  Returns `None` when it is longer.
    pub fn from_be_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() > 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[32 - slice.len()..].copy_from_slice(slice);
        Some(Self::from_be_bytes(bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for i in 0..4 {
            out[i * 8..(i + 1) * 8].copy_from_slice(&self.0[3 - i].to_be_bytes());
        }
        out
    }

    /// Extract `width` (≤ 64) bits starting at bit `offset`.
    #[inline]
    pub fn bits(&self, offset: u32, width: u32) -> u64 {
        debug_assert!(width <= 64);
        (*self >> offset).0[0] & mask(width)
    }

    #[inline]
    pub fn bit(&self, n: u32) -> bool {
        self.bits(n, 1) == 1
    }

    /// Keep only the lowest `width` bits.
    pub fn low_bits(&self, width: u32) -> Self {
        let mut out = [0u64; 4];
        for (i, limb) in self.0.iter().enumerate() {
            let lo = i as u32 * 64;
            out[i] = if width >= lo + 64 {
                *limb
            } else if width > lo {
                limb & mask(width - lo)
            } else {
                0
            };
        }
        Self(out)
    }

    /// Returns a copy with bits `[offset, offset + width)` replaced by `value`.
    pub fn with_bits(self, offset: u32, width: u32, value: u64) -> Self {
        let field_mask = Self::from_u64(mask(width)) << offset;
        let field = Self::from_u64(value & mask(width)) << offset;
        (self & !field_mask) | field
    }

    /// Number of significant bits (0 for zero).
    pub fn bit_len(&self) -> u32 {
        for i in (0..4).rev() {
            if self.0[i] != 0 {
                return i as u32 * 64 + 64 - self.0[i].leading_zeros();
            }
        }
        0
    }

    pub fn to_u64(&self) -> Option<u64> {
        if self.0[1..] == [0; 3] { Some(self.0[0]) } else { None }
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        let mut out = [0u64; 4];
        let mut carry = false;
        for i in 0..4 {
            let (s, c1) = self.0[i].overflowing_add(rhs.0[i]);
            let (s, c2) = s.overflowing_add(carry as u64);
            out[i] = s;
            carry = c1 || c2;
        }
        if carry { None } else { Some(Self(out)) }
    }

    pub fn checked_mul_u64(self, rhs: u64) -> Option<Self> {
        let mut out = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let wide = self.0[i] as u128 * rhs as u128 + carry;
            out[i] = wide as u64;
            carry = wide >> 64;
        }
        if carry != 0 { None } else { Some(Self(out)) }
    }

    fn div_rem_u64(self, d: u64) -> (Self, u64) {
        let mut out = [0u64; 4];
        let mut rem = 0u128;
        for i in (0..4).rev() {
            let cur = (rem << 64) | self.0[i] as u128;
            out[i] = (cur / d as u128) as u64;
            rem = cur % d as u128;
        }
        (Self(out), rem as u64)
    }

    /// Parse `0x`-prefixed (or bare) hexadecimal.  `"0x"` alone is zero.
    pub fn from_hex_str(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s)
            .trim_start_matches('0');
        if digits.len() > 64 {
            return Err(Error::Decode(format!("hex value wider than 256 bits: {s}")));
        }
        let mut value = Self::ZERO;
        for ch in digits.chars() {
            let nibble = ch
                .to_digit(16)
                .ok_or_else(|| Error::Decode(format!("bad hex digit {ch:?} in {s}")))?;
            value = (value << 4) | Self::from_u64(nibble as u64);
        }
        Ok(value)
    }

    pub fn from_dec_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::Decode("empty decimal string".into()));
        }
        let mut value = Self::ZERO;
        for ch in s.chars() {
            let digit = ch
                .to_digit(10)
                .ok_or_else(|| Error::Decode(format!("bad decimal digit {ch:?} in {s}")))?;
            value = value
                .checked_mul_u64(10)
                .and_then(|v| v.checked_add(Self::from_u64(digit as u64)))
                .ok_or_else(|| Error::Decode(format!("decimal value wider than 256 bits: {s}")))?;
        }
        Ok(value)
    }

    /// JSON-RPC quantity encoding: `0x` + minimal hex, `0x0` for zero.
    pub fn to_quantity(&self) -> String {
        format!("{:#x}", self)
    }
}

impl FromStr for U256 {
    type Err = Error;

    /// `0x…` is hex, anything else decimal.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex_str(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl Shr<u32> for U256 {
    type Output = Self;

    fn shr(self, n: u32) -> Self {
        if n >= 256 {
            return Self::ZERO;
        }
        let limb = (n / 64) as usize;
        let bit = n % 64;
        let mut out = [0u64; 4];
        for i in 0..4 - limb {
            let mut v = self.0[i + limb] >> bit;
            if bit > 0 && i + limb + 1 < 4 {
                v |= self.0[i + limb + 1] << (64 - bit);
            }
            out[i] = v;
        }
        Self(out)
    }
}

impl Shl<u32> for U256 {
    type Output = Self;

    fn shl(self, n: u32) -> Self {
        if n >= 256 {
            return Self::ZERO;
        }
        let limb = (n / 64) as usize;
        let bit = n % 64;
        let mut out = [0u64; 4];
        for i in limb..4 {
            let mut v = self.0[i - limb] << bit;
            if bit > 0 && i > limb {
                v |= self.0[i - limb - 1] >> (64 - bit);
            }
            out[i] = v;
        }
        Self(out)
    }
}

impl BitOr for U256 {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] | rhs.0[i]))
    }
}

impl BitAnd for U256 {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] & rhs.0[i]))
    }
}

impl Not for U256 {
    type Output = Self;

    fn not(self) -> Self {
        Self(self.0.map(|l| !l))
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl fmt::LowerHex for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let top = (0..4).rev().find(|&i| self.0[i] != 0);
        let digits = match top {
            None => "0".to_string(),
            Some(top) => {
                let mut s = format!("{:x}", self.0[top]);
                for i in (0..top).rev() {
                    s.push_str(&format!("{:016x}", self.0[i]));
                }
                s
            }
        };
        f.pad_integral(true, "0x", &digits)
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const CHUNK: u64 = 10_000_000_000_000_000_000;
        if self.is_zero() {
            return f.pad_integral(true, "", "0");
        }
        let mut chunks = Vec::new();
        let mut rest = *self;
        while !rest.is_zero() {
            let (q, r) = rest.div_rem_u64(CHUNK);
            chunks.push(r);
            rest = q;
        }
        let mut s = String::new();
        for (i, chunk) in chunks.iter().rev().enumerate() {
            if i == 0 {
                s.push_str(&chunk.to_string());
            } else {
                s.push_str(&format!("{chunk:019}"));
            }
        }
        f.pad_integral(true, "", &s)
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({:#x})", self)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_cross_limb_boundaries() {
        let one = U256::from_u64(1);
        let v = one << 200;
        assert_eq!(v.bit_len(), 201);
        assert_eq!(v >> 200, one);
        assert_eq!((U256::from_u64(0xff) << 60).bits(60, 8), 0xff);
        assert_eq!(U256::MAX >> 256, U256::ZERO);
    }

    #[test]
    fn bits_extracts_fields_spanning_limbs() {
        // 0xabcd placed across the 64-bit limb boundary.
        let v = U256::ZERO.with_bits(56, 16, 0xabcd);
        assert_eq!(v.bits(56, 16), 0xabcd);
        assert_eq!(v.bits(0, 56), 0);
    }

    #[test]
    fn with_bits_replaces_only_its_field() {
        let v = U256::MAX.with_bits(100, 8, 0);
        assert_eq!(v.bits(100, 8), 0);
        assert_eq!(v.bits(92, 8), 0xff);
        assert_eq!(v.bits(108, 8), 0xff);
    }

    #[test]
    fn low_bits_masks_upper_limbs() {
        let v = U256::MAX.low_bits(160);
        assert_eq!(v.bit_len(), 160);
        assert_eq!(U256::MAX.low_bits(0), U256::ZERO);
        assert_eq!(U256::MAX.low_bits(256), U256::MAX);
    }

    #[test]
    fn hex_parse_and_format() {
        let v = U256::from_hex_str("0x00ff").unwrap();
        assert_eq!(v, U256::from_u64(255));
        assert_eq!(format!("{v:x}"), "ff");
        assert_eq!(format!("{v:#x}"), "0xff");
        assert_eq!(format!("{v:08x}"), "000000ff");
        assert_eq!(U256::ZERO.to_quantity(), "0x0");
        assert_eq!(U256::from_hex_str("0x").unwrap(), U256::ZERO);
    }

    #[test]
    fn hex_rejects_garbage_and_overflow() {
        assert!(U256::from_hex_str("0xzz").is_err());
        let too_long = format!("0x1{}", "0".repeat(64));
        assert!(U256::from_hex_str(&too_long).is_err());
    }

    #[test]
    fn decimal_parse_and_format() {
        let v: U256 = "1000000000000000".parse().unwrap();
        assert_eq!(v.to_u64(), Some(1_000_000_000_000_000));
        let big = (U256::from_u64(1) << 128).checked_add(U256::from_u64(7)).unwrap();
        assert_eq!(big.to_string(), "340282366920938463463374607431768211463");
        assert_eq!(big.to_string().parse::<U256>().unwrap(), big);
        assert_eq!(U256::ZERO.to_string(), "0");
    }

    #[test]
    fn decimal_overflow_is_an_error() {
        let max = U256::MAX.to_string();
        assert_eq!(max.parse::<U256>().unwrap(), U256::MAX);
        assert!(format!("{max}0").parse::<U256>().is_err());
        assert!("".parse::<U256>().is_err());
    }

    #[test]
    fn be_bytes_round_trip_positions() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        bytes[0] = 0x80;
        let v = U256::from_be_bytes(bytes);
        assert!(v.bit(0));
        assert!(v.bit(255));
        assert_eq!(v.to_be_bytes(), bytes);
        assert_eq!(U256::from_be_slice(&[1, 0]), Some(U256::from_u64(256)));
        assert_eq!(U256::from_be_slice(&[0u8; 33]), None);
    }

    #[test]
    fn checked_arithmetic_detects_overflow() {
        assert!(U256::MAX.checked_add(U256::from_u64(1)).is_none());
        assert!(U256::MAX.checked_mul_u64(2).is_none());
        assert_eq!(
            U256::from_be_slice(&[0xff; 16]).unwrap().checked_mul_u64(2).unwrap().bit_len(),
            129
        );
    }
}
