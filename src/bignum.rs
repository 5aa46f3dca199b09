//! Non-negative big integers and their fixed-width big-endian codec.
//!
//! The minimal encoding of zero is zero bytes: `byte_count() == 0`, `encode()`
//! yields an empty region and `encode_padded(n)` yields `n` zero bytes.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use rsa::BigUint;
use zeroize::{Zeroize, Zeroizing};

use crate::data::{Buffer, DataPointer};
use crate::error::{CryptoError, Result};
use crate::handle::{Handle, Resource};

/// A non-negative integer. Its limbs are wiped when it is freed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bignum(BigUint);

impl Bignum {
    pub fn zero() -> Self {
        Bignum(BigUint::from(0u64))
    }

    /// Interprets `bytes` as an unsigned big-endian integer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Bignum(BigUint::from_bytes_be(bytes))
    }

    pub fn from_word(word: u64) -> Self {
        Bignum(BigUint::from(word))
    }

    /// The shared constant one.
    pub fn one() -> &'static Bignum {
        static ONE: OnceLock<Bignum> = OnceLock::new();
        ONE.get_or_init(|| Bignum::from_word(1))
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.bits() == 0
    }

    pub fn is_one(&self) -> bool {
        self == Bignum::one()
    }

    pub fn bit_count(&self) -> usize {
        self.0.bits()
    }

    pub fn byte_count(&self) -> usize {
        self.bit_count().div_ceil(8)
    }

    /// The value as a machine word, or `None` if it does not fit.
    pub fn word(&self) -> Option<u64> {
        if self.byte_count() > 8 {
            return None;
        }
        let bytes = self.minimal_bytes();
        Some(
            bytes
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
        )
    }

    /// Minimal big-endian encoding.
    pub fn encode(&self) -> DataPointer {
        DataPointer::from_vec(self.minimal_bytes().to_vec())
    }

    /// Writes the minimal encoding to the front of `out` and returns its
    /// length.
    pub fn encode_into(&self, out: &mut [u8]) -> Result<usize> {
        let bytes = self.minimal_bytes();
        if out.len() < bytes.len() {
            return Err(CryptoError::BufferTooSmall {
                required: bytes.len(),
                available: out.len(),
            });
        }
        out[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    /// Exactly `width` big-endian bytes, zero-padded on the left. Fails rather
    /// than truncate when the value needs more than `width` bytes.
    pub fn encode_padded(&self, width: usize) -> Result<DataPointer> {
        let mut out = DataPointer::alloc(width);
        self.encode_padded_into(out.as_mut_slice(), width)?;
        Ok(out)
    }

    /// Writes exactly `width` bytes to the front of `out`. Nothing is written
    /// on failure.
    pub fn encode_padded_into(&self, out: &mut [u8], width: usize) -> Result<usize> {
        if out.len() < width {
            return Err(CryptoError::BufferTooSmall {
                required: width,
                available: out.len(),
            });
        }
        let bytes = self.minimal_bytes();
        if bytes.len() > width {
            return Err(CryptoError::BignumTooLong {
                required: bytes.len(),
                width,
            });
        }
        let pad = width - bytes.len();
        out[..pad].fill(0);
        out[pad..width].copy_from_slice(&bytes);
        Ok(width)
    }

    /// Uppercase hex, two digits per byte; zero renders as `"0"`.
    pub fn to_hex(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        self.minimal_bytes()
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect()
    }

    fn minimal_bytes(&self) -> Zeroizing<Vec<u8>> {
        if self.is_zero() {
            return Zeroizing::new(Vec::new());
        }
        Zeroizing::new(self.0.to_bytes_be())
    }
}

impl Drop for Bignum {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Resource for Bignum {
    const KIND: &'static str = "bignum";
}

impl fmt::Debug for Bignum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bignum")
            .field("bits", &self.bit_count())
            .finish()
    }
}

impl From<BigUint> for Bignum {
    fn from(value: BigUint) -> Self {
        Bignum(value)
    }
}

/// Owns one [`Bignum`], or nothing.
#[derive(Debug, Default)]
pub struct BignumPointer {
    bn: Handle<Bignum>,
}

impl BignumPointer {
    /// A pointer owning the value zero.
    pub fn new() -> Self {
        Self::from(Bignum::zero())
    }

    /// Same as [`BignumPointer::new`]; every bignum here is wiped on free.
    pub fn new_secure() -> Self {
        Self::new()
    }

    pub fn empty() -> Self {
        Self {
            bn: Handle::empty(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from(Bignum::from_bytes(bytes))
    }

    pub fn is_null(&self) -> bool {
        self.bn.is_null()
    }

    pub fn get(&self) -> Option<&Bignum> {
        self.bn.get()
    }

    pub fn reset(&mut self, bn: Option<Bignum>) {
        self.bn.reset(bn);
    }

    /// Replaces the value with `data` read as big-endian.
    pub fn reset_bytes(&mut self, data: Buffer<'_, u8>) {
        self.bn.reset(Some(Bignum::from_bytes(data.data())));
    }

    pub fn release(&mut self) -> Option<Bignum> {
        self.bn.release()
    }

    pub fn take(&mut self) -> BignumPointer {
        BignumPointer { bn: self.bn.take() }
    }

    pub fn is_zero(&self) -> bool {
        self.get().is_some_and(Bignum::is_zero)
    }

    pub fn is_one(&self) -> bool {
        self.get().is_some_and(Bignum::is_one)
    }

    pub fn set_word(&mut self, word: u64) -> Result<()> {
        if self.is_null() {
            return Err(CryptoError::EmptyHandle(Bignum::KIND));
        }
        self.bn.reset(Some(Bignum::from_word(word)));
        Ok(())
    }

    pub fn get_word(&self) -> Option<u64> {
        self.get().and_then(Bignum::word)
    }

    pub fn byte_length(&self) -> usize {
        self.get().map_or(0, Bignum::byte_count)
    }

    pub fn bit_length(&self) -> usize {
        self.get().map_or(0, Bignum::bit_count)
    }

    pub fn to_hex(&self) -> Result<DataPointer> {
        Ok(DataPointer::from(self.value()?.to_hex()))
    }

    pub fn encode(&self) -> Result<DataPointer> {
        Ok(self.value()?.encode())
    }

    pub fn encode_into(&self, out: &mut [u8]) -> Result<usize> {
        self.value()?.encode_into(out)
    }

    pub fn encode_padded(&self, width: usize) -> Result<DataPointer> {
        self.value()?.encode_padded(width)
    }

    pub fn encode_padded_into(&self, out: &mut [u8], width: usize) -> Result<usize> {
        self.value()?.encode_padded_into(out, width)
    }

    fn value(&self) -> Result<&Bignum> {
        self.get().ok_or(CryptoError::EmptyHandle(Bignum::KIND))
    }
}

impl From<Bignum> for BignumPointer {
    fn from(bn: Bignum) -> Self {
        Self { bn: Handle::new(bn) }
    }
}

impl PartialEq for BignumPointer {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for BignumPointer {}

impl PartialOrd for BignumPointer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An empty pointer orders before every value.
impl Ord for BignumPointer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.get().cmp(&other.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_has_no_bytes() {
        let zero = BignumPointer::new();
        assert!(zero.is_zero());
        assert_eq!(zero.byte_length(), 0);
        assert!(zero.encode().unwrap().is_empty());
        assert_eq!(zero.encode_padded(4).unwrap().as_slice(), &[0, 0, 0, 0]);
        assert_eq!(zero.to_hex().unwrap().as_slice(), b"0");
    }

    #[test]
    fn padded_encoding() {
        let bn = BignumPointer::from_bytes(&[0x01, 0x02]);
        assert_eq!(bn.encode_padded(4).unwrap().as_slice(), &[0, 0, 1, 2]);
        assert_eq!(
            bn.encode_padded(1).unwrap_err(),
            CryptoError::BignumTooLong {
                required: 2,
                width: 1
            }
        );
    }

    #[test]
    fn padded_into_leaves_buffer_on_failure() {
        let bn = BignumPointer::from_bytes(&[0xAB, 0xCD, 0xEF]);
        let mut out = [0x55u8; 4];
        assert!(bn.encode_padded_into(&mut out, 2).is_err());
        assert_eq!(out, [0x55; 4]);
        assert_eq!(
            bn.encode_padded_into(&mut out[..2], 3).unwrap_err(),
            CryptoError::BufferTooSmall {
                required: 3,
                available: 2
            }
        );
        assert_eq!(bn.encode_padded_into(&mut out, 4).unwrap(), 4);
        assert_eq!(out, [0x00, 0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn words() {
        let mut bn = BignumPointer::new();
        bn.set_word(0x0102).unwrap();
        assert_eq!(bn.get_word(), Some(0x0102));
        assert_eq!(bn.byte_length(), 2);
        assert_eq!(bn.bit_length(), 9);
        assert_eq!(bn.to_hex().unwrap().as_slice(), b"0102");
        let big = BignumPointer::from_bytes(&[1; 9]);
        assert_eq!(big.get_word(), None);
        let mut empty = BignumPointer::empty();
        assert_eq!(
            empty.set_word(1).unwrap_err(),
            CryptoError::EmptyHandle("bignum")
        );
    }

    #[test]
    fn one_is_one() {
        assert!(Bignum::one().is_one());
        assert!(BignumPointer::from_bytes(&[0, 0, 1]).is_one());
        assert!(!BignumPointer::empty().is_one());
    }

    #[test]
    fn empty_orders_first() {
        let empty = BignumPointer::empty();
        let zero = BignumPointer::new();
        let two = BignumPointer::from_bytes(&[2]);
        assert!(empty < zero);
        assert!(zero < two);
        assert_eq!(BignumPointer::from_bytes(&[0, 2]), two);
    }
}
