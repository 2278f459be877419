//! Canonical amount: a decimal string scaled by 10,000 into a fixed-point integer.
//!
//! `^\d+(\.\d{1,4})?$` is the authoritative validation regex (spec §3, §9);
//! all arithmetic happens on the scaled `u64`, never on floating point.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub const SCALE: u64 = 10_000;

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d{1,4})?$").unwrap());
static PURITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}\.\d$").unwrap());

/// A gram amount, stored internally as an integer scaled by [`SCALE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScaledAmount(pub u64);

#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    #[error("amount does not match ^\\d+(\\.\\d{{1,4}})?$: {0}")]
    InvalidFormat(String),
    #[error("amount overflowed scaled representation: {0}")]
    Overflow(String),
    #[error("purity does not match ^\\d{{3}}\\.\\d$: {0}")]
    InvalidPurity(String),
}

impl ScaledAmount {
    pub const ZERO: ScaledAmount = ScaledAmount(0);

    pub fn parse(s: &str) -> Result<Self, AmountError> {
        if !AMOUNT_RE.is_match(s) {
            return Err(AmountError::InvalidFormat(s.to_string()));
        }
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let mut frac = frac_part.to_string();
        while frac.len() < 4 {
            frac.push('0');
        }
        let int_val: u64 = int_part
            .parse()
            .map_err(|_| AmountError::Overflow(s.to_string()))?;
        let frac_val: u64 = frac
            .parse()
            .map_err(|_| AmountError::Overflow(s.to_string()))?;
        let scaled = int_val
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(frac_val))
            .ok_or_else(|| AmountError::Overflow(s.to_string()))?;
        Ok(ScaledAmount(scaled))
    }

    pub fn checked_add(self, other: ScaledAmount) -> Option<ScaledAmount> {
        self.0.checked_add(other.0).map(ScaledAmount)
    }

    pub fn checked_sub(self, other: ScaledAmount) -> Option<ScaledAmount> {
        self.0.checked_sub(other.0).map(ScaledAmount)
    }

    pub fn format(self) -> String {
        format!("{}.{:04}", self.0 / SCALE, self.0 % SCALE)
    }
}

impl fmt::Display for ScaledAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Validates and round-trips a purity string (`^\d{3}\.\d$`) into basis points.
pub fn purity_to_basis_points(purity: &str) -> Result<u32, AmountError> {
    if !PURITY_RE.is_match(purity) {
        return Err(AmountError::InvalidPurity(purity.to_string()));
    }
    let (int_part, frac_part) = purity.split_once('.').expect("regex guarantees a dot");
    let int_val: u32 = int_part.parse().expect("regex guarantees digits");
    let frac_val: u32 = frac_part.parse().expect("regex guarantees a digit");
    Ok(int_val * 10 + frac_val)
}

pub fn validate_purity(purity: &str) -> Result<(), AmountError> {
    purity_to_basis_points(purity).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_round_trip() {
        for s in ["1.2500", "3", "0.0001", "10000.9999", "7.5"] {
            let a = ScaledAmount::parse(s).unwrap();
            let formatted = a.format();
            let reparsed = ScaledAmount::parse(&formatted).unwrap();
            assert_eq!(a, reparsed);
        }
    }

    #[test]
    fn formats_pad_to_four_digits() {
        assert_eq!(ScaledAmount::parse("7.5").unwrap().format(), "7.5000");
        assert_eq!(ScaledAmount::parse("3").unwrap().format(), "3.0000");
    }

    #[test]
    fn rejects_bad_format() {
        assert!(ScaledAmount::parse("1.23456").is_err());
        assert!(ScaledAmount::parse("-1.0").is_err());
        assert!(ScaledAmount::parse("abc").is_err());
        assert!(ScaledAmount::parse(".5").is_err());
    }

    #[test]
    fn split_conserves_amount() {
        let parent = ScaledAmount::parse("3.0000").unwrap();
        let child = ScaledAmount::parse("1.2500").unwrap();
        let remainder = parent.checked_sub(child).unwrap();
        assert_eq!(remainder.format(), "1.7500");
        assert_eq!(remainder.checked_add(child).unwrap(), parent);
    }

    #[test]
    fn purity_basis_points() {
        assert_eq!(purity_to_basis_points("999.9").unwrap(), 9999);
        assert_eq!(purity_to_basis_points("916.0").unwrap(), 9160);
        assert!(purity_to_basis_points("99.9").is_err());
    }
}
