//! Resource quantity parsing and comparison.
//!
//! # Purpose
//! Implements the string-form quantity semantics the resource-minimum rules
//! compare against ("600m", "512M", "1Gi"). Values normalize to milli-units
//! so comparison is a plain integer ordering.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quantity '{0}'")]
pub struct QuantityParseError(pub String);

/// A parsed quantity, normalized to thousandths of the base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity {
    millis: i128,
}

impl Quantity {
    pub fn parse(input: &str) -> Result<Self, QuantityParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(QuantityParseError(input.to_string()));
        }

        let split = trimmed
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(trimmed.len());
        let (mantissa, suffix) = trimmed.split_at(split);
        let factor = suffix_factor(suffix).ok_or_else(|| QuantityParseError(input.to_string()))?;

        let (integer, fraction) = match mantissa.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (mantissa, ""),
        };
        if integer.is_empty() && fraction.is_empty() {
            return Err(QuantityParseError(input.to_string()));
        }

        let mut millis: i128 = 0;
        if !integer.is_empty() {
            let value: i128 = integer
                .parse()
                .map_err(|_| QuantityParseError(input.to_string()))?;
            millis = value
                .checked_mul(factor)
                .ok_or_else(|| QuantityParseError(input.to_string()))?;
        }
        if !fraction.is_empty() {
            let digits: i128 = fraction
                .parse()
                .map_err(|_| QuantityParseError(input.to_string()))?;
            let scale = 10_i128
                .checked_pow(fraction.len() as u32)
                .ok_or_else(|| QuantityParseError(input.to_string()))?;
            let scaled = digits
                .checked_mul(factor)
                .ok_or_else(|| QuantityParseError(input.to_string()))?;
            if scaled % scale != 0 {
                // Finer than a milli-unit cannot be represented.
                return Err(QuantityParseError(input.to_string()));
            }
            millis += scaled / scale;
        }

        Ok(Self { millis })
    }
}

fn suffix_factor(suffix: &str) -> Option<i128> {
    const KIB: i128 = 1024;
    Some(match suffix {
        "m" => 1,
        "" => 1_000,
        "k" => 1_000_000,
        "M" => 1_000_000_000,
        "G" => 1_000_000_000_000,
        "T" => 1_000_000_000_000_000,
        "P" => 1_000_000_000_000_000_000,
        "Ki" => KIB * 1_000,
        "Mi" => KIB * KIB * 1_000,
        "Gi" => KIB * KIB * KIB * 1_000,
        "Ti" => KIB * KIB * KIB * KIB * 1_000,
        "Pi" => KIB * KIB * KIB * KIB * KIB * 1_000,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantity(input: &str) -> Quantity {
        Quantity::parse(input).unwrap_or_else(|err| panic!("parse {input}: {err}"))
    }

    #[test]
    fn milli_and_base_units_order() {
        assert!(quantity("600m") < quantity("1"));
        assert!(quantity("999m") < quantity("1"));
        assert_eq!(quantity("1000m"), quantity("1"));
        assert!(quantity("2") > quantity("1500m"));
    }

    #[test]
    fn decimal_and_binary_suffixes() {
        assert!(quantity("512M") < quantity("1G"));
        assert!(quantity("1Gi") > quantity("1G"));
        assert_eq!(quantity("1Ki"), quantity("1024"));
        assert_eq!(quantity("0.5G"), quantity("500M"));
        assert_eq!(quantity("1.5"), quantity("1500m"));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        for input in ["", "  ", "1X", "G", "1.2.3", "0.0001m", "--1"] {
            assert!(Quantity::parse(input).is_err(), "{input} should fail");
        }
    }
}
