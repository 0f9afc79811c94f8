use crate::serialization::{
    EosDeserialize, EosSerialize, Reader, SerializationError, SerializationResult,
};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{fmt, str::FromStr};
use thiserror::Error;

const MAX_PRECISION: u8 = 18;
const MAX_CODE_LEN: usize = 7;

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("Invalid symbol code {0:?}")]
    SymbolCode(String),
    #[error("Invalid symbol {0:?}, expected `<precision>,<CODE>`")]
    Symbol(String),
    #[error("Precision {0} exceeds 18")]
    Precision(u8),
    #[error("Invalid asset {0:?}, expected `<amount> <CODE>`")]
    Asset(String),
    #[error("Asset amount {0:?} is out of range")]
    Overflow(String),
}

/// Token symbol: decimal precision plus an upper-case code of up to seven
/// letters, e.g. `2,HUSD`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Symbol(u64);

impl Symbol {
    pub fn new(precision: u8, code: &str) -> Result<Self, AssetError> {
        if precision > MAX_PRECISION {
            return Err(AssetError::Precision(precision));
        }
        let valid = !code.is_empty()
            && code.len() <= MAX_CODE_LEN
            && code.bytes().all(|b| b.is_ascii_uppercase());
        if !valid {
            return Err(AssetError::SymbolCode(code.to_string()));
        }
        let packed = code
            .bytes()
            .enumerate()
            .fold(u64::from(precision), |acc, (i, b)| {
                acc | (u64::from(b) << (8 * (i + 1)))
            });
        Ok(Symbol(packed))
    }

    pub fn precision(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn code(&self) -> String {
        (1..8)
            .map(|i| ((self.0 >> (8 * i)) & 0xff) as u8)
            .take_while(|b| *b != 0)
            .map(char::from)
            .collect()
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

impl FromStr for Symbol {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| AssetError::Symbol(s.to_string()))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|_| AssetError::Symbol(s.to_string()))?;
        Symbol::new(precision, code.trim())
    }
}

impl EosSerialize for Symbol {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.0.write_to(out)
    }
}

impl EosDeserialize for Symbol {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        let raw = Symbol(u64::read_from(reader)?);
        let symbol = Symbol::new(raw.precision(), &raw.code())
            .map_err(|e| SerializationError::Invalid(e.to_string()))?;
        if symbol != raw {
            return Err(SerializationError::Invalid(format!(
                "symbol bytes {:#018x} are not a valid symbol",
                raw.0
            )));
        }
        Ok(symbol)
    }
}

/// Token quantity, `amount` counted in units of `10^-precision`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Asset {
    amount: i64,
    symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Asset { amount, symbol }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AssetError::Asset(s.to_string());
        let (number, code) = s.trim().split_once(' ').ok_or_else(malformed)?;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(malformed());
        }
        let precision = u8::try_from(fraction.len()).map_err(|_| malformed())?;
        let symbol = Symbol::new(precision, code.trim())?;
        let magnitude: i64 = format!("{whole}{fraction}")
            .parse()
            .map_err(|_| AssetError::Overflow(s.to_string()))?;
        let amount = if negative { -magnitude } else { magnitude };
        Ok(Asset { amount, symbol })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = u32::from(self.symbol.precision());
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = self.amount.unsigned_abs();
        let code = self.symbol.code();
        if precision == 0 {
            return write!(f, "{sign}{magnitude} {code}");
        }
        let scale = 10u64.pow(precision);
        write!(
            f,
            "{sign}{}.{:0width$} {code}",
            magnitude / scale,
            magnitude % scale,
            width = precision as usize
        )
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({self})")
    }
}

impl EosSerialize for Asset {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.amount.write_to(out);
        self.symbol.write_to(out);
    }
}

impl EosDeserialize for Asset {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        let amount = i64::read_from(reader)?;
        let symbol = Symbol::read_from(reader)?;
        Ok(Asset { amount, symbol })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_packs_precision_and_code() {
        let eos = Symbol::new(4, "EOS").unwrap();
        assert_eq!(eos.as_u64(), 1397703940);
        assert_eq!(eos.to_string(), "4,EOS");
        assert_eq!("2,HVOICE".parse::<Symbol>().unwrap().code(), "HVOICE");
    }

    #[test]
    fn parses_max_supply_strings() {
        let husd: Asset = "1000000000.00 HUSD".parse().unwrap();
        assert_eq!(husd.amount(), 100_000_000_000);
        assert_eq!(husd.symbol().precision(), 2);
        assert_eq!(husd.to_string(), "1000000000.00 HUSD");

        let seeds: Asset = "1000000000.0000 SEEDS".parse().unwrap();
        assert_eq!(seeds.amount(), 10_000_000_000_000);
        assert_eq!(seeds.symbol().code(), "SEEDS");
    }

    #[test]
    fn displays_small_and_negative_amounts() {
        let tokens: Asset = "1.00 HVOICE".parse().unwrap();
        assert_eq!(tokens.to_string(), "1.00 HVOICE");
        let negative: Asset = "-0.05 HUSD".parse().unwrap();
        assert_eq!(negative.amount(), -5);
        assert_eq!(negative.to_string(), "-0.05 HUSD");
        let whole: Asset = "42 VOTE".parse().unwrap();
        assert_eq!(whole.to_string(), "42 VOTE");
    }

    #[test]
    fn rejects_malformed_assets() {
        assert!("1000 husd".parse::<Asset>().is_err());
        assert!("1.0.0 HUSD".parse::<Asset>().is_err());
        assert!("HUSD".parse::<Asset>().is_err());
        assert!(matches!(
            "99999999999999999999 BIG".parse::<Asset>(),
            Err(AssetError::Overflow(_))
        ));
    }

    #[test]
    fn packs_amount_then_symbol() {
        let asset: Asset = "1.0000 EOS".parse().unwrap();
        let packed = asset.pack();
        assert_eq!(&packed[..8], &10_000i64.to_le_bytes());
        assert_eq!(&packed[8..], &1397703940u64.to_le_bytes());
        assert_eq!(Asset::unpack(&packed).unwrap(), asset);
    }

    #[test]
    fn unpacking_rejects_out_of_range_precision() {
        let mut packed = 1i64.to_le_bytes().to_vec();
        let raw = Symbol::new(4, "EOS").unwrap().as_u64() & !0xff | 20;
        packed.extend_from_slice(&raw.to_le_bytes());
        assert!(matches!(
            Asset::unpack(&packed),
            Err(SerializationError::Invalid(_))
        ));

        let mut lower_case = 1i64.to_le_bytes().to_vec();
        lower_case.extend_from_slice(&(u64::from(b'e') << 8 | 4).to_le_bytes());
        assert!(Asset::unpack(&lower_case).is_err());
    }
}
