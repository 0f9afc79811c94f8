use crate::serialization::{EosDeserialize, EosSerialize, Reader, SerializationResult};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{fmt, str::FromStr};
use thiserror::Error;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";
const MAX_LEN: usize = 13;

/// EOSIO account, action, permission or table name: up to 13 characters
/// from `.12345a-z` packed into a `u64`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(SerializeDisplay, DeserializeFromStr)]
pub struct Name(u64);

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Name {0:?} is longer than 13 characters")]
    TooLong(String),
    #[error("Name {name:?} contains invalid character {ch:?}")]
    InvalidChar { name: String, ch: char },
    #[error("Name {0:?} is not in normalized form")]
    NotNormalized(String),
}

const fn char_to_symbol(c: u8) -> u64 {
    match c {
        b'a'..=b'z' => (c - b'a') as u64 + 6,
        b'1'..=b'5' => (c - b'1') as u64 + 1,
        _ => 0,
    }
}

const fn is_valid_char(c: u8) -> bool {
    matches!(c, b'a'..=b'z' | b'1'..=b'5' | b'.')
}

const fn encode(bytes: &[u8]) -> u64 {
    let mut value = 0u64;
    let mut i = 0;
    while i < MAX_LEN {
        let mut c = if i < bytes.len() {
            char_to_symbol(bytes[i])
        } else {
            0
        };
        if i < 12 {
            c &= 0x1f;
            c <<= 64 - 5 * (i + 1);
        } else {
            c &= 0x0f;
        }
        value |= c;
        i += 1;
    }
    value
}

impl Name {
    pub const EOSIO: Name = Name::constant("eosio");
    pub const ACTIVE: Name = Name::constant("active");
    pub const OWNER: Name = Name::constant("owner");
    pub const EOSIO_CODE: Name = Name::constant("eosio.code");

    /// Compile-time name. Panics on characters outside `.12345a-z` or more
    /// than 13 characters, so only use it with literals.
    pub const fn constant(s: &str) -> Name {
        let bytes = s.as_bytes();
        assert!(bytes.len() <= MAX_LEN, "name too long");
        let mut i = 0;
        while i < bytes.len() {
            assert!(is_valid_char(bytes[i]), "invalid name character");
            i += 1;
        }
        Name(encode(bytes))
    }

    pub const fn from_u64(value: u64) -> Name {
        Name(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_LEN {
            return Err(NameError::TooLong(s.to_string()));
        }
        if let Some(ch) = s.chars().find(|c| !c.is_ascii() || !is_valid_char(*c as u8)) {
            return Err(NameError::InvalidChar {
                name: s.to_string(),
                ch,
            });
        }
        let name = Name(encode(bytes));
        // The 13th character only has 4 bits, and trailing dots vanish
        if name.to_string() != s {
            return Err(NameError::NotNormalized(s.to_string()));
        }
        Ok(name)
    }
}

impl TryFrom<&str> for Name {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; MAX_LEN];
        let mut tmp = self.0;
        for i in 0..MAX_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            chars[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let end = chars
            .iter()
            .rposition(|c| *c != b'.')
            .map(|pos| pos + 1)
            .unwrap_or(0);
        // CHARMAP is ASCII
        f.write_str(std::str::from_utf8(&chars[..end]).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

impl EosSerialize for Name {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.0.write_to(out)
    }
}

impl EosDeserialize for Name {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        Ok(Name(u64::read_from(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_names() {
        assert_eq!(Name::EOSIO.as_u64(), 6138663577826885632);
        let token: Name = "eosio.token".parse().unwrap();
        assert_eq!(token.as_u64(), 6138663591592764928);
        assert_eq!(Name::ACTIVE.as_u64(), 3617214756542218240);
    }

    #[test]
    fn displays_without_trailing_dots() {
        let dao: Name = "dao.hypha".parse().unwrap();
        assert_eq!(dao.to_string(), "dao.hypha");
        assert_eq!(Name::from_u64(5307499834573324288), dao);
        assert_eq!(Name::default().to_string(), "");
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(matches!(
            "Accounting".parse::<Name>(),
            Err(NameError::InvalidChar { ch: 'A', .. })
        ));
        assert!(matches!(
            "waytoolongname1".parse::<Name>(),
            Err(NameError::TooLong(_))
        ));
        assert!(matches!(
            "trailing.".parse::<Name>(),
            Err(NameError::NotNormalized(_))
        ));
        // 13th character must be one of .12345abcdefghij
        assert!(matches!(
            "aaaaaaaaaaaaz".parse::<Name>(),
            Err(NameError::NotNormalized(_))
        ));
    }

    #[test]
    fn orders_by_numeric_value() {
        let bank: Name = "bank.hypha".parse().unwrap();
        let dao: Name = "dao.hypha".parse().unwrap();
        assert!(bank < dao);
    }

    #[test]
    fn serializes_as_json_string() {
        let json = serde_json::to_string(&Name::EOSIO_CODE).unwrap();
        assert_eq!(json, "\"eosio.code\"");
        let back: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Name::EOSIO_CODE);
    }
}
