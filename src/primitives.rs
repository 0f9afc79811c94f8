use crate::serialization::{EosDeserialize, EosSerialize, Reader, SerializationResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use sha2::{Digest, Sha256};
use std::{fmt, ops::Add, str::FromStr, time::Duration};
use thiserror::Error;

const CHAIN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("Invalid checksum256 {0:?}")]
    Checksum(String),
    #[error("Invalid timestamp {0:?}")]
    Timestamp(String),
}

/// 32-byte digest, hex encoded in JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(SerializeDisplay, DeserializeFromStr)]
pub struct Checksum256([u8; 32]);

impl Checksum256 {
    pub fn new(bytes: [u8; 32]) -> Self {
        Checksum256(bytes)
    }

    pub fn hash(data: &[u8]) -> Self {
        Checksum256(Sha256::digest(data).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Checksum256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Checksum256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum256({self})")
    }
}

impl FromStr for Checksum256 {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| PrimitiveError::Checksum(s.to_string()))?;
        Ok(Checksum256(bytes))
    }
}

impl EosSerialize for Checksum256 {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0)
    }
}

impl EosDeserialize for Checksum256 {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        Ok(Checksum256(reader.read_array()?))
    }
}

fn parse_chain_time(s: &str) -> Result<DateTime<Utc>, PrimitiveError> {
    NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), CHAIN_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| PrimitiveError::Timestamp(s.to_string()))
}

/// Microseconds since the UNIX epoch. JSON form is `2020-01-01T00:00:00.000`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(SerializeDisplay, DeserializeFromStr)]
pub struct TimePoint(i64);

impl TimePoint {
    pub fn from_micros(micros: i64) -> Self {
        TimePoint(micros)
    }

    pub fn now() -> Self {
        TimePoint(Utc::now().timestamp_micros())
    }

    pub fn micros(&self) -> i64 {
        self.0
    }

    pub fn to_sec(self) -> TimePointSec {
        TimePointSec(self.0.div_euclid(1_000_000) as u32)
    }
}

impl Add<Duration> for TimePoint {
    type Output = TimePoint;

    fn add(self, rhs: Duration) -> TimePoint {
        TimePoint(self.0 + rhs.as_micros() as i64)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.div_euclid(1_000_000);
        let nanos = (self.0.rem_euclid(1_000_000) * 1_000) as u32;
        let time = DateTime::from_timestamp(secs, nanos).ok_or(fmt::Error)?;
        write!(f, "{}", time.format(CHAIN_TIME_FORMAT))
    }
}

impl fmt::Debug for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePoint({self})")
    }
}

impl FromStr for TimePoint {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TimePoint(parse_chain_time(s)?.timestamp_micros()))
    }
}

impl EosSerialize for TimePoint {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.0.write_to(out)
    }
}

impl EosDeserialize for TimePoint {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        Ok(TimePoint(i64::read_from(reader)?))
    }
}

/// Seconds since the UNIX epoch, used for transaction expiration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(SerializeDisplay, DeserializeFromStr)]
pub struct TimePointSec(u32);

impl TimePointSec {
    pub fn from_secs(secs: u32) -> Self {
        TimePointSec(secs)
    }

    pub fn secs(&self) -> u32 {
        self.0
    }
}

impl Add<Duration> for TimePointSec {
    type Output = TimePointSec;

    fn add(self, rhs: Duration) -> TimePointSec {
        TimePointSec(self.0.saturating_add(rhs.as_secs() as u32))
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = DateTime::from_timestamp(i64::from(self.0), 0).ok_or(fmt::Error)?;
        write!(f, "{}", time.format("%Y-%m-%dT%H:%M:%S"))
    }
}

impl fmt::Debug for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePointSec({self})")
    }
}

impl FromStr for TimePointSec {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs = parse_chain_time(s)?.timestamp();
        u32::try_from(secs)
            .map(TimePointSec)
            .map_err(|_| PrimitiveError::Timestamp(s.to_string()))
    }
}

impl EosSerialize for TimePointSec {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.0.write_to(out)
    }
}

impl EosDeserialize for TimePointSec {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        Ok(TimePointSec(u32::read_from(reader)?))
    }
}
