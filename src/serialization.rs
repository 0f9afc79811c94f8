//! Binary encoding used by EOSIO for action payloads and transactions.
//!
//! Integers are little endian, lengths and variant indexes are `varuint32`
//! and structs are the concatenation of their fields in declaration order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
mod tests;

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Unexpected end of input: needed {needed} more bytes")]
    UnexpectedEof { needed: usize },
    #[error("varuint32 does not fit in 32 bits")]
    VarUintOverflow,
    #[error("String is not valid UTF-8: {0}")]
    Utf8(String),
    #[error("Unknown variant index {index} for {type_name}")]
    UnknownVariant { type_name: &'static str, index: u32 },
    #[error("Invalid value: {0}")]
    Invalid(String),
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

#[allow(missing_docs)]
pub type SerializationResult<T> = Result<T, SerializationError>;

/// Types with an EOSIO binary representation.
pub trait EosSerialize {
    /// Append the packed form of `self` to `out`
    fn write_to(&self, out: &mut Vec<u8>);

    /// Packed form of `self`
    fn pack(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

/// Types that can be read back from their EOSIO binary representation.
pub trait EosDeserialize: Sized {
    /// Read one value, advancing the reader
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self>;

    /// Read exactly one value from `bytes`, rejecting leftovers
    fn unpack(bytes: &[u8]) -> SerializationResult<Self> {
        let mut reader = Reader::new(bytes);
        let value = Self::read_from(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

/// Cursor over a packed byte slice.
pub struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub fn take(&mut self, count: usize) -> SerializationResult<&'a [u8]> {
        if self.remaining() < count {
            return Err(SerializationError::UnexpectedEof {
                needed: count - self.remaining(),
            });
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> SerializationResult<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn read_varuint32(&mut self) -> SerializationResult<u32> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_array::<1>()?[0];
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 35 {
                return Err(SerializationError::VarUintOverflow);
            }
        }
        u32::try_from(value).map_err(|_| SerializationError::VarUintOverflow)
    }

    pub fn finish(&self) -> SerializationResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(SerializationError::TrailingBytes(n)),
        }
    }
}

pub fn write_varuint32(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

/// `varuint32` field, e.g. `delay_sec` in a transaction header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarUint32(pub u32);

impl EosSerialize for VarUint32 {
    fn write_to(&self, out: &mut Vec<u8>) {
        write_varuint32(out, self.0)
    }
}

impl EosDeserialize for VarUint32 {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        Ok(VarUint32(reader.read_varuint32()?))
    }
}

macro_rules! impl_int_codec {
    ($($ty:ty),*) => {
        $(
            impl EosSerialize for $ty {
                fn write_to(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }

            impl EosDeserialize for $ty {
                fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
                    Ok(<$ty>::from_le_bytes(reader.read_array()?))
                }
            }
        )*
    };
}

impl_int_codec!(u8, u16, u32, u64, i64);

impl EosSerialize for bool {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
}

impl EosDeserialize for bool {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        match u8::read_from(reader)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SerializationError::Invalid(format!("bool byte {other}"))),
        }
    }
}

impl EosSerialize for String {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.as_str().write_to(out)
    }
}

impl EosSerialize for str {
    fn write_to(&self, out: &mut Vec<u8>) {
        write_varuint32(out, self.len() as u32);
        out.extend_from_slice(self.as_bytes());
    }
}

impl EosDeserialize for String {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        let len = reader.read_varuint32()? as usize;
        let bytes = reader.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| SerializationError::Utf8(e.to_string()))
    }
}

impl<T: EosSerialize> EosSerialize for Vec<T> {
    fn write_to(&self, out: &mut Vec<u8>) {
        write_varuint32(out, self.len() as u32);
        for item in self {
            item.write_to(out);
        }
    }
}

impl<T: EosDeserialize> EosDeserialize for Vec<T> {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        let len = reader.read_varuint32()? as usize;
        // Each element takes at least one byte
        if len > reader.remaining() {
            return Err(SerializationError::UnexpectedEof {
                needed: len - reader.remaining(),
            });
        }
        (0..len).map(|_| T::read_from(reader)).collect()
    }
}

impl<T: EosSerialize> EosSerialize for Option<T> {
    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Some(value) => {
                out.push(1);
                value.write_to(out);
            }
            None => out.push(0),
        }
    }
}

impl<T: EosDeserialize> EosDeserialize for Option<T> {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        if bool::read_from(reader)? {
            Ok(Some(T::read_from(reader)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: EosSerialize + ?Sized> EosSerialize for &T {
    fn write_to(&self, out: &mut Vec<u8>) {
        (**self).write_to(out)
    }
}

/// Implements [`EosSerialize`] and [`EosDeserialize`] for a struct by packing
/// the listed fields in order.
macro_rules! eos_struct_codec {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::serialization::EosSerialize for $ty {
            fn write_to(&self, out: &mut Vec<u8>) {
                $( $crate::serialization::EosSerialize::write_to(&self.$field, out); )*
            }
        }

        impl $crate::serialization::EosDeserialize for $ty {
            fn read_from(
                reader: &mut $crate::serialization::Reader<'_>,
            ) -> $crate::serialization::SerializationResult<Self> {
                Ok($ty {
                    $( $field: $crate::serialization::EosDeserialize::read_from(reader)?, )*
                })
            }
        }
    };
}

pub(crate) use eos_struct_codec;
