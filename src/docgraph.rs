//! Document graph records stored by the DAO and accounting contracts.
//!
//! A document is a list of content groups, each an ordered list of labelled
//! values. Values are a tagged union whose JSON form is `["<type>", value]`.

use serde::{de, ser::SerializeTuple, Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use thiserror::Error;

use crate::{
    api::Api,
    asset::Asset,
    chain_client::{ChainClient, TableRowsRequest},
    error::Result,
    name::Name,
    primitives::{Checksum256, TimePoint},
    serialization::{
        eos_struct_codec, write_varuint32, EosDeserialize, EosSerialize, Reader,
        SerializationError, SerializationResult,
    },
};


const DOCUMENTS_TABLE: Name = Name::constant("documents");

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("No content labelled {0:?}")]
    NotFound(String),
    #[error("Content {label:?} holds a {found}, expected a {expected}")]
    WrongType {
        label: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Contract {0} has no documents")]
    NoDocuments(Name),
    #[error("Malformed document row: {0}")]
    Malformed(String),
}

/// Value half of a [`Content`] item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentValue {
    /// Empty value, written as `["monostate", 0]`.
    Monostate,
    Name(Name),
    String(String),
    Asset(Asset),
    TimePoint(TimePoint),
    Int64(i64),
    Checksum256(Checksum256),
}

impl ContentValue {
    /// ABI type name, also the tag of the JSON form
    pub fn type_name(&self) -> &'static str {
        match self {
            ContentValue::Monostate => "monostate",
            ContentValue::Name(_) => "name",
            ContentValue::String(_) => "string",
            ContentValue::Asset(_) => "asset",
            ContentValue::TimePoint(_) => "time_point",
            ContentValue::Int64(_) => "int64",
            ContentValue::Checksum256(_) => "checksum256",
        }
    }

    fn index(&self) -> u32 {
        match self {
            ContentValue::Monostate => 0,
            ContentValue::Name(_) => 1,
            ContentValue::String(_) => 2,
            ContentValue::Asset(_) => 3,
            ContentValue::TimePoint(_) => 4,
            ContentValue::Int64(_) => 5,
            ContentValue::Checksum256(_) => 6,
        }
    }

    pub fn as_name(&self) -> Option<Name> {
        match self {
            ContentValue::Name(name) => Some(*name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContentValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int64(&self) -> Option<i64> {
        match self {
            ContentValue::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

impl EosSerialize for ContentValue {
    fn write_to(&self, out: &mut Vec<u8>) {
        write_varuint32(out, self.index());
        match self {
            ContentValue::Monostate => {}
            ContentValue::Name(v) => v.write_to(out),
            ContentValue::String(v) => v.write_to(out),
            ContentValue::Asset(v) => v.write_to(out),
            ContentValue::TimePoint(v) => v.write_to(out),
            ContentValue::Int64(v) => v.write_to(out),
            ContentValue::Checksum256(v) => v.write_to(out),
        }
    }
}

impl EosDeserialize for ContentValue {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        Ok(match reader.read_varuint32()? {
            0 => ContentValue::Monostate,
            1 => ContentValue::Name(Name::read_from(reader)?),
            2 => ContentValue::String(String::read_from(reader)?),
            3 => ContentValue::Asset(Asset::read_from(reader)?),
            4 => ContentValue::TimePoint(TimePoint::read_from(reader)?),
            5 => ContentValue::Int64(i64::read_from(reader)?),
            6 => ContentValue::Checksum256(Checksum256::read_from(reader)?),
            index => {
                return Err(SerializationError::UnknownVariant {
                    type_name: "content_value",
                    index,
                })
            }
        })
    }
}

impl Serialize for ContentValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(self.type_name())?;
        match self {
            ContentValue::Monostate => tuple.serialize_element(&0u8)?,
            ContentValue::Name(v) => tuple.serialize_element(v)?,
            ContentValue::String(v) => tuple.serialize_element(v)?,
            ContentValue::Asset(v) => tuple.serialize_element(v)?,
            ContentValue::TimePoint(v) => tuple.serialize_element(v)?,
            ContentValue::Int64(v) => tuple.serialize_element(v)?,
            ContentValue::Checksum256(v) => tuple.serialize_element(v)?,
        }
        tuple.end()
    }
}

fn from_json<T, E>(value: serde_json::Value) -> Result<T, E>
where
    T: de::DeserializeOwned,
    E: de::Error,
{
    serde_json::from_value(value).map_err(E::custom)
}

impl<'de> Deserialize<'de> for ContentValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (tag, value) = <(String, serde_json::Value)>::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "monostate" => ContentValue::Monostate,
            "name" => ContentValue::Name(from_json(value)?),
            "string" => ContentValue::String(from_json(value)?),
            "asset" => ContentValue::Asset(from_json(value)?),
            "time_point" => ContentValue::TimePoint(from_json(value)?),
            // nodeos renders large 64-bit integers as strings
            "int64" => ContentValue::Int64(match value {
                serde_json::Value::String(s) => s.parse().map_err(de::Error::custom)?,
                other => from_json(other)?,
            }),
            "checksum256" => ContentValue::Checksum256(from_json(value)?),
            other => {
                return Err(de::Error::unknown_variant(
                    other,
                    &[
                        "monostate",
                        "name",
                        "string",
                        "asset",
                        "time_point",
                        "int64",
                        "checksum256",
                    ],
                ))
            }
        })
    }
}

impl From<Name> for ContentValue {
    fn from(value: Name) -> Self {
        ContentValue::Name(value)
    }
}

impl From<&str> for ContentValue {
    fn from(value: &str) -> Self {
        ContentValue::String(value.to_string())
    }
}

impl From<String> for ContentValue {
    fn from(value: String) -> Self {
        ContentValue::String(value)
    }
}

impl From<Asset> for ContentValue {
    fn from(value: Asset) -> Self {
        ContentValue::Asset(value)
    }
}

impl From<TimePoint> for ContentValue {
    fn from(value: TimePoint) -> Self {
        ContentValue::TimePoint(value)
    }
}

impl From<i64> for ContentValue {
    fn from(value: i64) -> Self {
        ContentValue::Int64(value)
    }
}

impl From<Checksum256> for ContentValue {
    fn from(value: Checksum256) -> Self {
        ContentValue::Checksum256(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub label: String,
    pub value: ContentValue,
}

eos_struct_codec!(Content { label, value });

impl Content {
    pub fn new(label: &str, value: impl Into<ContentValue>) -> Self {
        Content {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// Ordered list of labelled values. No structure is enforced locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentGroup(pub Vec<Content>);

impl ContentGroup {
    pub fn new() -> Self {
        ContentGroup::default()
    }

    pub fn with(mut self, label: &str, value: impl Into<ContentValue>) -> Self {
        self.0.push(Content::new(label, value));
        self
    }

    pub fn get(&self, label: &str) -> Option<&ContentValue> {
        self.0
            .iter()
            .find(|content| content.label == label)
            .map(|content| &content.value)
    }
}

impl EosSerialize for ContentGroup {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.0.write_to(out)
    }
}

impl EosDeserialize for ContentGroup {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        Ok(ContentGroup(Vec::read_from(reader)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub certifier: Name,
    #[serde(default)]
    pub notes: String,
    pub certification_date: TimePoint,
}

/// Row of a contract's `documents` table.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: u64,
    pub hash: Checksum256,
    pub creator: Name,
    pub content_groups: Vec<ContentGroup>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    pub created_date: TimePoint,
    #[serde(default)]
    pub contract: Name,
}

impl Document {
    /// First value labelled `label`, searching groups in order.
    pub fn get_content(&self, label: &str) -> Result<&ContentValue, ContentError> {
        self.content_groups
            .iter()
            .find_map(|group| group.get(label))
            .ok_or_else(|| ContentError::NotFound(label.to_string()))
    }

    pub fn get_name(&self, label: &str) -> Result<Name, ContentError> {
        let value = self.get_content(label)?;
        value.as_name().ok_or_else(|| ContentError::WrongType {
            label: label.to_string(),
            expected: "name",
            found: value.type_name(),
        })
    }
}

/// Most recently created document of `contract`.
pub async fn get_last_document<C: ChainClient>(api: &Api<C>, contract: Name) -> Result<Document> {
    let request = TableRowsRequest::new(contract, contract.to_string(), DOCUMENTS_TABLE)
        .reverse()
        .limit(1);
    let row = api
        .table_rows(&request)
        .await?
        .rows
        .into_iter()
        .next()
        .ok_or(ContentError::NoDocuments(contract))?;
    let document =
        serde_json::from_value(row).map_err(|e| ContentError::Malformed(e.to_string()))?;
    Ok(document)
}
