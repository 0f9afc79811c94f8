//! Contract ABI definitions as found in `.abi` files, and their packed form
//! expected by `eosio::setabi`.

use crate::{
    name::Name,
    serialization::{eos_struct_codec, EosSerialize},
    transaction::TransactionExtension,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

eos_struct_codec!(TypeDef {
    new_type_name,
    type_name
});

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

eos_struct_codec!(FieldDef { name, type_name });

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

eos_struct_codec!(StructDef { name, base, fields });

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: Name,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

eos_struct_codec!(ActionDef {
    name,
    type_name,
    ricardian_contract
});

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableDef {
    pub name: Name,
    #[serde(default)]
    pub index_type: String,
    #[serde(default)]
    pub key_names: Vec<String>,
    #[serde(default)]
    pub key_types: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
}

eos_struct_codec!(TableDef {
    name,
    index_type,
    key_names,
    key_types,
    type_name
});

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClausePair {
    pub id: String,
    pub body: String,
}

eos_struct_codec!(ClausePair { id, body });

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error_code: u64,
    pub error_msg: String,
}

eos_struct_codec!(ErrorMessage {
    error_code,
    error_msg
});

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariantDef {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

eos_struct_codec!(VariantDef { name, types });

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionResultDef {
    pub name: Name,
    pub result_type: String,
}

eos_struct_codec!(ActionResultDef { name, result_type });

/// `abi_def` as produced by the contract toolchain. Missing sections
/// default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiDef {
    pub version: String,
    pub types: Vec<TypeDef>,
    pub structs: Vec<StructDef>,
    pub actions: Vec<ActionDef>,
    pub tables: Vec<TableDef>,
    pub ricardian_clauses: Vec<ClausePair>,
    pub error_messages: Vec<ErrorMessage>,
    pub abi_extensions: Vec<TransactionExtension>,
    pub variants: Vec<VariantDef>,
    pub action_results: Vec<ActionResultDef>,
}

impl AbiDef {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl EosSerialize for AbiDef {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.version.write_to(out);
        self.types.write_to(out);
        self.structs.write_to(out);
        self.actions.write_to(out);
        self.tables.write_to(out);
        self.ricardian_clauses.write_to(out);
        self.error_messages.write_to(out);
        self.abi_extensions.write_to(out);
        // binary extensions: variants is always emitted, action_results only
        // when present so older nodes still accept the blob
        self.variants.write_to(out);
        if !self.action_results.is_empty() {
            self.action_results.write_to(out);
        }
    }
}
