use crate::{
    action::Action,
    keys::Signature,
    primitives::{Checksum256, TimePoint, TimePointSec},
    serialization::{
        eos_struct_codec, EosDeserialize, EosSerialize, Reader, SerializationResult, VarUint32,
    },
};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use sha2::{Digest, Sha256};
use std::{fmt, time::Duration};

/// Default lifetime of a pushed transaction.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(30);

/// Transaction id: hex sha256 of the packed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    pub fn new(id: &str) -> Self {
        TxId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Checksum256> for TxId {
    fn from(hash: Checksum256) -> Self {
        TxId(hash.to_string())
    }
}

/// `(type, data)` pair; serialized as a two-element JSON array.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionExtension(pub u16, #[serde_as(as = "Hex")] pub Vec<u8>);

impl EosSerialize for TransactionExtension {
    fn write_to(&self, out: &mut Vec<u8>) {
        self.0.write_to(out);
        self.1.write_to(out);
    }
}

impl EosDeserialize for TransactionExtension {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        Ok(TransactionExtension(
            u16::read_from(reader)?,
            Vec::read_from(reader)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub expiration: TimePointSec,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: VarUint32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: VarUint32,
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
    pub transaction_extensions: Vec<TransactionExtension>,
}

eos_struct_codec!(Transaction {
    expiration,
    ref_block_num,
    ref_block_prefix,
    max_net_usage_words,
    max_cpu_usage_ms,
    delay_sec,
    context_free_actions,
    actions,
    transaction_extensions,
});

/// Block number embedded in the first four bytes of a block id.
pub fn block_num_from_id(block_id: &Checksum256) -> u32 {
    let bytes = block_id.as_bytes();
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// TAPOS prefix: bytes 8..12 of the block id read little endian.
pub fn ref_block_prefix(block_id: &Checksum256) -> u32 {
    let bytes = block_id.as_bytes();
    u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]])
}

impl Transaction {
    /// Transaction referencing `ref_block_id`, expiring `expire_in` after
    /// `head_block_time`.
    pub fn new(
        actions: Vec<Action>,
        ref_block_id: &Checksum256,
        head_block_time: TimePoint,
        expire_in: Duration,
    ) -> Self {
        Transaction {
            expiration: head_block_time.to_sec() + expire_in,
            ref_block_num: (block_num_from_id(ref_block_id) & 0xffff) as u16,
            ref_block_prefix: ref_block_prefix(ref_block_id),
            max_net_usage_words: VarUint32(0),
            max_cpu_usage_ms: 0,
            delay_sec: VarUint32(0),
            context_free_actions: Vec::new(),
            actions,
            transaction_extensions: Vec::new(),
        }
    }

    pub fn id(&self) -> TxId {
        Checksum256::hash(&self.pack()).into()
    }

    /// `sha256(chain_id || packed_trx || sha256(context_free_data))`, where
    /// an absent context-free payload contributes 32 zero bytes.
    pub fn signing_digest(&self, chain_id: &Checksum256) -> Checksum256 {
        let mut hasher = Sha256::new();
        hasher.update(chain_id.as_bytes());
        hasher.update(self.pack());
        hasher.update([0u8; 32]);
        Checksum256::new(hasher.finalize().into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Zlib,
}

/// Wire form accepted by `/v1/chain/push_transaction`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedTransaction {
    pub signatures: Vec<Signature>,
    pub compression: Compression,
    #[serde_as(as = "Hex")]
    pub packed_context_free_data: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub packed_trx: Vec<u8>,
}

impl PackedTransaction {
    pub fn new(transaction: &Transaction, signatures: Vec<Signature>) -> Self {
        PackedTransaction {
            signatures,
            compression: Compression::None,
            packed_context_free_data: Vec::new(),
            packed_trx: transaction.pack(),
        }
    }

    pub fn id(&self) -> TxId {
        Checksum256::hash(&self.packed_trx).into()
    }

    pub fn transaction(&self) -> SerializationResult<Transaction> {
        Transaction::unpack(&self.packed_trx)
    }
}
