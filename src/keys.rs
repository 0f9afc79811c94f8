use crate::{
    primitives::Checksum256,
    serialization::{EosDeserialize, EosSerialize, Reader, SerializationError, SerializationResult},
};
use k256::ecdsa::{
    signature::hazmat::RandomizedPrehashSigner, RecoveryId, Signature as EcdsaSignature,
    SigningKey, VerifyingKey,
};
use rand::rngs::OsRng;
use ripemd::{Digest, Ripemd160};
use secrecy::{ExposeSecret, Secret};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use sha2::Sha256;
use std::{collections::BTreeMap, fmt, str::FromStr, sync::RwLock};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Development key every local nodeos ships with for `eosio`.
pub const DEFAULT_KEY: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

const WIF_VERSION: u8 = 0x80;
const LEGACY_PUBLIC_PREFIX: &str = "EOS";
const K1_PUBLIC_PREFIX: &str = "PUB_K1_";
const K1_PRIVATE_PREFIX: &str = "PVT_K1_";
const K1_SIGNATURE_PREFIX: &str = "SIG_K1_";
const K1_SUFFIX: &[u8] = b"K1";
const K1_KEY_TYPE: u8 = 0;
const MAX_SIGNING_ATTEMPTS: usize = 32;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid base58 in {0:?}")]
    Base58(String),
    #[error("Checksum mismatch in {0:?}")]
    Checksum(String),
    #[error("Unsupported key format: {0:?}")]
    Format(String),
    #[error("Invalid secp256k1 material: {0}")]
    Curve(String),
    #[error("Could not produce a canonical signature: {0}")]
    Signing(String),
    #[error("Key bag has no private key for {0}")]
    MissingKey(PublicKey),
    #[error("Key bag lock poisoned")]
    Poisoned,
}

#[allow(missing_docs)]
pub type KeyResult<T> = Result<T, KeyError>;

fn k1_checksum(data: &[u8]) -> [u8; 4] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(K1_SUFFIX);
    let digest = hasher.finalize();
    [digest[0], digest[1], digest[2], digest[3]]
}

fn legacy_checksum(data: &[u8]) -> [u8; 4] {
    let digest = Ripemd160::digest(data);
    [digest[0], digest[1], digest[2], digest[3]]
}

fn wif_checksum(data: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(data));
    [digest[0], digest[1], digest[2], digest[3]]
}

fn with_checksum(data: &[u8], checksum: [u8; 4]) -> String {
    let mut bytes = data.to_vec();
    bytes.extend_from_slice(&checksum);
    bs58::encode(bytes).into_string()
}

/// Decodes base58 `payload || checksum` and verifies the checksum.
fn decode_checked<const N: usize>(
    encoded: &str,
    original: &str,
    checksum: fn(&[u8]) -> [u8; 4],
) -> KeyResult<[u8; N]> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| KeyError::Base58(original.to_string()))?;
    if bytes.len() != N + 4 {
        return Err(KeyError::Format(original.to_string()));
    }
    let (payload, check) = bytes.split_at(N);
    if checksum(payload) != check {
        return Err(KeyError::Checksum(original.to_string()));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(payload);
    Ok(out)
}

/// secp256k1 private key. Accepts WIF and `PVT_K1_` encodings.
pub struct PrivateKey {
    secret: Secret<[u8; 32]>,
}

impl PrivateKey {
    pub fn generate() -> Self {
        let key = SigningKey::random(&mut OsRng);
        PrivateKey {
            secret: Secret::new(key.to_bytes().into()),
        }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> KeyResult<Self> {
        SigningKey::from_slice(&bytes).map_err(|e| KeyError::Curve(e.to_string()))?;
        Ok(PrivateKey {
            secret: Secret::new(bytes),
        })
    }

    fn signing_key(&self) -> KeyResult<SigningKey> {
        SigningKey::from_slice(self.secret.expose_secret())
            .map_err(|e| KeyError::Curve(e.to_string()))
    }

    pub fn public_key(&self) -> KeyResult<PublicKey> {
        let signing_key = self.signing_key()?;
        PublicKey::from_verifying_key(signing_key.verifying_key())
    }

    /// Legacy wallet import format.
    pub fn to_wif(&self) -> String {
        let mut payload = vec![WIF_VERSION];
        payload.extend_from_slice(self.secret.expose_secret());
        with_checksum(&payload, wif_checksum(&payload))
    }

    /// Signs a 32-byte digest, retrying with fresh nonces until the
    /// signature is canonical in the EOSIO sense.
    pub fn sign_digest(&self, digest: &Checksum256) -> KeyResult<Signature> {
        let key = self.signing_key()?;
        let prehash = digest.as_bytes();
        for attempt in 0..MAX_SIGNING_ATTEMPTS {
            let signature = if attempt == 0 {
                key.sign_prehash_recoverable(prehash).map(|(sig, _)| sig)
            } else {
                key.sign_prehash_with_rng(&mut OsRng, prehash)
            }
            .map_err(|e| KeyError::Signing(e.to_string()))?;
            let signature = signature.normalize_s().unwrap_or(signature);
            let recovery_id =
                RecoveryId::trial_recovery_from_prehash(key.verifying_key(), prehash, &signature)
                    .map_err(|e| KeyError::Signing(e.to_string()))?;
            let mut bytes = [0u8; 65];
            bytes[0] = 27 + 4 + recovery_id.to_byte();
            bytes[1..].copy_from_slice(&signature.to_bytes());
            if is_canonical(&bytes) {
                return Ok(Signature(bytes));
            }
        }
        Err(KeyError::Signing(format!(
            "gave up after {MAX_SIGNING_ATTEMPTS} attempts"
        )))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(body) = s.strip_prefix(K1_PRIVATE_PREFIX) {
            let bytes = decode_checked::<32>(body, s, k1_checksum)?;
            return PrivateKey::from_bytes(bytes);
        }
        let payload = decode_checked::<33>(s, s, wif_checksum)?;
        if payload[0] != WIF_VERSION {
            return Err(KeyError::Format(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&payload[1..]);
        PrivateKey::from_bytes(bytes)
    }
}

fn is_canonical(signature: &[u8; 65]) -> bool {
    signature[1] & 0x80 == 0
        && !(signature[1] == 0 && signature[2] & 0x80 == 0)
        && signature[33] & 0x80 == 0
        && !(signature[33] == 0 && signature[34] & 0x80 == 0)
}

/// Compressed secp256k1 public key. Displays in the legacy `EOS` form and
/// parses both `EOS` and `PUB_K1_`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct PublicKey([u8; 33]);

impl PublicKey {
    fn from_verifying_key(key: &VerifyingKey) -> KeyResult<Self> {
        let point = key.to_encoded_point(true);
        let bytes: [u8; 33] = point
            .as_bytes()
            .try_into()
            .map_err(|_| KeyError::Curve("unexpected point length".to_string()))?;
        Ok(PublicKey(bytes))
    }

    pub fn from_bytes(bytes: [u8; 33]) -> KeyResult<Self> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| KeyError::Curve(e.to_string()))?;
        Ok(PublicKey(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub fn to_k1_string(&self) -> String {
        format!(
            "{K1_PUBLIC_PREFIX}{}",
            with_checksum(&self.0, k1_checksum(&self.0))
        )
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{LEGACY_PUBLIC_PREFIX}{}",
            with_checksum(&self.0, legacy_checksum(&self.0))
        )
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = if let Some(body) = s.strip_prefix(K1_PUBLIC_PREFIX) {
            decode_checked::<33>(body, s, k1_checksum)?
        } else if let Some(body) = s.strip_prefix(LEGACY_PUBLIC_PREFIX) {
            decode_checked::<33>(body, s, legacy_checksum)?
        } else {
            return Err(KeyError::Format(s.to_string()));
        };
        PublicKey::from_bytes(bytes)
    }
}

impl EosSerialize for PublicKey {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(K1_KEY_TYPE);
        out.extend_from_slice(&self.0);
    }
}

impl EosDeserialize for PublicKey {
    fn read_from(reader: &mut Reader<'_>) -> SerializationResult<Self> {
        let key_type = u8::read_from(reader)?;
        if key_type != K1_KEY_TYPE {
            return Err(SerializationError::UnknownVariant {
                type_name: "public_key",
                index: u32::from(key_type),
            });
        }
        let bytes = reader.read_array::<33>()?;
        PublicKey::from_bytes(bytes).map_err(|e| SerializationError::Invalid(e.to_string()))
    }
}

/// Compact recoverable signature: recovery byte followed by `r` and `s`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Signature([u8; 65]);

impl Signature {
    /// Public key that produced this signature over `digest`.
    pub fn recover(&self, digest: &Checksum256) -> KeyResult<PublicKey> {
        let recovery_byte = self.0[0]
            .checked_sub(27 + 4)
            .or_else(|| self.0[0].checked_sub(27))
            .ok_or_else(|| KeyError::Curve("bad recovery byte".to_string()))?;
        let recovery_id = RecoveryId::from_byte(recovery_byte)
            .ok_or_else(|| KeyError::Curve("bad recovery byte".to_string()))?;
        let signature =
            EcdsaSignature::from_slice(&self.0[1..]).map_err(|e| KeyError::Curve(e.to_string()))?;
        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
            .map_err(|e| KeyError::Curve(e.to_string()))?;
        PublicKey::from_verifying_key(&key)
    }

    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{K1_SIGNATURE_PREFIX}{}",
            with_checksum(&self.0, k1_checksum(&self.0))
        )
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(K1_SIGNATURE_PREFIX)
            .ok_or_else(|| KeyError::Format(s.to_string()))?;
        Ok(Signature(decode_checked::<65>(body, s, k1_checksum)?))
    }
}

impl EosSerialize for Signature {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(K1_KEY_TYPE);
        out.extend_from_slice(&self.0);
    }
}

/// In-memory signer holding every private key imported during a run.
#[derive(Debug, Default)]
pub struct KeyBag {
    keys: RwLock<BTreeMap<PublicKey, PrivateKey>>,
}

impl KeyBag {
    pub fn new() -> Self {
        KeyBag::default()
    }

    /// Parses and stores a WIF or `PVT_K1_` key, returning its public key
    pub fn import_private_key(&self, encoded: &str) -> KeyResult<PublicKey> {
        self.add(encoded.parse()?)
    }

    pub fn add(&self, key: PrivateKey) -> KeyResult<PublicKey> {
        let public_key = key.public_key()?;
        self.keys
            .write()
            .map_err(|_| KeyError::Poisoned)?
            .insert(public_key, key);
        Ok(public_key)
    }

    pub fn available_keys(&self) -> KeyResult<Vec<PublicKey>> {
        let keys = self.keys.read().map_err(|_| KeyError::Poisoned)?;
        Ok(keys.keys().copied().collect())
    }

    pub fn sign(&self, digest: &Checksum256, required: &[PublicKey]) -> KeyResult<Vec<Signature>> {
        let keys = self.keys.read().map_err(|_| KeyError::Poisoned)?;
        required
            .iter()
            .map(|public_key| {
                keys.get(public_key)
                    .ok_or(KeyError::MissingKey(*public_key))?
                    .sign_digest(digest)
            })
            .collect()
    }
}
