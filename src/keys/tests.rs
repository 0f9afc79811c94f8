use super::*;

const DEFAULT_PUBLIC: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

#[test]
fn default_key_derives_the_well_known_public_key() {
    let key: PrivateKey = DEFAULT_KEY.parse().unwrap();
    let public_key = key.public_key().unwrap();
    assert_eq!(public_key.to_string(), DEFAULT_PUBLIC);
    assert_eq!(
        public_key.to_k1_string(),
        "PUB_K1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq63"
    );
    assert_eq!(key.to_wif(), DEFAULT_KEY);
}

#[test]
fn k1_private_key_format_is_accepted() {
    let key: PrivateKey = "PVT_K1_2bfGi9rYsXQSXXTvJbDAPhHLQUojjaNLomdm3cEJ1XTzMqUt3V"
        .parse()
        .unwrap();
    assert_eq!(key.public_key().unwrap().to_string(), DEFAULT_PUBLIC);
}

#[test]
fn both_public_key_formats_parse_to_the_same_key() {
    let legacy: PublicKey = DEFAULT_PUBLIC.parse().unwrap();
    let k1: PublicKey = "PUB_K1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq63"
        .parse()
        .unwrap();
    assert_eq!(legacy, k1);
}

#[test]
fn corrupted_checksum_is_rejected() {
    let corrupted = DEFAULT_PUBLIC.replace("5CV", "5CW");
    assert!(matches!(
        corrupted.parse::<PublicKey>(),
        Err(KeyError::Checksum(_))
    ));
    assert!(matches!(
        "PUB_R1_abc".parse::<PublicKey>(),
        Err(KeyError::Format(_))
    ));
}

#[test]
fn signatures_are_canonical_and_recoverable() {
    let key = PrivateKey::generate();
    let public_key = key.public_key().unwrap();
    let digest = Checksum256::hash(b"transfer 1.00 HUSD");

    let signature = key.sign_digest(&digest).unwrap();
    assert!(signature.is_canonical());
    assert_eq!(signature.recover(&digest).unwrap(), public_key);

    let encoded = signature.to_string();
    assert!(encoded.starts_with("SIG_K1_"));
    assert_eq!(encoded.parse::<Signature>().unwrap(), signature);
}

#[test]
fn signature_over_other_digest_recovers_other_key() {
    let key: PrivateKey = DEFAULT_KEY.parse().unwrap();
    let signature = key.sign_digest(&Checksum256::hash(b"one")).unwrap();
    let recovered = signature.recover(&Checksum256::hash(b"two")).unwrap();
    assert_ne!(recovered, key.public_key().unwrap());
}

#[test]
fn key_bag_signs_only_with_imported_keys() {
    let bag = KeyBag::new();
    let default_public = bag.import_private_key(DEFAULT_KEY).unwrap();
    assert_eq!(bag.available_keys().unwrap(), vec![default_public]);

    let digest = Checksum256::hash(b"digest");
    let signatures = bag.sign(&digest, &[default_public]).unwrap();
    assert_eq!(signatures.len(), 1);

    let stranger = PrivateKey::generate().public_key().unwrap();
    let err = bag.sign(&digest, &[stranger]).unwrap_err();
    assert!(matches!(err, KeyError::MissingKey(key) if key == stranger));
}

#[test]
fn public_key_packs_with_type_prefix() {
    let public_key: PublicKey = DEFAULT_PUBLIC.parse().unwrap();
    let packed = public_key.pack();
    assert_eq!(packed.len(), 34);
    assert_eq!(packed[0], 0);
    assert_eq!(PublicKey::unpack(&packed).unwrap(), public_key);
}
