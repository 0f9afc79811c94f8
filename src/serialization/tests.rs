use super::*;

#[test]
fn varuint32_uses_seven_bit_groups() {
    let mut out = Vec::new();
    write_varuint32(&mut out, 300);
    assert_eq!(out, vec![0xac, 0x02]);

    let mut reader = Reader::new(&out);
    assert_eq!(reader.read_varuint32().unwrap(), 300);
    reader.finish().unwrap();
}

#[test]
fn varuint32_rejects_more_than_five_bytes() {
    let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
    let mut reader = Reader::new(&bytes);
    assert_eq!(
        reader.read_varuint32().unwrap_err(),
        SerializationError::VarUintOverflow
    );
}

#[test]
fn string_is_length_prefixed() {
    let packed = "Test Ledger".to_string().pack();
    assert_eq!(packed[0], 11);
    assert_eq!(&packed[1..], b"Test Ledger");
    assert_eq!(String::unpack(&packed).unwrap(), "Test Ledger");
}

#[test]
fn optional_values_carry_a_presence_byte() {
    assert_eq!(None::<u32>.pack(), vec![0]);
    assert_eq!(Some(7u16).pack(), vec![1, 7, 0]);
}

#[test]
fn unpack_rejects_trailing_bytes() {
    let err = u16::unpack(&[1, 0, 9]).unwrap_err();
    assert_eq!(err, SerializationError::TrailingBytes(1));
}

#[test]
fn truncated_vector_is_an_error() {
    let err = Vec::<u64>::unpack(&[2, 1, 0, 0]).unwrap_err();
    assert!(matches!(err, SerializationError::UnexpectedEof { .. }));
}

struct Pair {
    first: u32,
    second: String,
}

eos_struct_codec!(Pair { first, second });

#[test]
fn struct_codec_packs_fields_in_order() {
    let pair = Pair {
        first: 1,
        second: "a".to_string(),
    };
    let packed = pair.pack();
    assert_eq!(packed, vec![1, 0, 0, 0, 1, b'a']);

    let decoded = Pair::unpack(&packed).unwrap();
    assert_eq!(decoded.first, 1);
    assert_eq!(decoded.second, "a");
}
