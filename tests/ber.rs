use asn1_template::*;
use hex_literal::hex;

#[test]
fn decode_integer() {
    let input = &hex!("02 01 01");
    let mut value = Value::from_ber_complete(input).expect("parsing failed");
    assert_eq!(value.tag(), Tag::Integer);
    assert_eq!(value.payload().unwrap().as_i64(), Some(1));
    assert_eq!(value.to_ber_vec().expect("serialization failed"), input);
}

#[test]
fn decode_sequence_roundtrip() {
    // SEQUENCE { INTEGER 1, PrintableString "abc  " }
    let input = &hex!("30 0a 02 01 01 13 05 61 62 63 20 20");
    let value = Value::from_ber_complete(input).expect("parsing failed");
    assert_eq!(value.tag(), Tag::Sequence);
    let children = value.children().expect("not constructed");
    assert_eq!(children.len(), 2);

    let mut value = value;
    {
        let children = value.children_mut().expect("not constructed");
        assert_eq!(children[0].payload().unwrap().as_i64(), Some(1));
        assert_eq!(children[1].payload().unwrap().as_str(), Some("abc  "));
    }
    // lazy decoding does not disturb the cached encoding
    assert_eq!(value.to_ber_vec().expect("serialization failed"), input);
}

#[test]
fn decode_indefinite_octetstring() {
    let input = &hex!("24 80 04 02 aa bb 04 02 cc dd 00 00");
    let mut value = Value::from_ber_complete(input).expect("parsing failed");
    assert_eq!(value.header().length(), Length::Indefinite);
    assert_eq!(value.children().map(<[Value]>::len), Some(2));
    // semantic concatenation of the segments
    assert_eq!(
        value.payload().unwrap(),
        &Payload::OctetString(hex!("aa bb cc dd").to_vec())
    );
    // indefinite form is preserved on re-serialisation
    assert_eq!(value.to_ber_vec().expect("serialization failed"), input);
}

#[test]
fn roundtrip_keeps_nonminimal_lengths() {
    // long-form length where short form would fit
    let input = &hex!("02 81 01 05");
    let value = Value::from_ber_complete(input).expect("parsing failed");
    assert_eq!(value.to_ber_vec().expect("serialization failed"), input);
}

#[test]
fn roundtrip_opaque() {
    let input = &hex!("64 03 02 01 01");
    let value = Value::from_ber_complete(input).expect("parsing failed");
    assert!(value.is_opaque());
    assert_eq!(value.to_ber_vec().expect("serialization failed"), input);

    // indefinite-length opaque keeps its form
    let input = &hex!("a0 80 02 01 07 00 00");
    let value = Value::from_ber_complete(input).expect("parsing failed");
    assert_eq!(value.to_ber_vec().expect("serialization failed"), input);
}

#[test]
fn mutated_header_reencodes() {
    let input = &hex!("02 81 01 05");
    let mut value = Value::from_ber_complete(input).expect("parsing failed");
    // retag INTEGER -> ENUMERATED; the untouched length cache still applies
    value.header_mut().set_tag(Tag::Enumerated);
    assert_eq!(
        value.to_ber_vec().expect("serialization failed"),
        hex!("0a 81 01 05")
    );

    // changing the payload drops both value bytes and length cache
    let mut value = Value::from_ber_complete(input).expect("parsing failed");
    value.set_payload(Payload::from(300i64)).unwrap();
    assert_eq!(
        value.to_ber_vec().expect("serialization failed"),
        hex!("02 02 01 2c")
    );
}

#[test]
fn constructor_roundtrips() {
    let values = vec![
        Value::boolean(true),
        Value::integer(-129),
        Value::octet_string(hex!("01 02 03").to_vec()),
        Value::null(),
        Value::oid("1.2.840.113549.1.1.5".parse().unwrap()),
        Value::utf8_string("héllo"),
        Value::ia5_string("test@example.org"),
        Value::bit_string(6, &hex!("6e 5d c0")).unwrap(),
        Value::bmp_string("User"),
        Value::utc_time(Asn1DateTime::new(99, 12, 31, 23, 59, 59, None, Asn1TimeZone::Z)),
        Value::generalized_time(Asn1DateTime::new(
            2002,
            12,
            13,
            14,
            29,
            23,
            None,
            Asn1TimeZone::Z,
        )),
    ];
    for mut value in values {
        let encoded = value.to_ber_vec().expect("serialization failed");
        let mut reparsed = Value::from_ber_complete(&encoded).expect("parsing failed");
        assert_eq!(reparsed.tag(), value.tag());
        assert_eq!(reparsed.payload().unwrap(), value.payload().unwrap());
    }
}

#[test]
fn sequence_construction() {
    let value = Value::sequence(vec![
        Value::integer(1),
        Value::printable_string("abc  "),
    ]);
    assert_eq!(
        value.to_ber_vec().expect("serialization failed"),
        hex!("30 0a 02 01 01 13 05 61 62 63 20 20")
    );
}

#[test]
fn universal_multi_octet_tag_rejected() {
    // universal class with the multi-octet tag form
    let input = &hex!("1f 1e 00");
    assert!(matches!(
        Value::from_ber(input),
        Err(nom::Err::Error(Error::UniversalTagTooLarge(_)))
    ));
}

#[test]
fn indefinite_primitive_rejected() {
    let input = &hex!("04 80 00 00");
    assert!(matches!(
        Value::from_ber(input),
        Err(nom::Err::Error(Error::IndefiniteLengthUnexpected))
    ));
}

#[test]
fn bitstring_unused_bits_bounds() {
    assert!(Value::bit_string(8, &hex!("ff")).is_err());
    assert!(Value::bit_string(3, &[]).is_err());
    assert!(Value::bit_string(0, &[]).is_ok());
}

#[test]
fn illegal_oid_rejected() {
    // dangling continuation bit in the last sub-identifier
    let input = &hex!("06 01 80");
    let mut value = Value::from_ber_complete(input).expect("parsing failed");
    assert!(value.payload().is_err());
}

#[test]
fn decode_from_reader() {
    use std::io::Cursor;

    let input = hex!("30 80 02 01 01 00 00 ff");
    let mut reader = Cursor::new(&input[..]);
    let value = Value::from_reader(&mut reader).expect("parsing failed");
    assert_eq!(value.tag(), Tag::Sequence);
    assert_eq!(value.header().length(), Length::Indefinite);

    // EOF in the middle of a TLV
    let mut reader = Cursor::new(&hex!("30 05 02 01")[..]);
    assert!(matches!(
        Value::from_reader(&mut reader),
        Err(Error::Incomplete(_))
    ));
}

#[test]
fn enumerated_shares_integer_codec() {
    let input = &hex!("0a 01 2a");
    let mut value = Value::from_ber_complete(input).expect("parsing failed");
    assert_eq!(value.tag(), Tag::Enumerated);
    assert_eq!(value.payload().unwrap().as_i64(), Some(42));
}

#[test]
fn unknown_universal_tag_falls_back_to_bytes() {
    // ObjectDescriptor (7) has no codec entry
    let input = &hex!("07 02 ab cd");
    let mut value = Value::from_ber_complete(input).expect("parsing failed");
    assert_eq!(
        value.payload().unwrap(),
        &Payload::Bytes(hex!("ab cd").to_vec())
    );
    assert_eq!(value.to_ber_vec().expect("serialization failed"), input);
}
