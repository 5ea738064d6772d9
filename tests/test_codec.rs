mod common;
use common::*;

use std::net::{Ipv4Addr, Ipv6Addr};
use sunspec_bridge::sunspec::*;

fn round_trips<C>(values: &[C])
where
    C: RegisterCodec + PartialEq + std::fmt::Debug,
{
    for value in values {
        let words = value.encode();
        assert_eq!(words.len(), C::LENGTH, "{:?}", value);
        assert_eq!(C::decode(&words).unwrap(), *value, "{:?}", value);
    }
}

#[test]
fn decode_inverts_encode() {
    common_setup();

    round_trips(&[Int16::new(0), Int16::new(-1), Int16::new(i16::MAX), Int16::new(-32767)]);
    round_trips(&[UInt16::new(0), UInt16::new(0xFFFE), UInt16::new(1)]);
    round_trips(&[Acc16::new(1), Acc16::new(0xFFFF)]);
    round_trips(&[Enum16::new(0), Enum16::new(7)]);
    round_trips(&[Bitfield16::new(0), Bitfield16::new(0x7FFF)]);
    round_trips(&[Int32::new(-100_000), Int32::new(i32::MAX), Int32::new(i32::MIN + 1)]);
    round_trips(&[UInt32::new(0x1234_5678), UInt32::new(0)]);
    round_trips(&[Acc32::new(0xFFFF_FFFF), Acc32::new(1)]);
    round_trips(&[Enum32::new(0x0001_0000)]);
    round_trips(&[Bitfield32::new(0x7FFF_FFFF), Bitfield32::new(0x0001_0001)]);
    round_trips(&[Int64::new(-2), Int64::new(i64::MAX)]);
    round_trips(&[UInt64::new(0xFFFF_FFFF_FFFF_FFFE), UInt64::new(1 << 40)]);
    round_trips(&[Acc64::new(u64::MAX), Acc64::new(42)]);
    round_trips(&[IpV4::new(Ipv4Addr::new(10, 1, 2, 3))]);
    round_trips(&[IpV6::new("2001:db8::ff00:42:8329".parse::<Ipv6Addr>().unwrap())]);
    round_trips(&[ScaleFactor::N10, ScaleFactor::Zero, ScaleFactor::P10]);
    round_trips(&[Pad]);
}

#[test]
fn sentinels_are_idempotent() {
    common_setup();

    let sentinel_words: Vec<(ValueKind, Vec<u16>)> = vec![
        (ValueKind::Int16, vec![0x8000]),
        (ValueKind::UInt16, vec![0xFFFF]),
        (ValueKind::Acc16, vec![0x0000]),
        (ValueKind::Enum16, vec![0xFFFF]),
        (ValueKind::Bitfield16, vec![0xFFFF]),
        (ValueKind::Pad, vec![0x8000]),
        (ValueKind::ScaleFactor, vec![0x8000]),
        (ValueKind::Int32, vec![0x8000, 0x0000]),
        (ValueKind::UInt32, vec![0xFFFF, 0xFFFF]),
        (ValueKind::Acc32, vec![0, 0]),
        (ValueKind::Enum32, vec![0xFFFF, 0xFFFF]),
        (ValueKind::Bitfield32, vec![0xFFFF, 0xFFFF]),
        (ValueKind::IpV4, vec![0, 0]),
        (ValueKind::Int64, vec![0x8000, 0, 0, 0]),
        (ValueKind::UInt64, vec![0xFFFF; 4]),
        (ValueKind::Acc64, vec![0; 4]),
        (ValueKind::IpV6, vec![0; 8]),
    ];

    for (kind, words) in sentinel_words {
        let value = kind.decode(&words).unwrap();
        assert!(value.is_sentinel(), "{}", kind);
        assert_eq!(value, kind.sentinel(), "{}", kind);
        assert_eq!(value.encode(), words, "{}", kind);
        assert_eq!(serde_json::to_value(value).unwrap(), serde_json::Value::Null, "{}", kind);
    }
}

#[test]
fn sentinel_meanings_differ_by_family() {
    assert_eq!(Int16::default().sentinel(), Some(Sentinel::NotImplemented));
    assert_eq!(Acc64::default().sentinel(), Some(Sentinel::NotAccumulated));
    assert_eq!(IpV4::default().sentinel(), Some(Sentinel::NotConfigured));
    assert_eq!(Acc16::default().to_string(), "NotAccumulated");
    // the signed minimum is not a number for int16, but it is for acc16
    assert_eq!(Int16::decode(&[0x8000]).unwrap().value(), None);
    assert_eq!(Acc16::decode(&[0x8000]).unwrap().value(), Some(0x8000));
}

#[test]
fn bitfield32_collapses_instead_of_failing() {
    for raw in [0x8000_0000u32, 0x8000_0001, 0xC000_0000, 0xFFFF_FFFE] {
        let field = Bitfield32::new(raw);
        assert_eq!(field.sentinel(), Some(Sentinel::NotImplemented), "0x{:08X}", raw);
        assert_eq!(field.encode(), vec![0xFFFF, 0xFFFF]);
    }
    let words = [0x8000, 0x0001];
    assert_eq!(Bitfield32::decode(&words).unwrap(), Bitfield32::default());
}

#[test]
fn scale_factor_is_strict() {
    for (word, factor) in [(0xFFFFu16, -1), (0x0000, 0), (0x000A, 10), (0xFFF6, -10), (0x0005, 5)] {
        assert_eq!(ScaleFactor::decode(&[word]).unwrap().factor(), Some(factor));
    }
    for word in [0x000Bu16, 0x00FF, 0xFFF5, 0x7FFF] {
        assert!(matches!(
            ScaleFactor::decode(&[word]),
            Err(CodecError::InvalidArgument(_))
        ));
    }
    assert_eq!(ScaleFactor::from_name("N3").unwrap().factor(), Some(-3));
    assert!(matches!(
        ScaleFactor::from_name("minus three"),
        Err(CodecError::InvalidArgument(_))
    ));
    let legal = (0..=u16::MAX)
        .filter(|&word| ScaleFactor::decode(&[word]).is_ok())
        .count();
    assert_eq!(legal, 22);
}

#[test]
fn malformed_arrays_are_rejected() {
    for kind in ValueKind::ALL {
        assert!(
            matches!(kind.decode(&[]), Err(CodecError::InvalidArgument(_))),
            "{}",
            kind
        );
        let short = vec![0x0001; kind.length() - 1];
        if !short.is_empty() {
            assert!(
                matches!(kind.decode(&short), Err(CodecError::OutOfRange { .. })),
                "{}",
                kind
            );
        }
    }
}

#[test]
fn values_rescale() {
    let temperature = Int16::decode(&[0xFF38]).unwrap();
    let sf = ScaleFactor::decode(&[0xFFFF]).unwrap();
    let celsius = scaled(temperature.into(), sf).unwrap();
    assert!((celsius + 20.0).abs() < 1e-9);
    assert_eq!(scaled(IpV4::default().into(), sf), None);
}
