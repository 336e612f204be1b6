use hex_literal::hex;
use packet_dissect::*;
use std::net::Ipv4Addr;

fn frame(number: u32, len: usize) -> FrameContext {
    FrameContext {
        number,
        pkt_len: len as u32,
        ..FrameContext::default()
    }
    .with_endpoints(
        PortType::Udp,
        Endpoint::new(Ipv4Addr::new(172, 16, 0, 10), 51000),
        Endpoint::new(Ipv4Addr::new(172, 16, 0, 1), 25826),
    )
}

fn dissect(data: &[u8]) -> DissectedPacket {
    let mut e = Engine::new(Preferences::default(), &default_columns());
    e.dissect(&frame(1, data.len()), data)
}

#[test]
fn test_collectd_values_are_dispatched() {
    let data = hex!(
        "
        0000 0007 683100
        0002 0008 63707500
        0004 0009 6c6f616400
        0001 000c 000000005f5e1000
        0006 000f 0001 01 000000000000f83f
        "
    );
    let p = dissect(&data);
    assert_eq!(p.protocol(), Some("collectd"));
    assert_eq!(p.info(), Some("Host=h1, 1 value for 1 plugin 1 type"));
    assert_eq!(
        p.tree.find("collectd.val.gauge").map(|n| n.value.clone()),
        Some(FieldValue::Double(1.5))
    );
    let dispatched: Vec<_> = p
        .tree
        .values("collectd.dispatch.plugin")
        .filter_map(FieldValue::as_str)
        .collect();
    assert_eq!(dispatched, vec!["cpu"]);
    assert_eq!(
        p.tree.find("collectd.dispatch.host").and_then(|n| n.value.as_str()),
        Some("h1")
    );
    assert!(p.tree.find("collectd.dispatch.time").is_some());
    assert!(!p.is_malformed());
}

#[test]
fn test_collectd_bad_value_count() {
    // HOST "abcdefgh" (length 12), then VALUES declaring 24 bytes for 1 value
    let data = hex!(
        "
        0000 000c 6162636465666768
        0006 0018 0001 02 0000000000000001 0000000000000000 00
        "
    );
    let p = dissect(&data);
    assert!(p.is_malformed());
    let e = p
        .expert_named("collectd.malformed")
        .next()
        .expect("malformed annotation");
    assert_eq!(e.range, 12..36);
    let info = p.info().unwrap_or("");
    assert!(info.starts_with("Host=abcdefgh"), "info: {}", info);
    assert_eq!(info, "Host=abcdefgh, 0 values for 0 plugins 0 types, 1 error");
}

#[test]
fn test_collectd_part_length_past_the_end() {
    let data = hex!("0000 0040 6162");
    let p = dissect(&data);
    assert!(p.is_malformed());
    assert_eq!(p.info(), Some("Host=???, 0 values for 0 plugins 0 types, 1 error"));
}

#[test]
fn test_collectd_short_numeric_part_is_skipped() {
    // TIME declared with 8 bytes, then a valid HOST
    let data = hex!("0001 0008 00000001 0000 0007 787900");
    let p = dissect(&data);
    assert!(p.is_malformed());
    assert!(p.info().unwrap_or("").starts_with("Host=xy,"));
}

#[test]
fn test_collectd_garbage_and_unknown_parts() {
    let data = hex!("0000 0006 6100 7777 0006 aabb 0102");
    let p = dissect(&data);
    assert_eq!(p.expert_named("collectd.unknown_part").count(), 1);
    assert_eq!(p.expert_named("collectd.garbage").count(), 1);
    assert_eq!(
        p.info(),
        Some("Host=a, 0 values for 0 plugins 0 types, 1 unknown item, 1 error")
    );
}

#[test]
fn test_collectd_zero_length_part_stops() {
    let data = hex!("0000 0000 0000 0000");
    let p = dissect(&data);
    assert!(p.is_malformed());
    assert_eq!(p.expert_named("collectd.malformed").count(), 1);
}
