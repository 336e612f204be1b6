use hex_literal::hex;
use packet_dissect::*;
use std::net::Ipv4Addr;

// Tattach tag=1 fid=5 afid=NOFID uname="u" aname="/export"
static TATTACH: &[u8] = &hex!("1b000000 68 0100 05000000 ffffffff 0100 75 0700 2f6578706f7274");
// Rattach tag=1
static RATTACH: &[u8] = &hex!("14000000 69 0100 80 00000000 0100000000000000");
// Twalk tag=2 fid=5 newfid=6 wname="foo"
static TWALK: &[u8] = &hex!("16000000 6e 0200 05000000 06000000 0100 0300 666f6f");
// Rwalk tag=2, one qid
static RWALK: &[u8] = &hex!("16000000 6f 0200 0100 80 00000000 0200000000000000");
// Tclunk tag=3 fid=6
static TCLUNK: &[u8] = &hex!("0b000000 78 0300 06000000");
// Tversion/Rversion msize=8192 version="9P2000.L"
static TVERSION_L: &[u8] = &hex!("15000000 64 ffff 00200000 0800 3950323030302e4c");
static RVERSION_L: &[u8] = &hex!("15000000 65 ffff 00200000 0800 3950323030302e4c");
// Tattach tag=1 fid=5 afid=NOFID uname="u" aname="/export" n_uname=1000
static TATTACH_L: &[u8] = &hex!("1f000000 68 0100 05000000 ffffffff 0100 75 0700 2f6578706f7274 e8030000");
// Twalk tag=2 fid=5 newfid=6, no names (clone), and its Rwalk
static TWALK_CLONE: &[u8] = &hex!("11000000 6e 0200 05000000 06000000 0000");
static RWALK_CLONE: &[u8] = &hex!("09000000 6f 0200 0000");
// Tcreate tag=3 fid=6 name="new" perm=0644 mode=1, and its Rcreate
static TCREATE: &[u8] = &hex!("15000000 72 0300 06000000 0300 6e6577 a4010000 01");
static RCREATE: &[u8] = &hex!("18000000 73 0300 00 00000000 0300000000000000 00000000");
// Tclunk tag=4 fid=6, and its Rclunk
static TCLUNK_NEW: &[u8] = &hex!("0b000000 78 0400 06000000");
static RCLUNK_NEW: &[u8] = &hex!("07000000 79 0400");
// Tstat tag=5 fid=6
static TSTAT: &[u8] = &hex!("0b000000 7c 0500 06000000");
// Tlcreate tag=3 fid=6 name="new" flags=0 mode=0644 gid=0, and its Rlcreate
static TLCREATE: &[u8] = &hex!("1c000000 0e 0300 06000000 0300 6e6577 00000000 a4010000 00000000");
static RLCREATE: &[u8] = &hex!("18000000 0f 0300 00 00000000 0300000000000000 00000000");
// Tremove tag=4 fid=6, and its Rremove
static TREMOVE: &[u8] = &hex!("0b000000 7a 0400 06000000");
static RREMOVE: &[u8] = &hex!("07000000 7b 0400");
// Tgetattr tag=5 fid=6
static TGETATTR: &[u8] = &hex!("13000000 18 0500 06000000 ff3f000000000000");

fn client() -> Endpoint {
    Endpoint::new(Ipv4Addr::new(10, 1, 1, 1), 40000)
}

fn server() -> Endpoint {
    Endpoint::new(Ipv4Addr::new(10, 1, 1, 2), 564)
}

fn frame(number: u32, to_server: bool, len: usize) -> FrameContext {
    let f = FrameContext {
        number,
        pkt_len: len as u32,
        ..FrameContext::default()
    };
    if to_server {
        f.with_endpoints(PortType::Tcp, client(), server())
    } else {
        f.with_endpoints(PortType::Tcp, server(), client())
    }
}

fn engine() -> Engine {
    Engine::new(Preferences::default(), &default_columns())
}

/// Dissect a capture in order, on the first pass
fn run(e: &mut Engine, capture: &[(&[u8], bool)]) -> Vec<DissectedPacket> {
    capture
        .iter()
        .enumerate()
        .map(|(i, (data, up))| e.dissect(&frame(i as u32 + 1, *up, data.len()), data))
        .collect()
}

fn paths(p: &DissectedPacket) -> Vec<String> {
    p.tree
        .values("9p.path")
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect()
}

#[test]
fn test_ninep_walk_resolves_path() {
    let mut e = engine();
    let capture: &[(&[u8], bool)] = &[
        (TATTACH, true),
        (RATTACH, false),
        (TWALK, true),
        (RWALK, false),
        (TCLUNK, true),
    ];
    let packets: Vec<_> = capture
        .iter()
        .enumerate()
        .map(|(i, (data, up))| e.dissect(&frame(i as u32 + 1, *up, data.len()), data))
        .collect();

    assert_eq!(packets[0].protocol(), Some("9P"));
    assert!(packets[0].info().unwrap_or("").starts_with("Tattach Tag=1"));
    assert_eq!(paths(&packets[0]), vec!["/export"]);

    let newpath = packets[2].tree.find("9p.newpath").and_then(|n| n.value.as_str());
    assert_eq!(newpath, Some("/export/foo"));

    let rwalk = &packets[3];
    assert_eq!(rwalk.tree.find("9p.request_in").and_then(|n| n.value.as_u64()), Some(3));
    assert_eq!(paths(rwalk), vec!["/export/foo"]);

    assert_eq!(paths(&packets[4]), vec!["/export/foo"]);
    assert!(!packets.iter().any(DissectedPacket::is_malformed));
}

#[test]
fn test_ninep_second_pass_is_identical() {
    let mut e = engine();
    let capture: &[(&[u8], bool)] = &[(TATTACH, true), (TWALK, true), (RWALK, false), (TCLUNK, true)];
    let first: Vec<_> = capture
        .iter()
        .enumerate()
        .map(|(i, (data, up))| e.dissect(&frame(i as u32 + 1, *up, data.len()), data))
        .collect();
    // second pass, in another order
    for i in (0..capture.len()).rev() {
        let (data, up) = capture[i];
        let again = e.dissect(&frame(i as u32 + 1, up, data.len()).revisited(), data);
        assert_eq!(again.info(), first[i].info());
        assert_eq!(paths(&again), paths(&first[i]));
        assert_eq!(again.tree.dump(), first[i].tree.dump());
    }
}

#[test]
fn test_ninep_several_messages_per_segment() {
    let mut e = engine();
    let mut data = TATTACH.to_vec();
    data.extend_from_slice(TWALK);
    let p = e.dissect(&frame(1, true, data.len()), &data);
    let info = p.info().unwrap_or("");
    assert!(info.starts_with("Tattach Tag=1"), "info: {}", info);
    assert!(info.contains(" ; Twalk Tag=2"), "info: {}", info);
    assert_eq!(
        p.tree.find("9p.newpath").and_then(|n| n.value.as_str()),
        Some("/export/foo")
    );
}

#[test]
fn test_ninep_invalid_size() {
    let mut e = engine();
    // declared size 4 is shorter than the header
    let data = hex!("04000000 78 0300 06000000");
    let p = e.dissect(&frame(1, true, data.len()), &data);
    assert!(p.is_malformed());
    assert!(p.info().unwrap_or("").ends_with("[Malformed: invalid size]"));
    let e = p.expert_named("9p.malformed").next().expect("malformed annotation");
    assert_eq!(e.range, 0..4);

    // declared size past the end of the segment
    let mut e = engine();
    let data = hex!("40000000 78 0300 06000000");
    let p = e.dissect(&frame(1, true, data.len()), &data);
    assert!(p.is_malformed());
}

#[test]
fn test_ninep_response_without_request() {
    let mut e = engine();
    let p = e.dissect(&frame(1, false, RWALK.len()), RWALK);
    assert_eq!(
        p.tree.find("9p.request_type").and_then(|n| n.value.as_str()),
        Some("<unknown>")
    );
    assert_eq!(paths(&p), vec!["<unknown>"]);
    assert!(!p.is_malformed());
}

#[test]
fn test_ninep_version_negotiation() {
    let mut e = engine();
    let capture: &[(&[u8], bool)] = &[(TVERSION_L, true), (RVERSION_L, false), (TATTACH_L, true), (RATTACH, false)];
    let packets = run(&mut e, capture);

    assert!(packets[0].info().unwrap_or("").starts_with("Tversion Tag=65535"));
    assert_eq!(
        packets[1].tree.find("9p.request_in").and_then(|n| n.value.as_u64()),
        Some(1)
    );
    let tattach = &packets[2];
    assert_eq!(
        tattach.tree.find("9p.n_uname").and_then(|n| n.value.as_u64()),
        Some(1000)
    );
    assert_eq!(tattach.expert_named("9p.trailing").count(), 0);
    assert_eq!(paths(tattach), vec!["/export"]);
    assert!(!packets.iter().any(DissectedPacket::is_malformed));

    // the negotiated version is still known on a later pass
    let again = e.dissect(&frame(3, true, TATTACH_L.len()).revisited(), TATTACH_L);
    assert_eq!(again.tree.dump(), tattach.tree.dump());
}

#[test]
fn test_ninep_walk_list_is_capped() {
    let mut e = engine();
    // Twalk tag=2 fid=5 newfid=6 with 17 names "a"
    let mut data = Vec::new();
    data.extend_from_slice(&(7u32 + 10 + 17 * 3).to_le_bytes());
    data.extend_from_slice(&hex!("6e 0200 05000000 06000000 1100"));
    for _ in 0..17 {
        data.extend_from_slice(&hex!("0100 61"));
    }
    let p = e.dissect(&frame(1, true, data.len()), &data);
    assert_eq!(p.tree.values("9p.wname").count(), 16);
    assert_eq!(
        p.tree.find("9p.nwname").and_then(|n| n.value.as_u64()),
        Some(17)
    );
    let truncated = p
        .expert_named("9p.list_truncated")
        .next()
        .expect("truncation annotation");
    assert!(truncated.message.contains("showing first 16"), "message: {}", truncated.message);
    assert_eq!(p.expert_named("9p.trailing").count(), 0);
    assert!(!p.is_malformed());
}

#[test]
fn test_ninep_create_and_clunk() {
    let mut e = engine();
    let capture: &[(&[u8], bool)] = &[
        (TATTACH, true),
        (RATTACH, false),
        (TWALK_CLONE, true),
        (RWALK_CLONE, false),
        (TCREATE, true),
        (RCREATE, false),
        (TCLUNK_NEW, true),
        (RCLUNK_NEW, false),
        (TSTAT, true),
    ];
    let packets = run(&mut e, capture);

    assert_eq!(paths(&packets[3]), vec!["/export"]);
    assert_eq!(
        packets[4].tree.find("9p.newpath").and_then(|n| n.value.as_str()),
        Some("/export/new")
    );
    assert_eq!(paths(&packets[5]), vec!["/export/new"]);
    assert_eq!(paths(&packets[6]), vec!["/export/new"]);
    // the clunk response still shows the fid it closed
    assert_eq!(paths(&packets[7]), vec!["/export/new"]);
    assert_eq!(paths(&packets[8]), vec!["<unknown>"]);
    assert!(!packets.iter().any(DissectedPacket::is_malformed));

    let again = e.dissect(&frame(8, false, RCLUNK_NEW.len()).revisited(), RCLUNK_NEW);
    assert_eq!(paths(&again), vec!["/export/new"]);
}

#[test]
fn test_ninep_lcreate_and_remove() {
    let mut e = engine();
    let capture: &[(&[u8], bool)] = &[
        (TVERSION_L, true),
        (RVERSION_L, false),
        (TATTACH_L, true),
        (RATTACH, false),
        (TWALK_CLONE, true),
        (RWALK_CLONE, false),
        (TLCREATE, true),
        (RLCREATE, false),
        (TREMOVE, true),
        (RREMOVE, false),
        (TGETATTR, true),
    ];
    let packets = run(&mut e, capture);

    assert_eq!(
        packets[6].tree.find("9p.newpath").and_then(|n| n.value.as_str()),
        Some("/export/new")
    );
    assert_eq!(paths(&packets[7]), vec!["/export/new"]);
    assert_eq!(paths(&packets[8]), vec!["/export/new"]);
    assert_eq!(paths(&packets[9]), vec!["/export/new"]);
    assert_eq!(paths(&packets[10]), vec!["<unknown>"]);
    assert!(!packets.iter().any(DissectedPacket::is_malformed));
}
