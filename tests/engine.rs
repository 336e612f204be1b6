use hex_literal::hex;
use packet_dissect::*;
use std::net::Ipv4Addr;

static TATTACH: &[u8] = &hex!("1b000000 68 0100 05000000 ffffffff 0100 75 0700 2f6578706f7274");
static TWALK: &[u8] = &hex!("16000000 6e 0200 05000000 06000000 0100 0300 666f6f");
static RWALK: &[u8] = &hex!("16000000 6f 0200 0100 80 00000000 0200000000000000");

fn client() -> Endpoint {
    Endpoint::new(Ipv4Addr::new(192, 168, 1, 10), 50000)
}

fn server() -> Endpoint {
    Endpoint::new(Ipv4Addr::new(192, 168, 1, 20), 564)
}

fn columns() -> Vec<ColumnSpec> {
    let mut specs = default_columns();
    specs.push(ColumnSpec::custom("Path", "9p.path || 9p.newpath", -1));
    specs
}

/// Run the frames of a capture through `engine`, with timestamps one second apart
fn run(engine: &mut Engine, capture: &[(&[u8], bool)], reference: Option<usize>) -> Vec<DissectedPacket> {
    let mut timeline = FrameTimeline::new(6);
    capture
        .iter()
        .enumerate()
        .map(|(i, (data, up))| {
            let ts = NsTime::new(1_600_000_000 + i as i64, 250_000);
            let f = timeline.next_frame(ts, data.len() as u32, reference == Some(i));
            let f = if *up {
                f.with_endpoints(PortType::Tcp, client(), server())
            } else {
                f.with_endpoints(PortType::Tcp, server(), client())
            };
            engine.dissect(&f, data)
        })
        .collect()
}

#[test]
fn test_engine_rows() {
    let mut engine = Engine::new(Preferences::default(), &columns());
    let rows = run(&mut engine, &[(TATTACH, true), (TWALK, true), (RWALK, false)], Some(1));

    let r = &rows[0].row;
    assert_eq!(r.text(ColumnFormat::Number), Some("1"));
    assert_eq!(r.text(ColumnFormat::ClsTime), Some("0.000000"));
    assert_eq!(r.text(ColumnFormat::DefSrc), Some("192.168.1.10"));
    assert_eq!(r.text(ColumnFormat::DefDst), Some("192.168.1.20"));
    assert_eq!(r.text(ColumnFormat::Protocol), Some("9P"));
    assert_eq!(r.text(ColumnFormat::PacketLength), Some("27"));
    assert_eq!(r.by_title("Path"), Some("/export"));

    // frame 2 is the time reference
    assert_eq!(rows[1].row.text(ColumnFormat::ClsTime), Some("*REF*"));
    assert_eq!(rows[2].row.text(ColumnFormat::ClsTime), Some("1.000000"));
    assert_eq!(rows[1].row.by_title("Path"), Some("/export/foo"));

    let path = rows[2]
        .row
        .cells
        .iter()
        .find(|c| c.title == "Path")
        .and_then(|c| c.filter.clone());
    assert_eq!(path.as_deref(), Some("9p.path == \"/export/foo\""));
    assert_eq!(rows[2].row.cells[0].filter.as_deref(), Some("frame.number == 3"));
}

#[test]
fn test_engine_reset_for_capture() {
    let mut engine = Engine::new(Preferences::default(), &columns());
    run(&mut engine, &[(TATTACH, true), (TWALK, true)], None);
    assert!(!engine.conversations().is_empty());
    engine.reset_for_capture();
    assert!(engine.conversations().is_empty());
    // the request of the response belongs to the previous capture
    let rows = run(&mut engine, &[(RWALK, false)], None);
    assert_eq!(rows[0].row.by_title("Path"), Some("<unknown>"));
    assert_eq!(rows[0].expert_named("9p.no_request").count(), 1);
}

#[test]
fn test_engine_ports() {
    let mut engine = Engine::new(Preferences::default(), &default_columns());
    let mut timeline = FrameTimeline::new(0);

    // 9P on a port that is not configured
    let f = timeline.next_frame(NsTime::new(1, 0), TATTACH.len() as u32, false).with_endpoints(
        PortType::Tcp,
        client(),
        Endpoint::new(Ipv4Addr::new(192, 168, 1, 20), 5640),
    );
    let p = engine.dissect(&f, TATTACH);
    assert_eq!(p.protocol(), Some("TCP"));
    assert_eq!(p.info(), Some("50000 → 5640 Len=27"));

    // 9P port, but over UDP
    let f = timeline.next_frame(NsTime::new(2, 0), 4, false).with_endpoints(
        PortType::Udp,
        client(),
        server(),
    );
    let p = engine.dissect(&f, b"abcd");
    assert_eq!(p.protocol(), Some("UDP"));
    assert!(p.tree.find("data.data").is_some());

    let mut prefs = Preferences::default();
    prefs.ninep.tcp_port = 5640;
    let mut engine = Engine::new(prefs, &default_columns());
    let f = FrameContext {
        number: 1,
        ..FrameContext::default()
    }
    .with_endpoints(
        PortType::Tcp,
        client(),
        Endpoint::new(Ipv4Addr::new(192, 168, 1, 20), 5640),
    );
    assert_eq!(engine.dissect(&f, TATTACH).protocol(), Some("9P"));
}

#[test]
fn test_engine_lbtru_analysis_can_be_disabled() {
    let mut prefs = Preferences::default();
    prefs.lbtru.sequence_analysis = false;
    let mut engine = Engine::new(prefs, &default_columns());
    let data = hex!("00 00 0000 00000001 00000000");
    let f = FrameContext {
        number: 1,
        ..FrameContext::default()
    }
    .with_endpoints(
        PortType::Udp,
        Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 14380),
        Endpoint::new(Ipv4Addr::new(10, 0, 0, 2), 14360),
    );
    let p = engine.dissect(&f, &data);
    assert_eq!(p.protocol(), Some("LBT-RU"));
    assert!(p.tree.find("lbtru.transport").is_none());
}
