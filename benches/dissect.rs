use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hex_literal::hex;
use packet_dissect::*;
use std::net::Ipv4Addr;

static NINEP_SEGMENT: &[u8] = &hex!(
    "1b000000 68 0100 05000000 ffffffff 0100 75 0700 2f6578706f7274
     16000000 6e 0200 05000000 06000000 0100 0300 666f6f
     0b000000 78 0300 06000000"
);

static COLLECTD_PACKET: &[u8] = &hex!(
    "0000 0007 683100
     0002 0008 63707500
     0004 0009 6c6f616400
     0008 000c 0000000000000000
     0006 0018 0002 01 02 000000000000f83f 0000000000000007"
);

fn frame(number: u32, port_type: PortType, port: u16) -> FrameContext {
    FrameContext {
        number,
        ..FrameContext::default()
    }
    .with_endpoints(
        port_type,
        Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 40000),
        Endpoint::new(Ipv4Addr::new(10, 0, 0, 2), port),
    )
}

fn bench_ninep(c: &mut Criterion) {
    let mut engine = Engine::new(Preferences::default(), &default_columns());
    let f = frame(1, PortType::Tcp, 564);
    engine.dissect(&f, NINEP_SEGMENT);
    let f = f.revisited();
    c.bench_function("dissect 9p segment", |b| {
        b.iter(|| engine.dissect(black_box(&f), black_box(NINEP_SEGMENT)))
    });
}

fn bench_collectd(c: &mut Criterion) {
    let mut engine = Engine::new(Preferences::default(), &default_columns());
    let f = frame(1, PortType::Udp, 25826);
    c.bench_function("dissect collectd packet", |b| {
        b.iter(|| engine.dissect(black_box(&f), black_box(COLLECTD_PACKET)))
    });
}

fn bench_lbtru(c: &mut Criterion) {
    c.bench_function("dissect lbtru data stream", |b| {
        b.iter(|| {
            let mut engine = Engine::new(Preferences::default(), &default_columns());
            for n in 1..=64u32 {
                let mut data = hex!("00 00 0000 00000000 00000000 aa").to_vec();
                data[4..8].copy_from_slice(&n.to_be_bytes());
                let f = frame(n, PortType::Udp, 14380);
                black_box(engine.dissect(&f, &data));
            }
        })
    });
}

criterion_group!(benches, bench_ninep, bench_collectd, bench_lbtru);
criterion_main!(benches);
