//! Criterion benchmark for the order parser — the hottest path on a
//! deadline night, when every power's mail arrives at once.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dip_judge_engine::judge::orders;

const OPENING_ORDERS: &str = "\
F LON - NTH
F EDI - NWG
A LVP - YOR
F BRE - MAO
A PAR - BUR
A MAR - SPA
F KIE - DEN
A BER - KIE
A MUN - RUH
F NAP - ION
A ROM - VEN
A VEN - TYR
F TRI - ADR
A VIE - GAL
A BUD - SER
F ANK - BLA
A CON - BUL
A SMY - CON
F STP/SC - BOT
F SEV - BLA
A WAR - UKR
A MOS - SEV";

fn bench_single_orders(c: &mut Criterion) {
    c.bench_function("parse_move", |b| {
        b.iter(|| orders::parse_line(black_box("F LON - NTH")))
    });
    c.bench_function("parse_support", |b| {
        b.iter(|| orders::parse_line(black_box("F BRE S A PAR - BUR")))
    });
    c.bench_function("parse_convoyed_move", |b| {
        b.iter(|| orders::parse_line(black_box("A LON - NWY VIA CONVOY")))
    });
    c.bench_function("parse_conditional_chain", |b| {
        b.iter(|| orders::parse_line(black_box("F LON-NTH ; F NWG-NTH | F LON-ENG")))
    });
    c.bench_function("reject_unknown_province", |b| {
        b.iter(|| orders::parse_line(black_box("F LON - MOON")))
    });
}

fn bench_order_block(c: &mut Criterion) {
    c.bench_function("parse_opening_block_22_orders", |b| {
        b.iter(|| orders::parse_block(black_box(OPENING_ORDERS)))
    });
}

criterion_group!(benches, bench_single_orders, bench_order_block);
criterion_main!(benches);
