//! Benchmarks for signing and the XML codec.
//!
//! Run with: `cargo bench --bench codec_throughput`

#![allow(missing_docs, reason = "Benchmark functions are self-documenting")]
#![allow(clippy::unwrap_used, reason = "Benchmark inputs are fixed")]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use weixinpay::{
    sign::{SignType, sign},
    value::{ParamMap, Value},
    xml,
};

const KEY: &str = "192006250b4c09247ec02edce69f6a2d";

/// A unified order request with the usual optional fields set.
fn order_params() -> ParamMap {
    [
        ("appid", "wx2421b1c4370ec43b"),
        ("attach", "payment test"),
        ("body", "JSAPI payment test"),
        ("mch_id", "10000100"),
        ("nonce_str", "1add1a30ac87aa2db72f57a2375d8fec"),
        ("notify_url", "https://merchant.example.com/notify"),
        ("openid", "oUpF8uMuAJO_M2pxb1Q9zNjWeS6o"),
        ("out_trade_no", "1415659990"),
        ("spbill_create_ip", "14.23.150.211"),
        ("total_fee", "1"),
        ("trade_type", "JSAPI"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_owned(), Value::from(value)))
    .collect()
}

fn bench_sign(c: &mut Criterion) {
    let params = order_params();
    let mut group = c.benchmark_group("sign");

    for sign_type in [SignType::Md5, SignType::HmacSha256] {
        group.bench_with_input(BenchmarkId::from_parameter(sign_type), &sign_type, |b, &sign_type| {
            b.iter(|| sign(black_box(&params), black_box(KEY), sign_type));
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let params = order_params();
    let document = xml::encode(xml::ROOT, &params);

    c.bench_function("xml_encode", |b| b.iter(|| xml::encode(xml::ROOT, black_box(&params))));
    c.bench_function("xml_decode", |b| b.iter(|| xml::decode(black_box(&document)).unwrap()));

    let coupons: String = (0..20).map(|i| format!("<coupon_id>{i}</coupon_id>")).collect();
    let folded = format!("<xml><return_code>SUCCESS</return_code>{coupons}</xml>");
    c.bench_function("xml_decode_folded", |b| b.iter(|| xml::decode(black_box(&folded)).unwrap()));
}

criterion_group!(benches, bench_sign, bench_codec);
criterion_main!(benches);
