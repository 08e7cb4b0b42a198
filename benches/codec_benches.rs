//! Codec throughput: request encoding, frame validation and response decoding.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ecovent::{
    build_request, encode_parameters, encode_read_all, parse_payload, DeviceState, FrameHeader,
    FunctionCode, ParamRequest, ResponseFrame,
};

/// A reply shaped like a full read from a real unit.
fn full_reply_records() -> Vec<ParamRequest> {
    vec![
        ParamRequest::write(0x0001, vec![0x01]),
        ParamRequest::write(0x0002, vec![0xFF]),
        ParamRequest::write(0x0006, vec![0x00]),
        ParamRequest::write(0x0007, vec![0x01]),
        ParamRequest::write(0x000B, vec![0x05, 0x1E, 0x02]),
        ParamRequest::write(0x000F, vec![0x01]),
        ParamRequest::write(0x0019, vec![60]),
        ParamRequest::write(0x0024, vec![0x01, 0x0C]),
        ParamRequest::write(0x0025, vec![0x37]),
        ParamRequest::write(0x0044, vec![0x99]),
        ParamRequest::write(0x004A, vec![0x4C, 0x04]),
        ParamRequest::write(0x004B, vec![0x50, 0x04]),
        ParamRequest::write(0x0064, vec![0x0F, 0x04, 0x5A]),
        ParamRequest::write(0x006F, vec![0x09, 0x08, 0x17]),
        ParamRequest::write(0x0070, vec![0x05, 0x02, 0x03, 0x18]),
        ParamRequest::write(0x007C, b"003A00345758520F".to_vec()),
        ParamRequest::write(0x007E, vec![0x01, 0x02, 0x2C, 0x01]),
        ParamRequest::write(0x0086, vec![0x00, 0x11, 0x0F, 0x06, 0xE6, 0x07]),
        ParamRequest::write(0x0095, b"home-network".to_vec()),
        ParamRequest::write(0x009C, vec![192, 168, 1, 30]),
        ParamRequest::write(0x00B7, vec![0x01]),
        ParamRequest::write(0x00B9, vec![0x05, 0x00]),
        ParamRequest::write(0x0302, vec![0x1E, 0x08]),
        ParamRequest::write(0x0303, vec![0x00, 0x02]),
        ParamRequest::write(0x0304, vec![0x00]),
    ]
}

fn benchmark_encode(c: &mut Criterion) {
    let header = FrameHeader::default();

    c.bench_function("encode_read_all_frame", |b| {
        b.iter(|| {
            let params = encode_read_all().unwrap();
            build_request(FunctionCode::Read, black_box(&params), &header).unwrap()
        })
    });

    c.bench_function("encode_write_frame", |b| {
        let requests = vec![
            ParamRequest::write(0x0044, vec![0x99]),
            ParamRequest::write(0x0002, vec![0xFF]),
        ];
        b.iter(|| {
            let params = encode_parameters(black_box(&requests)).unwrap();
            build_request(FunctionCode::WriteReturn, &params, &header).unwrap()
        })
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let header = FrameHeader::default();
    let records = full_reply_records();
    let mut group = c.benchmark_group("decode_reply");

    for count in [1usize, 8, records.len()] {
        let params = encode_parameters(&records[..count]).unwrap();
        let frame = build_request(FunctionCode::Response, &params, &header).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(count), &frame, |b, frame| {
            b.iter(|| {
                let response = ResponseFrame::from_bytes(black_box(frame)).unwrap();
                DeviceState::from_payload(&response.parameters().unwrap())
            })
        });
    }
    group.finish();

    let params = encode_parameters(&records).unwrap();
    c.bench_function("parse_payload_only", |b| {
        b.iter(|| parse_payload(black_box(&params)).unwrap())
    });
}

criterion_group!(benches, benchmark_encode, benchmark_decode);
criterion_main!(benches);
