// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Conversion specs: registry graphs driven end to end, including
//! samples delivered over a queue.

use crate::prelude::*;

/// plain <-> wrapped via envelope markers, plus a detector that
/// recognizes wrapped bytes.
fn envelope_registry() -> FormatRegistry {
    let mut reg = FormatRegistry::new();
    reg.register_format("plain", "note").expect("plain");
    reg.register_format("wrapped", "note").expect("wrapped");

    reg.register_converter(
        ConverterKind::Encap,
        "plain",
        "wrapped",
        Box::new(|bytes, _| {
            let mut out = b"ENV:".to_vec();
            out.extend_from_slice(bytes);
            Ok(out)
        }),
    )
    .expect("encap");
    reg.register_converter(
        ConverterKind::Decap,
        "wrapped",
        "plain",
        Box::new(|bytes, _| {
            bytes
                .strip_prefix(b"ENV:".as_slice())
                .map(<[u8]>::to_vec)
                .ok_or_else(|| FormatError::MalformedInput("missing envelope".into()))
        }),
    )
    .expect("decap");
    reg.register_detector("wrapped", "plain", Box::new(|bytes| bytes.starts_with(b"ENV:")))
        .expect("detector");

    reg
}

#[test]
fn envelope_round_trip() {
    let reg = envelope_registry();
    let plain = reg.find_format("plain").expect("plain id");
    let wrapped = reg.find_format("wrapped").expect("wrapped id");

    let mut data = Data::new(b"hello world".to_vec(), plain);
    let there = reg.find_path(&data, &[wrapped], None).expect("path to wrapped");
    reg.apply_path(&there, &mut data).expect("wrap");
    assert_eq!(data.bytes(), b"ENV:hello world");

    let back = reg.find_path(&data, &[plain], None).expect("path to plain");
    reg.apply_path(&back, &mut data).expect("unwrap");
    assert_eq!(data.bytes(), b"hello world");
    assert_eq!(data.format(), plain);
}

#[tokio::test]
async fn sample_converted_after_queue_delivery() {
    let (mut receiver, sender) = Queue::pipe_pair().expect("pipe pair");

    // Peer ships a wrapped sample, naming its format in the payload.
    let mut msg = Message::new(Command::CommitChange);
    msg.write_string("wrapped").expect("format name");
    msg.write_data(b"ENV:BEGIN:VCARD").expect("sample");
    sender.send_message(&msg).await.expect("send sample");

    let reg = envelope_registry();
    let plain = reg.find_format("plain").expect("plain id");

    let mut got = receiver.get_message().await.expect("receive sample");
    let format_name = got.read_string().expect("format name");
    let sample = got.read_data().expect("sample bytes");
    let format = reg.find_format(&format_name).expect("named format");

    let mut data = Data::new(sample, format);
    let path = reg.find_path(&data, &[plain], None).expect("path");
    reg.apply_path(&path, &mut data).expect("convert");

    assert_eq!(data.bytes(), b"BEGIN:VCARD");
    assert_eq!(data.format(), plain);
}

#[tokio::test]
async fn detected_format_matches_peer_claim() {
    let (mut receiver, sender) = Queue::pipe_pair().expect("pipe pair");

    let mut msg = Message::new(Command::NewChange);
    msg.write_data(b"ENV:payload").expect("sample");
    sender.send_message(&msg).await.expect("send");

    let reg = envelope_registry();
    let mut got = receiver.get_message().await.expect("receive");
    let sample = got.read_data().expect("sample");

    // The walk unwraps the envelope and lands on plain.
    let detected = reg.detect_format(&sample, "wrapped").expect("detect");
    assert_eq!(detected, reg.find_format("plain").expect("plain id"));
}

#[test]
fn converted_sample_survives_failed_second_leg() {
    let mut reg = envelope_registry();
    reg.register_format("exotic", "note").expect("exotic");
    reg.register_converter(
        ConverterKind::Conv,
        "plain",
        "exotic",
        Box::new(|_, _| Err(FormatError::MalformedInput("unsupported".into()))),
    )
    .expect("conv");

    let wrapped = reg.find_format("wrapped").expect("wrapped id");
    let exotic = reg.find_format("exotic").expect("exotic id");

    let mut data = Data::new(b"ENV:note".to_vec(), wrapped);
    let path = reg.find_path(&data, &[exotic], None).expect("path");
    let err = reg.apply_path(&path, &mut data).expect_err("conversion fails");
    assert!(matches!(err, FormatError::ConvertFailed { .. }));

    // Rollback: the sample is still wrapped, untouched.
    assert_eq!(data.bytes(), b"ENV:note");
    assert_eq!(data.format(), wrapped);
}
