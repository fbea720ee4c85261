// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Volume and teardown specs: many messages, huge payloads, hangup
//! signaling, and request floods.

use crate::prelude::*;

fn patterned(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}

#[tokio::test]
async fn thousand_messages_keep_order_and_bytes() {
    let (_dir, path) = fifo_path("stress.fifo");
    let (mut receiver, sender) = fifo_ends(&path).await;

    // The total exceeds the pipe buffer, so the writer must make
    // progress concurrently with the reader.
    let writer = tokio::spawn(async move {
        for i in 0..1000u32 {
            let mut msg = Message::new(Command::NewChange);
            msg.write_uint(i);
            msg.write_data(&patterned(i as u8, 100)).expect("data");
            sender.send_message(&msg).await.expect("send");
        }
        sender
    });

    for i in 0..1000u32 {
        let mut msg = receiver.get_message().await.expect("receive");
        assert_eq!(msg.read_uint().expect("seq"), i);
        assert_eq!(msg.read_data().expect("body"), patterned(i as u8, 100));
    }

    writer.await.expect("writer task");
}

#[tokio::test]
async fn twenty_megabyte_payload_round_trips() {
    let (_dir, path) = fifo_path("large.fifo");
    let (mut receiver, sender) = fifo_ends(&path).await;

    let blob = patterned(42, 20 * 1024 * 1024);
    let expected = blob.clone();

    let writer = tokio::spawn(async move {
        let mut msg = Message::new(Command::CommitChange);
        msg.write_data(&blob).expect("data");
        sender.send_message(&msg).await.expect("send blob");
    });

    let mut got = receiver.get_message().await.expect("receive blob");
    assert_eq!(got.read_data().expect("blob"), expected);
    writer.await.expect("writer task");
}

#[tokio::test]
async fn hangup_arrives_after_every_message() {
    let (_dir, path) = fifo_path("hup.fifo");
    let (mut receiver, mut sender) = fifo_ends(&path).await;

    for i in 0..50u32 {
        let mut msg = Message::new(Command::NewChange);
        msg.write_uint(i);
        sender.send_message(&msg).await.expect("send");
    }
    sender.disconnect().await.expect("disconnect");

    for i in 0..50u32 {
        let mut msg = receiver.get_message().await.expect("receive");
        assert_eq!(msg.command(), Command::NewChange);
        assert_eq!(msg.read_uint().expect("seq"), i);
    }

    let hup = receiver.get_message().await.expect("hup");
    assert_eq!(hup.command(), Command::QueueHup);
    assert!(receiver.get_message().await.is_none(), "exactly one hup, then silence");
}

#[tokio::test]
async fn thousand_requests_each_answered_once() {
    let (mut to_server_rx, to_server_tx) = Queue::pipe_pair().expect("request pipe");
    let (mut from_server_rx, from_server_tx) = Queue::pipe_pair().expect("reply pipe");

    struct Ignore;
    #[async_trait::async_trait]
    impl MessageHandler for Ignore {
        async fn on_message(&self, _message: Message) {}
    }
    let dispatcher = Dispatcher::attach(&mut from_server_rx, Arc::new(Ignore)).expect("attach");

    // Server: echo a reply for every request.
    let server = tokio::spawn(async move {
        for _ in 0..1000 {
            let mut request = to_server_rx.get_message().await.expect("request");
            let n = request.read_uint().expect("seq");
            let mut reply = Message::reply_to(&request);
            reply.write_uint(n);
            from_server_tx.send_message(&reply).await.expect("reply");
        }
    });

    let (fired_tx, mut fired_rx) = tokio::sync::mpsc::unbounded_channel();
    for i in 0..1000u32 {
        let fired_tx = fired_tx.clone();
        let mut request = Message::new(Command::CallPlugin);
        request.write_uint(i);
        to_server_tx
            .send_request(
                &from_server_rx,
                request,
                Box::new(move |mut reply| {
                    assert!(!reply.is_error());
                    let _ = fired_tx.send(reply.read_uint().expect("echo"));
                }),
            )
            .await
            .expect("send request");
    }
    drop(fired_tx);

    let mut answered = std::collections::HashSet::new();
    while let Some(n) = fired_rx.recv().await {
        assert!(answered.insert(n), "request {n} answered twice");
    }
    assert_eq!(answered.len(), 1000);

    server.await.expect("server task");
    dispatcher.detach().await;
}
