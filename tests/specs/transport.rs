// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Accord Contributors

//! Transport specs: fifo lifecycle, handshakes, typed payloads.

use crate::prelude::*;

#[test]
fn fifo_create_and_remove() {
    let (_dir, path) = fifo_path("lifecycle.fifo");

    let mut queue = Queue::new(&path);
    assert_eq!(queue.state(), QueueState::New);
    queue.create().expect("create");
    assert!(queue.exists());
    assert_eq!(queue.state(), QueueState::Created);

    queue.remove().expect("remove");
    assert!(!queue.exists());
    assert_eq!(queue.state(), QueueState::Removed);
}

#[tokio::test]
async fn initialize_reply_handshake() {
    let (_dir, path) = fifo_path("handshake.fifo");
    let (mut server_rx, client_tx) = fifo_ends(&path).await;

    // Reply direction runs over an anonymous pipe.
    let (mut client_rx, server_tx) = Queue::pipe_pair().expect("pipe pair");

    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let mut done_tx = Some(done_tx);
    let mut init = Message::new(Command::Initialize);
    init.write_string("member-1").expect("member name");
    client_tx
        .send_request(
            &client_rx,
            init,
            Box::new(move |reply| {
                if let Some(tx) = done_tx.take() {
                    let _ = tx.send(reply.command());
                }
            }),
        )
        .await
        .expect("send initialize");

    struct NoCommands;
    #[async_trait::async_trait]
    impl MessageHandler for NoCommands {
        async fn on_message(&self, message: Message) {
            assert_eq!(message.command(), Command::QueueHup);
        }
    }
    let dispatcher =
        Dispatcher::attach(&mut client_rx, Arc::new(NoCommands)).expect("attach");

    // Server: acknowledge the initialize.
    let mut request = server_rx.get_message().await.expect("request");
    assert_eq!(request.command(), Command::Initialize);
    assert_eq!(request.read_string().expect("member name"), "member-1");
    server_tx.send_message(&Message::reply_to(&request)).await.expect("reply");

    assert_eq!(done_rx.await.expect("handshake"), Command::Reply);
    dispatcher.detach().await;
}

#[tokio::test]
async fn typed_payload_round_trip_over_fifo() {
    let (_dir, path) = fifo_path("typed.fifo");
    let (mut receiver, sender) = fifo_ends(&path).await;

    let mut msg = Message::new(Command::CommitChange);
    msg.write_int(-7);
    msg.write_uint(u32::MAX);
    msg.write_long(1 << 40);
    msg.write_string("uid-1234").expect("string");
    msg.write_data(b"BEGIN:VCARD\r\nEND:VCARD\r\n").expect("data");
    sender.send_message(&msg).await.expect("send");

    let mut got = receiver.get_message().await.expect("receive");
    assert_eq!(got.command(), Command::CommitChange);
    assert_eq!(got.read_int().expect("int"), -7);
    assert_eq!(got.read_uint().expect("uint"), u32::MAX);
    assert_eq!(got.read_long().expect("long"), 1 << 40);
    assert_eq!(got.read_string().expect("string"), "uid-1234");
    assert_eq!(got.read_data().expect("data"), b"BEGIN:VCARD\r\nEND:VCARD\r\n");
}

#[tokio::test]
async fn error_reply_round_trip() {
    let (mut receiver, sender) = Queue::pipe_pair().expect("pipe pair");

    let mut request = Message::new(Command::Connect);
    request.write_string("member-9").expect("member name");
    sender.send_message(&request).await.expect("send");

    let got = receiver.get_message().await.expect("receive");
    let error = Message::error_reply_to(&got, "no such member").expect("error reply");
    assert!(error.is_error());
    assert_eq!(error.id(), got.id());
}
