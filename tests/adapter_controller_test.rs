use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use tui_gems::adapter::{
    create_hello, run_server, InboundCommand, OutboundMessage, ServerConfig, ServerStatus,
    PROTOCOL_VERSION,
};

async fn connect(addr: SocketAddr) -> (Lines<BufReader<OwnedReadHalf>>, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (r, w) = stream.into_split();
    (BufReader::new(r).lines(), w)
}

async fn send(w: &mut OwnedWriteHalf, line: &str) {
    w.write_all(line.as_bytes()).await.unwrap();
    w.write_all(b"\n").await.unwrap();
    w.flush().await.unwrap();
}

async fn recv(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timed out waiting for a line")
        .unwrap()
        .expect("connection closed");
    serde_json::from_str(&line).unwrap()
}

fn hello(seq: u64, name: &str) -> String {
    serde_json::to_string(&create_hello(seq, name, PROTOCOL_VERSION)).unwrap()
}

#[tokio::test]
async fn adapter_controller_handover() {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let status = std::sync::Arc::new(ServerStatus::default());
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<InboundCommand>(16);
    let (_out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();
    let server_status = std::sync::Arc::clone(&status);
    tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx), Some(server_status)).await;
    });
    let addr = ready_rx.await.unwrap();
    assert_eq!(status.listen_addr(), Some(addr));

    let (mut r1, mut w1) = connect(addr).await;
    send(&mut w1, &hello(1, "first")).await;
    let welcome1 = recv(&mut r1).await;
    assert_eq!(welcome1["role"], "controller");
    let id1 = welcome1["client_id"].as_u64().unwrap();

    let (mut r2, mut w2) = connect(addr).await;
    send(&mut w2, &hello(1, "second")).await;
    let welcome2 = recv(&mut r2).await;
    assert_eq!(welcome2["role"], "observer");
    assert_eq!(welcome2["controller_id"], id1);
    let id2 = welcome2["client_id"].as_u64().unwrap();

    assert_eq!(status.client_count(), 2);
    assert_eq!(status.controller_id(), Some(id1 as usize));

    // Observers may not command or claim while the controller is present.
    send(
        &mut w2,
        r#"{"type":"command","seq":2,"ts":1,"mode":"action","actions":["pause"]}"#,
    )
    .await;
    assert_eq!(recv(&mut r2).await["code"], "not_controller");
    send(&mut w2, r#"{"type":"control","seq":3,"ts":1,"action":"claim"}"#).await;
    assert_eq!(recv(&mut r2).await["code"], "controller_active");

    // Release, then the observer can claim.
    send(&mut w1, r#"{"type":"control","seq":2,"ts":1,"action":"release"}"#).await;
    assert_eq!(recv(&mut r1).await["type"], "ack");
    send(&mut w2, r#"{"type":"control","seq":4,"ts":1,"action":"claim"}"#).await;
    assert_eq!(recv(&mut r2).await["type"], "ack");
    assert_eq!(status.controller_id(), Some(id2 as usize));

    // Closing the controller hands control back to the remaining client.
    drop(w2);
    drop(r2);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while status.controller_id() != Some(id1 as usize) {
        assert!(tokio::time::Instant::now() < deadline, "controller not promoted");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status.client_count(), 1);

    while cmd_rx.try_recv().is_ok() {}
    send(
        &mut w1,
        r#"{"type":"command","seq":3,"ts":1,"mode":"action","actions":["pause"]}"#,
    )
    .await;
    let cmd = tokio::time::timeout(Duration::from_secs(2), cmd_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cmd.client_id as u64, id1);
}
