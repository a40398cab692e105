//! HTTP collector client against a local stand-in collector.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crowd_monitor::transport::{Collector, HttpCollector, ReportOutcome};

/// Serve exactly one request, answering with `status`, and hand back the
/// request line.
fn one_shot_collector(status_line: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub collector");
    let addr = listener.local_addr().expect("stub collector addr");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let request = read_head(&mut stream);
        let request_line = request.lines().next().unwrap_or_default().to_string();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status_line
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = tx.send(request_line);
    });
    (format!("http://{}", addr), rx)
}

fn read_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[test]
fn http_200_is_delivered() {
    let (base, requests) = one_shot_collector("200 OK");
    let client = HttpCollector::new(&base, Duration::from_secs(5)).expect("client");

    let outcome = client.send(3, 30.0);
    assert_eq!(outcome, ReportOutcome::Delivered);

    let request_line = requests
        .recv_timeout(Duration::from_secs(5))
        .expect("request seen");
    assert_eq!(
        request_line,
        "POST /api/crowd-detection/save?crowdCount=3&confidence=30.0 HTTP/1.1"
    );
}

#[test]
fn zero_count_is_sent_as_zero() {
    let (base, requests) = one_shot_collector("200 OK");
    let client = HttpCollector::new(&base, Duration::from_secs(5)).expect("client");

    assert!(client.send(0, 0.0).is_delivered());
    let request_line = requests
        .recv_timeout(Duration::from_secs(5))
        .expect("request seen");
    assert!(request_line.contains("crowdCount=0&confidence=0.0"));
}

#[test]
fn non_200_status_is_rejected() {
    let (base, _requests) = one_shot_collector("500 Internal Server Error");
    let client = HttpCollector::new(&base, Duration::from_secs(5)).expect("client");
    assert_eq!(client.send(1, 10.0), ReportOutcome::Rejected { status: 500 });
}

#[test]
fn other_success_codes_are_rejected() {
    let (base, _requests) = one_shot_collector("201 Created");
    let client = HttpCollector::new(&base, Duration::from_secs(5)).expect("client");
    assert_eq!(client.send(1, 10.0), ReportOutcome::Rejected { status: 201 });
}

#[test]
fn redirect_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub collector");
    let addr = listener.local_addr().expect("stub collector addr");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // Redirect the first request; answer 200 to anything that follows it.
        for (n, conn) in listener.incoming().take(2).enumerate() {
            let Ok(mut stream) = conn else { break };
            let request = read_head(&mut stream);
            let _ = tx.send(request.lines().next().unwrap_or_default().to_string());
            let response = if n == 0 {
                "HTTP/1.1 302 Found\r\nLocation: /elsewhere\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            } else {
                "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            };
            let _ = stream.write_all(response.as_bytes());
        }
    });

    let client = HttpCollector::new(&format!("http://{}", addr), Duration::from_secs(5))
        .expect("client");
    assert_eq!(client.send(2, 20.0), ReportOutcome::Rejected { status: 302 });

    let first = rx.recv_timeout(Duration::from_secs(5)).expect("request seen");
    assert!(first.starts_with("POST /api/crowd-detection/save?crowdCount=2&confidence=20.0"));
    assert!(
        rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "redirect must not be followed"
    );
}

#[test]
fn closed_port_is_unreachable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let client =
        HttpCollector::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2))
            .expect("client");
    assert!(matches!(
        client.send(2, 20.0),
        ReportOutcome::Unreachable { .. }
    ));
}

#[test]
fn silent_collector_times_out_as_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (done_tx, done_rx) = mpsc::channel::<()>();
    thread::spawn(move || {
        // Hold the connection open without answering.
        let _conn = listener.accept();
        let _ = done_rx.recv_timeout(Duration::from_secs(5));
    });

    let client = HttpCollector::new(&format!("http://{}", addr), Duration::from_millis(300))
        .expect("client");
    let outcome = client.send(4, 40.0);
    let _ = done_tx.send(());
    assert!(matches!(outcome, ReportOutcome::Unreachable { .. }));
}
