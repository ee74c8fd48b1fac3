//! Exit codes of the `harvest-keeper price` command
//!
//! A local socket answers every JSON-RPC request with the same canned
//! `latestRoundData()` word list. `decimals()` decodes its first word, which is
//! the round id, so rounds here use small ids.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::thread;

const FEED: &str = "0x5f4ec3df9cbd43714fe2740f5e3616155c5b8419";

fn word(v: i128) -> String {
    let mut w = if v < 0 { [0xffu8; 32] } else { [0u8; 32] };
    w[16..].copy_from_slice(&v.to_be_bytes());
    hex::encode(w)
}

fn round_result(round_id: i128, answer: i128, started_at: i128, updated_at: i128) -> String {
    format!(
        "0x{}{}{}{}{}",
        word(round_id),
        word(answer),
        word(started_at),
        word(updated_at),
        word(round_id)
    )
}

fn handle(mut stream: TcpStream, body: &str) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        request.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&request);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if request.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Serve `result` to every `eth_call`; returns the endpoint URL.
fn serve_rpc(result: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let body = format!(r#"{{"jsonrpc":"2.0","id":1,"result":"{}"}}"#, result);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            handle(stream, &body);
        }
    });
    url
}

fn run_price(rpc_url: &str, extra: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_harvest-keeper"));
    cmd.arg("price")
        .args(["--feed", FEED])
        .args(extra)
        .env("RPC_URL", rpc_url)
        .env("PRICE_FEED_ADDRESS", FEED)
        .env("NO_PROXY", "127.0.0.1")
        .env("no_proxy", "127.0.0.1");
    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        cmd.env_remove(var);
    }
    cmd.output().expect("failed to run harvest-keeper")
}

#[test]
fn test_rejected_round_exits_with_valuation_unavailable() {
    let url = serve_rpc(round_result(3, -5, 100, 100));
    let output = run_price(&url, &["--stale-after", "off"]);
    assert_eq!(
        output.status.code(),
        Some(2),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn test_accepted_round_exits_cleanly_with_report() {
    // Round id 3 doubles as decimals: 2_000 / 10^3 = 2.0
    let url = serve_rpc(round_result(3, 2_000, 100, 100));
    let output = run_price(&url, &["--stale-after", "off"]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["value"], 2.0);
    assert_eq!(report["feed"], FEED);
}

#[test]
fn test_zero_window_rejects_old_round() {
    let url = serve_rpc(round_result(3, 2_000, 100, 100));
    let output = run_price(&url, &["--stale-after", "0"]);
    assert_eq!(output.status.code(), Some(2));
}
