//! HttpTransport against a loopback server

use picker_core::{
    FetcherConfig, HttpConfig, HttpTransport, Outcome, RequestDescriptor, ResilientFetcher,
    Transport, TransportError,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Serve one canned response per connection, reporting each raw request.
async fn serve(responses: Vec<String>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let _ = tx.send(request);
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}"), rx)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut raw = format!(
        "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n",
        body.len()
    );
    for (name, value) in headers {
        raw.push_str(&format!("{name}: {value}\r\n"));
    }
    raw.push_str("\r\n");
    raw.push_str(body);
    raw
}

#[tokio::test]
async fn test_success_through_fetcher() {
    let (base, mut requests) = serve(vec![response(
        "200 OK",
        &[("content-type", "application/json")],
        r#"{"data":{"user":{"username":"picker"}}}"#,
    )])
    .await;

    let transport = HttpTransport::with_defaults().unwrap();
    let fetcher = ResilientFetcher::new(FetcherConfig::minimal());
    let request = RequestDescriptor::get(format!("{base}/api/v1/users/web_profile_info"))
        .with_header("x-api-key", "test");

    let value = fetcher
        .fetch_json(&request, &transport, &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value["data"]["user"]["username"], "picker");

    let raw = requests.recv().await.unwrap().to_ascii_lowercase();
    assert!(raw.starts_with("get /api/v1/users/web_profile_info"));
    assert!(raw.contains("x-api-key: test"));
    assert!(raw.contains("user-agent: picker/"));
    assert!(raw.contains("accept: application/json"));
}

#[tokio::test]
async fn test_rate_limit_hint_survives_transport() {
    let (base, _requests) = serve(vec![response(
        "429 Too Many Requests",
        &[("Retry-After", "7")],
        "",
    )])
    .await;

    let transport = HttpTransport::with_defaults().unwrap();
    let result = transport.send(&RequestDescriptor::get(base)).await;
    let outcome = transport.classify(result);
    assert_eq!(
        outcome,
        Outcome::RateLimited {
            retry_after: Some("7".to_string())
        }
    );
}

#[tokio::test]
async fn test_not_found_and_server_error() {
    let (base, _requests) = serve(vec![
        response("404 Not Found", &[], "missing"),
        response("503 Service Unavailable", &[], ""),
    ])
    .await;

    let transport = HttpTransport::with_defaults().unwrap();
    let fetcher = ResilientFetcher::new(FetcherConfig::minimal());
    let cancel = CancellationToken::new();

    let first = fetcher
        .execute(&RequestDescriptor::get(base.clone()), &transport, &cancel)
        .await
        .unwrap();
    assert_eq!(first, Outcome::NotFound);

    let second = fetcher
        .execute(&RequestDescriptor::get(base), &transport, &cancel)
        .await
        .unwrap();
    assert_eq!(second, Outcome::ServerError { status: 503 });
}

#[tokio::test]
async fn test_post_body_is_sent() {
    let (base, mut requests) = serve(vec![response("200 OK", &[], r#"{"output":[]}"#)]).await;

    let transport = HttpTransport::with_defaults().unwrap();
    let request = RequestDescriptor::post(format!("{base}/v1/responses"), r#"{"input":"hi"}"#)
        .with_header("content-type", "application/json");
    let response = transport.send(&request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-length"), Some("13"));

    let raw = requests.recv().await.unwrap();
    assert!(raw.starts_with("POST /v1/responses"));
    assert!(raw.ends_with(r#"{"input":"hi"}"#));
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::with_defaults().unwrap();
    let result = transport
        .send(&RequestDescriptor::get(format!("http://{addr}/")))
        .await;
    assert!(matches!(result, Err(TransportError::Connect(_))));
    assert!(matches!(
        transport.classify(result),
        Outcome::TransportFailure { .. }
    ));
}

#[tokio::test]
async fn test_attempt_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let transport = HttpTransport::new(HttpConfig {
        timeout_secs: 1,
        ..HttpConfig::default()
    })
    .unwrap();
    let result = transport
        .send(&RequestDescriptor::get(format!("http://{addr}/")))
        .await;
    assert_eq!(result, Err(TransportError::Timeout));
}
