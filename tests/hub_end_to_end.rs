//! End-to-end behavior of the hub over real WebSocket connections.
//!
//! Each test binds the hub on an ephemeral port, points it at a local mock
//! rate archive, and talks to it with ordinary WebSocket clients.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ratecast_core::ReportDate;
use ratecast_hub::{Hub, HubConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// Answers every archive request with EUR/USD rates for the requested date.
struct EchoArchive;

impl Respond for EchoArchive {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let date = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "date")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();

        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "date": date,
            "bank": "PB",
            "exchangeRate": [
                {"currency": "EUR", "saleRate": 42.5, "purchaseRate": 41.5},
                {"currency": "GBP", "saleRate": 50.0, "purchaseRate": 49.0},
                {"currency": "USD", "saleRate": 39.5, "purchaseRate": 38.75}
            ]
        }))
    }
}

async fn start_upstream() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p24api/exchange_rates"))
        .respond_with(EchoArchive)
        .mount(&server)
        .await;
    server
}

async fn start_hub(upstream: &MockServer) -> (SocketAddr, Hub) {
    let config = HubConfig {
        bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        rate_source_url: format!("{}/p24api/exchange_rates", upstream.uri()),
        request_timeout_ms: 2_000,
        ..HubConfig::default()
    };
    let hub = config.build_hub().expect("valid config");
    let listener = TcpListener::bind(config.bind).await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(hub.clone().serve(listener, std::future::pending()));
    (addr, hub)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/"))
        .await
        .expect("websocket handshake");
    client
}

async fn wait_for_peers(hub: &Hub, expected: usize) {
    tokio::time::timeout(WAIT, async {
        while hub.registry().len().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("registry reaches expected size");
}

async fn next_text(client: &mut Client) -> String {
    tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("connection ended unexpectedly: {other:?}"),
            }
        }
    })
    .await
    .expect("message arrives in time")
}

async fn say(client: &mut Client, text: &str) {
    client
        .send(Message::Text(text.to_owned()))
        .await
        .expect("send succeeds");
}

// =============================================================================
// Hub: Chat Fan-out
// =============================================================================

#[tokio::test]
async fn when_a_peer_chats_every_peer_receives_the_named_line() {
    // Given: Three connected peers
    let upstream = start_upstream().await;
    let (addr, hub) = start_hub(&upstream).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut c = connect(addr).await;
    wait_for_peers(&hub, 3).await;

    // When: A says hi
    say(&mut a, "hi").await;

    // Then: B and C (and A) receive the same "<name>: hi" line
    let seen_by_a = next_text(&mut a).await;
    let seen_by_b = next_text(&mut b).await;
    let seen_by_c = next_text(&mut c).await;
    assert!(seen_by_b.ends_with(": hi"), "got {seen_by_b:?}");
    assert!(seen_by_b.len() > ": hi".len(), "display name is present");
    assert_eq!(seen_by_a, seen_by_b);
    assert_eq!(seen_by_b, seen_by_c);
}

// =============================================================================
// Hub: Exchange Reports
// =============================================================================

#[tokio::test]
async fn when_a_peer_requests_exchange_every_peer_receives_the_report() {
    // Given: Three connected peers and an upstream with data for every date
    let upstream = start_upstream().await;
    let (addr, hub) = start_hub(&upstream).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut c = connect(addr).await;
    wait_for_peers(&hub, 3).await;

    // When: B asks for two days
    say(&mut b, "exchange 2").await;

    // Then: All three receive one identical two-date report, newest first
    let report = next_text(&mut a).await;
    assert_eq!(next_text(&mut b).await, report);
    assert_eq!(next_text(&mut c).await, report);

    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 6, "two dates with EUR and USD each: {report}");
    let newest = ReportDate::parse(lines[0]).expect("first line is a date");
    let oldest = ReportDate::parse(lines[3]).expect("fourth line is a date");
    assert!(newest > oldest, "most recent date comes first");
    assert_eq!(lines[1], "EUR: {sale: 42.5, purchase: 41.5}");
    assert_eq!(lines[2], "USD: {sale: 39.5, purchase: 38.75}");
    assert!(!report.contains("GBP"), "untracked currency is filtered out");

    assert_eq!(upstream.received_requests().await.map(|r| r.len()), Some(2));
}

#[tokio::test]
async fn when_exchange_argument_is_not_numeric_everyone_sees_the_diagnostic() {
    let upstream = start_upstream().await;
    let (addr, hub) = start_hub(&upstream).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_peers(&hub, 2).await;

    say(&mut a, "exchange three").await;

    let expected = "exchange: first argument must be numeric";
    assert_eq!(next_text(&mut a).await, expected);
    assert_eq!(next_text(&mut b).await, expected);
    assert_eq!(upstream.received_requests().await.map(|r| r.len()), Some(0));
}

#[tokio::test]
async fn when_one_peer_chats_after_exchange_its_messages_stay_in_order() {
    let upstream = start_upstream().await;
    let (addr, hub) = start_hub(&upstream).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_peers(&hub, 2).await;

    say(&mut a, "exchange 1").await;
    say(&mut a, "thanks").await;

    let first = next_text(&mut b).await;
    let second = next_text(&mut b).await;
    assert!(ReportDate::parse(first.lines().next().unwrap_or_default()).is_ok());
    assert!(second.ends_with(": thanks"), "got {second:?}");
}

// =============================================================================
// Hub: Membership Changes
// =============================================================================

#[tokio::test]
async fn when_a_peer_disconnects_it_is_deregistered_and_others_keep_chatting() {
    // Given: Three peers, one of which leaves
    let upstream = start_upstream().await;
    let (addr, hub) = start_hub(&upstream).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut c = connect(addr).await;
    wait_for_peers(&hub, 3).await;

    c.close(None).await.expect("close handshake starts");
    drop(c);
    wait_for_peers(&hub, 2).await;

    // When: A keeps chatting
    say(&mut a, "still here?").await;

    // Then: Both remaining peers receive it
    assert!(next_text(&mut a).await.ends_with(": still here?"));
    assert!(next_text(&mut b).await.ends_with(": still here?"));
    assert_eq!(hub.registry().names().await.len(), 2);
}
