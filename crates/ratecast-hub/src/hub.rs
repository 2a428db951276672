//! Connection wiring: WebSocket upgrade, per-peer read loop, dispatch.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use ratecast_core::{classify, Aggregator, Command};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_OUTBOUND_BUFFER;
use crate::registry::{Peer, Registry};

/// Broadcast when an exchange request produced no dated reports.
pub const EMPTY_REPORT_NOTICE: &str = "no exchange rates available for the requested window";

/// Shared state behind every connection: the registry and the aggregator.
#[derive(Clone)]
pub struct Hub {
    registry: Arc<Registry>,
    aggregator: Arc<Aggregator>,
    outbound_buffer: usize,
}

impl Hub {
    pub fn new(aggregator: Aggregator) -> Self {
        Self::with_registry(Registry::new(), aggregator)
    }

    pub fn with_registry(registry: Registry, aggregator: Aggregator) -> Self {
        Self {
            registry: Arc::new(registry),
            aggregator: Arc::new(aggregator),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    pub fn with_outbound_buffer(mut self, outbound_buffer: usize) -> Self {
        self.outbound_buffer = outbound_buffer.max(1);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Router serving the chat socket on `/`.
    pub fn router(self) -> Router {
        Router::new().route("/", get(upgrade)).with_state(self)
    }

    /// Accept connections on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }

    /// Drive one connection from registration to deregistration.
    pub async fn handle_socket(self, socket: WebSocket, remote: SocketAddr) {
        let (mut sink, mut stream) = socket.split();
        let (outbound, mut queue) = mpsc::channel::<String>(self.outbound_buffer);

        let peer = self.registry.add(outbound).await;
        info!(peer = %peer.id(), name = peer.name(), %remote, "peer connected");

        let writer = tokio::spawn(async move {
            while let Some(text) = queue.recv().await {
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        while let Some(frame) = stream.next().await {
            if !peer.is_active() {
                break;
            }
            match frame {
                Ok(Message::Text(text)) => {
                    self.handle_text(&peer, &text).await;
                }
                Ok(Message::Close(_)) => {
                    debug!(peer = %peer.id(), "close frame received");
                    break;
                }
                Ok(Message::Binary(_)) => {
                    debug!(peer = %peer.id(), "ignoring binary frame");
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(error) => {
                    warn!(peer = %peer.id(), %error, "read failed");
                    break;
                }
            }
        }

        self.registry.remove(&peer).await;
        writer.abort();
        info!(peer = %peer.id(), name = peer.name(), %remote, "peer disconnected");
    }

    /// Classify one inbound message from `peer` and broadcast the outcome.
    ///
    /// Returns how many peers accepted the broadcast.
    pub async fn handle_text(&self, peer: &Peer, text: &str) -> usize {
        let payload = match classify(text) {
            Command::Chat(body) => format!("{}: {body}", peer.name()),
            Command::Exchange(days) => {
                info!(peer = %peer.id(), days, "exchange requested");
                let report = self.aggregator.report(days).await;
                if report.is_empty() {
                    EMPTY_REPORT_NOTICE.to_owned()
                } else {
                    report
                }
            }
            Command::Malformed(reason) => {
                debug!(peer = %peer.id(), reason, "malformed command");
                format!("exchange: {reason}")
            }
        };

        self.registry.broadcast(&payload).await
    }
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(hub): State<Hub>,
) -> Response {
    ws.on_upgrade(move |socket| hub.handle_socket(socket, remote))
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ratecast_core::{
        CurrencyCode, DailyRates, InterestSet, Quote, RateSource, ReportDate, SourceError,
    };

    use super::*;

    #[derive(Default)]
    struct EchoSource {
        calls: AtomicUsize,
    }

    impl RateSource for EchoSource {
        fn daily_rates<'a>(
            &'a self,
            date: ReportDate,
        ) -> Pin<Box<dyn Future<Output = Result<DailyRates, SourceError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                let quotes = ["EUR", "USD"]
                    .iter()
                    .map(|raw| {
                        Quote::new(CurrencyCode::parse(raw).expect("code"), 40.0, 39.0)
                            .expect("quote")
                    })
                    .collect();
                Ok(DailyRates { date, quotes })
            })
        }
    }

    fn hub(source: Arc<EchoSource>) -> Hub {
        Hub::with_registry(Registry::lettered(), Aggregator::new(source, InterestSet::default()))
    }

    async fn join(hub: &Hub) -> (Peer, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(16);
        (hub.registry().add(tx).await, rx)
    }

    #[tokio::test]
    async fn chat_is_prefixed_with_sender_name_and_sent_to_everyone() {
        let hub = hub(Arc::new(EchoSource::default()));
        let (a, mut rx_a) = join(&hub).await;
        let (_b, mut rx_b) = join(&hub).await;

        assert_eq!(hub.handle_text(&a, "hi").await, 2);

        assert_eq!(rx_a.recv().await.as_deref(), Some("A: hi"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("A: hi"));
    }

    #[tokio::test]
    async fn malformed_exchange_broadcasts_diagnostic_without_fetching() {
        let source = Arc::new(EchoSource::default());
        let hub = hub(source.clone());
        let (a, mut rx_a) = join(&hub).await;
        let (_b, mut rx_b) = join(&hub).await;

        hub.handle_text(&a, "exchange three").await;

        let expected = "exchange: first argument must be numeric";
        assert_eq!(rx_a.recv().await.as_deref(), Some(expected));
        assert_eq!(rx_b.recv().await.as_deref(), Some(expected));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exchange_report_reaches_every_peer() {
        let hub = hub(Arc::new(EchoSource::default()));
        let (_a, mut rx_a) = join(&hub).await;
        let (b, mut rx_b) = join(&hub).await;

        hub.handle_text(&b, "exchange 2").await;

        let report_a = rx_a.recv().await.expect("A receives report");
        let report_b = rx_b.recv().await.expect("B receives report");
        assert_eq!(report_a, report_b);
        assert_eq!(report_a.lines().count(), 6, "two dates with two currencies each");
        assert!(report_a.contains("EUR: {sale: 40, purchase: 39}"));
    }

    #[tokio::test]
    async fn zero_day_exchange_broadcasts_notice() {
        let source = Arc::new(EchoSource::default());
        let hub = hub(source.clone());
        let (a, mut rx_a) = join(&hub).await;

        hub.handle_text(&a, "exchange 0").await;

        assert_eq!(rx_a.recv().await.as_deref(), Some(EMPTY_REPORT_NOTICE));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_exchanges_each_broadcast_one_report() {
        let source = Arc::new(EchoSource::default());
        let hub = hub(source.clone());
        let (a, mut rx_a) = join(&hub).await;
        let (b, mut rx_b) = join(&hub).await;
        let (_c, mut rx_c) = join(&hub).await;

        let (sent_a, sent_b) = tokio::join!(
            hub.handle_text(&a, "exchange 1"),
            hub.handle_text(&b, "exchange 1")
        );

        assert_eq!((sent_a, sent_b), (3, 3));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            for _ in 0..2 {
                let report = rx.recv().await.expect("report delivered");
                assert_eq!(report.lines().count(), 3, "one date with two currencies");
            }
            assert!(rx.try_recv().is_err(), "no duplicate broadcast");
        }
    }
}
