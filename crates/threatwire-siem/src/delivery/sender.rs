//! The syslog delivery actor.
//!
//! A `SyslogSender` owns a queue of pre-formatted messages, at most one
//! live outbound connection, and a single worker task that drains the
//! queue in FIFO order. Producers enqueue without blocking; when the
//! queue is full the message is shed and counted. A failed send closes
//! the connection, and the same message is retried after a fixed
//! cooldown, so an unhealthy collector throttles the actor to roughly
//! one attempt per cooldown period.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::endpoint::{resolve, Endpoint, ResolvedEndpoint};
use super::DeliveryError;
use crate::models::Protocol;

/// Consecutive successful sends between scheduler yields, so one busy
/// producer cannot starve other tasks sharing the runtime.
const YIELD_AFTER_SENDS: u64 = 8192;

/// Establishes connections to a resolved endpoint.
///
/// The seam between the actor's retry loop and the network; the default
/// implementation is [`NetDialer`].
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, endpoint: &ResolvedEndpoint) -> io::Result<Box<dyn Connection>>;
}

/// A live outbound connection owned by the worker.
#[async_trait]
pub trait Connection: Send {
    /// Transmit one formatted message, applying transport framing.
    async fn transmit(&mut self, payload: &str) -> io::Result<()>;
}

/// Dialer for real TCP/UDP sockets.
pub struct NetDialer;

#[async_trait]
impl Dialer for NetDialer {
    async fn dial(&self, endpoint: &ResolvedEndpoint) -> io::Result<Box<dyn Connection>> {
        match endpoint.protocol {
            Protocol::Tcp => {
                let stream = TcpStream::connect(endpoint.addr).await?;
                Ok(Box::new(TcpConnection { stream }))
            }
            Protocol::Udp => {
                let bind_addr = if endpoint.addr.is_ipv4() {
                    "0.0.0.0:0"
                } else {
                    "[::]:0"
                };
                let socket = UdpSocket::bind(bind_addr).await?;
                socket.connect(endpoint.addr).await?;
                Ok(Box::new(UdpConnection { socket }))
            }
        }
    }
}

struct TcpConnection {
    stream: TcpStream,
}

#[async_trait]
impl Connection for TcpConnection {
    async fn transmit(&mut self, payload: &str) -> io::Result<()> {
        // Stream transport: line framing, one newline-terminated message
        // per write.
        self.stream.write_all(payload.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await
    }
}

struct UdpConnection {
    socket: UdpSocket,
}

#[async_trait]
impl Connection for UdpConnection {
    async fn transmit(&mut self, payload: &str) -> io::Result<()> {
        // Datagram transport: one datagram per message, no framing.
        self.socket.send(payload.as_bytes()).await.map(|_| ())
    }
}

/// Dialer that records payloads in memory instead of touching the
/// network. Useful in tests and dry runs.
#[derive(Default)]
pub struct MemoryDialer {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemoryDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All payloads transmitted so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self, _endpoint: &ResolvedEndpoint) -> io::Result<Box<dyn Connection>> {
        Ok(Box::new(MemoryConnection {
            messages: Arc::clone(&self.messages),
        }))
    }
}

struct MemoryConnection {
    messages: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn transmit(&mut self, payload: &str) -> io::Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.to_string());
        Ok(())
    }
}

/// Snapshot of the actor's delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    /// Messages written to the wire.
    pub transmitted: u64,
    /// Messages shed because the queue was full (or the actor stopped).
    pub dropped: u64,
    /// Send failures, each followed by a cooldown.
    pub send_errors: u64,
}

#[derive(Debug, Default)]
struct DeliveryCounters {
    transmitted: AtomicU64,
    dropped: AtomicU64,
    send_errors: AtomicU64,
}

impl DeliveryCounters {
    fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            transmitted: self.transmitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
        }
    }
}

enum QueueTx {
    Bounded(mpsc::Sender<String>),
    Unbounded(mpsc::UnboundedSender<String>),
}

enum QueueRx {
    Bounded(mpsc::Receiver<String>),
    Unbounded(mpsc::UnboundedReceiver<String>),
}

impl QueueRx {
    async fn recv(&mut self) -> Option<String> {
        match self {
            Self::Bounded(rx) => rx.recv().await,
            Self::Unbounded(rx) => rx.recv().await,
        }
    }
}

/// Asynchronous, self-healing syslog sender.
pub struct SyslogSender {
    tx: QueueTx,
    rx: Option<QueueRx>,
    endpoint: Arc<Mutex<Endpoint>>,
    generation: Arc<AtomicU64>,
    counters: Arc<DeliveryCounters>,
    cooldown: Duration,
    dialer: Arc<dyn Dialer>,
    shutdown: CancellationToken,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl SyslogSender {
    /// Create a sender over real sockets. `queue_capacity` of `0` means
    /// an unbounded queue. The worker does not run until [`start`] is
    /// called.
    ///
    /// [`start`]: SyslogSender::start
    pub fn new(endpoint: Endpoint, queue_capacity: usize, cooldown: Duration) -> Self {
        Self::with_dialer(endpoint, queue_capacity, cooldown, Arc::new(NetDialer))
    }

    /// Create a sender with a custom connection seam.
    pub fn with_dialer(
        endpoint: Endpoint,
        queue_capacity: usize,
        cooldown: Duration,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        let (tx, rx) = if queue_capacity == 0 {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueTx::Unbounded(tx), QueueRx::Unbounded(rx))
        } else {
            let (tx, rx) = mpsc::channel(queue_capacity);
            (QueueTx::Bounded(tx), QueueRx::Bounded(rx))
        };

        Self {
            tx,
            rx: Some(rx),
            endpoint: Arc::new(Mutex::new(endpoint)),
            generation: Arc::new(AtomicU64::new(0)),
            counters: Arc::new(DeliveryCounters::default()),
            cooldown,
            dialer,
            shutdown: CancellationToken::new(),
            handle: None,
        }
    }

    /// Spawn the worker task. Must be called from within a Tokio runtime.
    /// Calling it again is a no-op.
    pub fn start(&mut self) {
        if let Some(rx) = self.rx.take() {
            let worker = Worker {
                rx,
                endpoint: Arc::clone(&self.endpoint),
                generation: Arc::clone(&self.generation),
                counters: Arc::clone(&self.counters),
                cooldown: self.cooldown,
                dialer: Arc::clone(&self.dialer),
                shutdown: self.shutdown.clone(),
            };
            self.handle = Some(tokio::spawn(worker.run()));
        }
    }

    /// Enqueue one formatted message without blocking.
    ///
    /// When the queue is at capacity (or the actor has stopped) the
    /// message is shed and the drop counter incremented; producers are
    /// never slowed by a congested actor.
    pub fn enqueue(&self, message: String) {
        let rejected = match &self.tx {
            QueueTx::Bounded(tx) => tx.try_send(message).is_err(),
            QueueTx::Unbounded(tx) => tx.send(message).is_err(),
        };
        if rejected {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("delivery queue full, message dropped");
        }
    }

    /// Replace the collector endpoint.
    ///
    /// Any live connection is invalidated; the worker re-resolves before
    /// its next connection attempt, never reusing a stale resolution.
    pub fn set_endpoint(&self, endpoint: Endpoint) {
        *self
            .endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = endpoint;
        self.generation.fetch_add(1, Ordering::Release);
        info!("collector endpoint updated, open connection invalidated");
    }

    /// Snapshot the delivery counters.
    pub fn stats(&self) -> DeliveryStats {
        self.counters.snapshot()
    }

    /// Stop the worker, closing any live connection. Queued messages are
    /// discarded; there is no drain on shutdown.
    pub async fn shutdown(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

struct Worker {
    rx: QueueRx,
    endpoint: Arc<Mutex<Endpoint>>,
    generation: Arc<AtomicU64>,
    counters: Arc<DeliveryCounters>,
    cooldown: Duration,
    dialer: Arc<dyn Dialer>,
    shutdown: CancellationToken,
}

impl Worker {
    async fn run(mut self) {
        let mut connection: Option<Box<dyn Connection>> = None;
        let mut connected_generation = self.generation.load(Ordering::Acquire);
        let mut sent_streak: u64 = 0;

        loop {
            let message = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                received = self.rx.recv() => match received {
                    Some(message) => message,
                    None => break,
                },
            };

            // The message at the front is retried until it is on the wire
            // or the actor stops; later messages never overtake it.
            loop {
                let generation = self.generation.load(Ordering::Acquire);
                if connection.is_some() && generation != connected_generation {
                    debug!("endpoint reconfigured, dropping stale connection");
                    connection = None;
                }

                if connection.is_none() {
                    match self.connect().await {
                        Ok(conn) => {
                            connection = Some(conn);
                            connected_generation = generation;
                        }
                        Err(err) => {
                            warn!(error = %err, "connection attempt failed");
                            self.counters.send_errors.fetch_add(1, Ordering::Relaxed);
                            sent_streak = 0;
                            if self.cooldown_interrupted().await {
                                return;
                            }
                            continue;
                        }
                    }
                }

                let result = match connection.as_mut() {
                    Some(conn) => conn.transmit(&message).await,
                    None => continue,
                };

                match result {
                    Ok(()) => {
                        self.counters.transmitted.fetch_add(1, Ordering::Relaxed);
                        sent_streak += 1;
                        if sent_streak >= YIELD_AFTER_SENDS {
                            sent_streak = 0;
                            tokio::task::yield_now().await;
                        }
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "send failed, closing connection");
                        connection = None;
                        self.counters.send_errors.fetch_add(1, Ordering::Relaxed);
                        sent_streak = 0;
                        if self.cooldown_interrupted().await {
                            return;
                        }
                    }
                }
            }
        }

        debug!("delivery worker stopped");
    }

    /// Re-resolve the current endpoint and dial it.
    async fn connect(&self) -> Result<Box<dyn Connection>, DeliveryError> {
        let target = self
            .endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let resolved = resolve(target.host.as_deref(), target.port, &target.protocol).await?;
        let connection = self.dialer.dial(&resolved).await?;
        debug!(addr = %resolved.addr, protocol = %resolved.protocol, "collector connection established");
        Ok(connection)
    }

    /// Wait out the retry cooldown. Returns `true` when shutdown fired
    /// first.
    async fn cooldown_interrupted(&self) -> bool {
        tokio::select! {
            _ = self.shutdown.cancelled() => true,
            _ = tokio::time::sleep(self.cooldown) => false,
        }
    }
}
