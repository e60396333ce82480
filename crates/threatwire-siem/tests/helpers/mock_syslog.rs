//! Mock syslog servers for integration testing.
//!
//! TCP and UDP servers that capture received messages for validation.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Mock TCP syslog server that captures newline-framed messages.
pub struct MockTcpSyslogServer {
    addr: SocketAddr,
    messages: Arc<Mutex<Vec<String>>>,
    shutdown: CancellationToken,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockTcpSyslogServer {
    /// Start a mock TCP syslog server. Use port 0 to let the OS assign
    /// an available port.
    pub async fn start(port: u16) -> Self {
        let listener = TcpListener::bind(format!("127.0.0.1:{port}"))
            .await
            .expect("Failed to bind TCP listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let shutdown = CancellationToken::new();

        let messages_clone = Arc::clone(&messages);
        let shutdown_clone = shutdown.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_clone.cancelled() => {
                        break;
                    }
                    result = listener.accept() => {
                        if let Ok((stream, _)) = result {
                            let messages_inner = Arc::clone(&messages_clone);
                            let shutdown_inner = shutdown_clone.clone();
                            tokio::spawn(async move {
                                Self::handle_connection(stream, messages_inner, shutdown_inner).await;
                            });
                        }
                    }
                }
            }
        });

        Self {
            addr,
            messages,
            shutdown,
            _handle: handle,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        messages: Arc<Mutex<Vec<String>>>,
        shutdown: CancellationToken,
    ) {
        let mut reader = BufReader::new(stream);
        let mut line = String::new();

        loop {
            line.clear();
            tokio::select! {
                _ = shutdown.cancelled() => {
                    break;
                }
                result = reader.read_line(&mut line) => {
                    match result {
                        Ok(0) => break, // Connection closed
                        Ok(_) => {
                            let msg = line.trim_end().to_string();
                            if !msg.is_empty() {
                                messages.lock().await.push(msg);
                            }
                        }
                        Err(_) => break,
                    }
                }
            }
        }
    }

    /// Get the server's address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get all received messages.
    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }

    /// Clear received messages.
    pub async fn clear_messages(&self) {
        self.messages.lock().await.clear();
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Mock UDP syslog server that captures one message per datagram.
pub struct MockUdpSyslogServer {
    addr: SocketAddr,
    messages: Arc<Mutex<Vec<String>>>,
    shutdown: CancellationToken,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockUdpSyslogServer {
    /// Start a mock UDP syslog server. Use port 0 to let the OS assign
    /// an available port.
    pub async fn start(port: u16) -> Self {
        let socket = UdpSocket::bind(format!("127.0.0.1:{port}"))
            .await
            .expect("Failed to bind UDP socket");
        let addr = socket.local_addr().expect("Failed to get local address");
        let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let shutdown = CancellationToken::new();

        let messages_clone = Arc::clone(&messages);
        let shutdown_clone = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 65535];
            loop {
                tokio::select! {
                    _ = shutdown_clone.cancelled() => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, _)) = result {
                            if let Ok(msg) = std::str::from_utf8(&buf[..len]) {
                                messages_clone.lock().await.push(msg.to_string());
                            }
                        }
                    }
                }
            }
        });

        Self {
            addr,
            messages,
            shutdown,
            _handle: handle,
        }
    }

    /// Get the server's address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get all received messages.
    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }

    /// Clear received messages.
    pub async fn clear_messages(&self) {
        self.messages.lock().await.clear();
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
