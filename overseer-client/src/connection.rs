use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use overseer_pool::{Endpoint, PoolableConnection};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// One outbound HTTP/1.1 connection: a send half plus the background task
/// driving the connection's I/O loop. Open until the driver task ends or
/// `close()` is called.
pub struct Connection {
    id: u64,
    endpoint: Endpoint,
    sender: SendRequest<Full<Bytes>>,
    driver: Option<JoinHandle<()>>,
    open: Arc<AtomicBool>,
}

impl Connection {
    /// Dial a fresh TCP connection to `endpoint` and perform the HTTP/1.1
    /// handshake. TLS is out of scope here; `endpoint.tls` is carried for
    /// pool bookkeeping only (see REDESIGN FLAGS).
    pub async fn connect(endpoint: Endpoint) -> std::io::Result<Connection> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        let io = TokioIo::new(stream);
        let (sender, conn) = http1::handshake(io)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        let open = Arc::new(AtomicBool::new(true));
        let open_for_driver = Arc::clone(&open);
        let driver = tokio::spawn(async move {
            if let Err(err) = conn.await {
                tracing::debug!(error = %err, "connection driver ended with error");
            }
            open_for_driver.store(false, Ordering::SeqCst);
        });

        Ok(Connection {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::SeqCst),
            endpoint,
            sender,
            driver: Some(driver),
            open,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn sender_mut(&mut self) -> &mut SendRequest<Full<Bytes>> {
        &mut self.sender
    }
}

impl PoolableConnection for Connection {
    fn id(&self) -> u64 {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.sender.is_closed()
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}
