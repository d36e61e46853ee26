use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use overseer_error::{ClientError, OverseerError};
use overseer_pool::{Endpoint, Lifecycle, Pool};

use crate::connection::Connection;

/// State machine edges from `spec.md` §4.C9: `Idle → Connecting → Sending →
/// Reading → Done`, with `Cancelled` absorbing any of the prior states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Connecting,
    Sending,
    Reading,
    Done,
    Cancelled,
}

/// Identity of the outbound request, kept around after the body is consumed
/// so results can still name what was sent.
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub method: http::Method,
    pub uri: http::Uri,
}

/// What a request was built from.
pub struct RequestDesc {
    pub method: http::Method,
    pub uri: http::Uri,
    pub headers: http::HeaderMap,
    pub body: Bytes,
    pub endpoint: Endpoint,
    pub keep_alive: bool,
}

/// A failure that didn't fit the closed `ClientError` taxonomy: a terminal
/// I/O error from the transport itself. Retryable I/O failures (§4.C9) never
/// surface here — they're absorbed by the one-shot retry inside `run`.
#[derive(Debug)]
pub enum RequestFailure {
    Overseer(OverseerError),
    Transport(String),
}

impl std::fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestFailure::Overseer(e) => write!(f, "{e}"),
            RequestFailure::Transport(msg) => write!(f, "{msg}"),
        }
    }
}

pub struct RequestResult {
    pub endpoint: Endpoint,
    pub summary: RequestSummary,
    pub response: Option<http::Response<Bytes>>,
    pub error: Option<RequestFailure>,
}

pub type CompletionHandler = Box<dyn FnOnce(RequestResult) + Send>;

struct Mutable {
    state: RequestState,
    connection: Option<Connection>,
    cancelled: bool,
}

/// A single outbound HTTP request, driven end to end by `run`.
pub struct Request {
    method: http::Method,
    uri: http::Uri,
    headers: http::HeaderMap,
    body: Bytes,
    endpoint: Endpoint,
    keep_alive: bool,
    pool: Arc<Pool<Connection>>,
    mutable: Mutex<Mutable>,
    done: AtomicBool,
}

impl Request {
    pub fn new(desc: RequestDesc, pool: Arc<Pool<Connection>>) -> Arc<Request> {
        Arc::new(Request {
            method: desc.method,
            uri: desc.uri,
            headers: desc.headers,
            body: desc.body,
            endpoint: desc.endpoint,
            keep_alive: desc.keep_alive,
            pool,
            mutable: Mutex::new(Mutable {
                state: RequestState::Idle,
                connection: None,
                cancelled: false,
            }),
            done: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> RequestState {
        self.mutable.lock().unwrap().state
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Set the cancellation flag and close the connection if one is
    /// currently parked (idle between state edges). A connection in active
    /// use by an in-flight syscall is observed and closed at the next edge
    /// boundary instead — a documented simplification of "cancels any
    /// pending I/O immediately" (see DESIGN.md).
    pub fn cancel(&self) {
        let mut mutable = self.mutable.lock().unwrap();
        mutable.cancelled = true;
        if let Some(conn) = mutable.connection.as_mut() {
            conn.close();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.mutable.lock().unwrap().cancelled
    }

    fn set_state(&self, state: RequestState) {
        self.mutable.lock().unwrap().state = state;
    }

    fn park(&self, conn: Connection) {
        self.mutable.lock().unwrap().connection = Some(conn);
    }

    fn unpark(&self) -> Option<Connection> {
        self.mutable.lock().unwrap().connection.take()
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            method: self.method.clone(),
            uri: self.uri.clone(),
        }
    }

    fn build_request(&self) -> http::Request<Full<Bytes>> {
        let mut builder = http::Request::builder()
            .method(self.method.clone())
            .uri(self.uri.clone());
        for (name, value) in self.headers.iter() {
            builder = builder.header(name, value);
        }
        builder
            .body(Full::new(self.body.clone()))
            .expect("request built from valid parts")
    }

    fn result(
        &self,
        response: Option<http::Response<Bytes>>,
        error: Option<RequestFailure>,
    ) -> RequestResult {
        RequestResult {
            endpoint: self.endpoint.clone(),
            summary: self.summary(),
            response,
            error,
        }
    }

    fn cancelled_result(&self) -> RequestResult {
        self.result(
            None,
            Some(RequestFailure::Overseer(OverseerError::Client(
                ClientError::RequestCanceled { detail: None },
            ))),
        )
    }

    /// Drive the request to completion: connect (or reuse a pooled
    /// connection), send, read the response, and invoke `on_complete`
    /// exactly once. Runs as a single scheduler job; the `.await` points
    /// inside are this job's suspension points (§5).
    pub async fn run(self: Arc<Self>, on_complete: CompletionHandler) {
        let mut retried = false;

        loop {
            if self.is_cancelled() {
                self.set_state(RequestState::Cancelled);
                self.done.store(true, Ordering::SeqCst);
                on_complete(self.cancelled_result());
                return;
            }

            self.set_state(RequestState::Connecting);
            let conn = match self.pool.checkout(&self.endpoint, self.keep_alive) {
                Some(conn) => conn,
                None => match Connection::connect(self.endpoint.clone()).await {
                    Ok(conn) => conn,
                    Err(err) => {
                        self.set_state(RequestState::Done);
                        self.done.store(true, Ordering::SeqCst);
                        on_complete(self.result(
                            None,
                            Some(RequestFailure::Transport(err.to_string())),
                        ));
                        return;
                    }
                },
            };

            self.park(conn);
            if self.is_cancelled() {
                drop(self.unpark());
                self.set_state(RequestState::Cancelled);
                self.done.store(true, Ordering::SeqCst);
                on_complete(self.cancelled_result());
                return;
            }
            let mut conn = self.unpark().expect("connection parked above");

            self.set_state(RequestState::Sending);
            let mut request = self.build_request();
            request.headers_mut().insert(
                http::header::HOST,
                format!("{}:{}", self.endpoint.host, self.endpoint.port)
                    .parse()
                    .expect("host:port is a valid header value"),
            );
            request.headers_mut().insert(
                http::header::CONNECTION,
                if self.keep_alive { "Keep-Alive" } else { "close" }
                    .parse()
                    .unwrap(),
            );

            let response = match conn.sender_mut().send_request(request).await {
                Ok(response) => response,
                Err(err) => {
                    if !retried && is_generic_send_error(&err) {
                        retried = true;
                        conn.close();
                        continue;
                    }
                    conn.close();
                    self.set_state(RequestState::Done);
                    self.done.store(true, Ordering::SeqCst);
                    on_complete(
                        self.result(None, Some(RequestFailure::Transport(err.to_string()))),
                    );
                    return;
                }
            };

            self.set_state(RequestState::Reading);
            let (parts, body) = response.into_parts();
            let collected = match body.collect().await {
                Ok(collected) => collected,
                Err(err) => {
                    if !retried && self.keep_alive && is_unexpected_eof(&err) {
                        retried = true;
                        conn.close();
                        continue;
                    }
                    conn.close();
                    self.set_state(RequestState::Done);
                    self.done.store(true, Ordering::SeqCst);
                    on_complete(
                        self.result(None, Some(RequestFailure::Transport(err.to_string()))),
                    );
                    return;
                }
            };
            let response = http::Response::from_parts(parts, collected.to_bytes());

            if self.keep_alive && response_keeps_alive(&response) {
                self.pool
                    .checkin(self.endpoint.clone(), conn, Lifecycle::KeepAlive);
            } else {
                conn.close();
            }

            self.set_state(RequestState::Done);
            self.done.store(true, Ordering::SeqCst);
            on_complete(self.result(Some(response), None));
            return;
        }
    }
}

fn io_source(err: &hyper::Error) -> Option<&std::io::Error> {
    err.source().and_then(|s| s.downcast_ref::<std::io::Error>())
}

fn is_generic_send_error(err: &hyper::Error) -> bool {
    io_source(err)
        .map(|io_err| io_err.kind() == std::io::ErrorKind::Other)
        .unwrap_or(false)
}

fn is_unexpected_eof(err: &hyper::Error) -> bool {
    if err.is_incomplete_message() {
        return true;
    }
    io_source(err)
        .map(|io_err| io_err.kind() == std::io::ErrorKind::UnexpectedEof)
        .unwrap_or(false)
}

fn response_keeps_alive(response: &http::Response<Bytes>) -> bool {
    response
        .headers()
        .get(http::header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| !v.eq_ignore_ascii_case("close"))
        .unwrap_or(true)
}
