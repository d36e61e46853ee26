//! Capacity-bounded cache of idle keep-alive connections, keyed by endpoint.
//!
//! The pool owns a connection only while it's idle; checkout transfers
//! ownership to the caller (a request state machine), checkin transfers it
//! back. The capacity bound is a single total count across every endpoint,
//! not a per-endpoint limit.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

/// Destination a connection is scoped to. Two connections to the same host,
/// port, and transport are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, tls: bool) -> Self {
        Endpoint {
            host: host.into(),
            port,
            tls,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}://{}:{}",
            if self.tls { "https" } else { "http" },
            self.host,
            self.port
        )
    }
}

/// Whether a connection is returned to the pool on completion (`KeepAlive`)
/// or closed unconditionally (`Close`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    KeepAlive,
    Close,
}

/// A connection the pool can hold idle and hand back out.
///
/// `id` must be stable and unique per live connection object — it's the
/// pool's only way to detect the same connection being checked in twice.
pub trait PoolableConnection: Send + 'static {
    fn id(&self) -> u64;
    fn is_open(&self) -> bool;
    fn close(&mut self);
}

/// Endpoint-keyed idle-connection cache with a total capacity bound.
pub struct Pool<C: PoolableConnection> {
    idle: DashMap<Endpoint, Vec<C>>,
    capacity: usize,
    size: AtomicUsize,
}

impl<C: PoolableConnection> Pool<C> {
    pub fn new(capacity: usize) -> Self {
        Pool {
            idle: DashMap::new(),
            capacity,
            size: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove-and-return an idle connection for `endpoint` if one exists and
    /// the caller wants keep-alive reuse. A `None` result means the caller
    /// must dial a fresh connection itself — the pool never connects.
    pub fn checkout(&self, endpoint: &Endpoint, keep_alive: bool) -> Option<C> {
        if !keep_alive {
            return None;
        }
        let mut slot = self.idle.get_mut(endpoint)?;
        let conn = slot.pop();
        let now_empty = slot.is_empty();
        drop(slot);
        if now_empty {
            self.idle.remove(endpoint);
        }
        if conn.is_some() {
            self.size.fetch_sub(1, Ordering::SeqCst);
        }
        conn
    }

    /// Return a connection. Closed-lifecycle or already-dead connections are
    /// closed and dropped; over-capacity or duplicate check-ins are likewise
    /// closed rather than inserted (the duplicate case repairs an invariant
    /// violation rather than signalling an error).
    pub fn checkin(&self, endpoint: Endpoint, mut conn: C, lifecycle: Lifecycle) {
        if lifecycle == Lifecycle::Close || !conn.is_open() {
            conn.close();
            return;
        }
        if self.size.load(Ordering::SeqCst) >= self.capacity {
            conn.close();
            return;
        }

        let mut slot = self.idle.entry(endpoint).or_default();
        if slot.iter().any(|c| c.id() == conn.id()) {
            tracing::warn!(connection_id = conn.id(), "duplicate checkin, evicting");
            conn.close();
            return;
        }
        slot.push(conn);
        self.size.fetch_add(1, Ordering::SeqCst);
    }
}
