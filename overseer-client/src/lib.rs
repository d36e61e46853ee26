//! Async HTTP client core: per-request state machine, connection reuse
//! through `overseer_pool`, and grouped requests sharing a deadline.
//!
//! Every state transition runs as a job on `overseer_scheduler`'s worker
//! pool — nothing here ever blocks a caller's thread.

mod connection;
mod manager;
mod request;

pub use connection::Connection;
pub use manager::{GroupCompletionHandler, RequestManager};
pub use overseer_pool::{Endpoint, Lifecycle};
pub use request::{
    CompletionHandler, Request, RequestDesc, RequestFailure, RequestResult, RequestState,
    RequestSummary,
};

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use overseer_pool::Pool;
    use overseer_scheduler::SchedulerHandle;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn spawn_responder(body: &'static str, delay: Duration) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        addr
    }

    fn get_request(endpoint: Endpoint) -> RequestDesc {
        RequestDesc {
            method: http::Method::GET,
            uri: "/".parse().unwrap(),
            headers: http::HeaderMap::new(),
            body: Bytes::new(),
            endpoint,
            keep_alive: false,
        }
    }

    #[tokio::test]
    async fn request_runs_to_completion_against_a_real_socket() {
        let addr = spawn_responder("ok", Duration::ZERO).await;
        let pool = Arc::new(Pool::new(4));
        let scheduler = SchedulerHandle::start(1, 2);
        let endpoint = Endpoint::new(addr.ip().to_string(), addr.port(), false);
        let request = Request::new(get_request(endpoint), pool);

        let (tx, rx) = tokio::sync::oneshot::channel();
        scheduler.submit(async move {
            request
                .run(Box::new(move |result| {
                    let _ = tx.send(result);
                }))
                .await;
        });

        let result = tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("request should finish")
            .unwrap();
        assert!(result.error.is_none());
        assert_eq!(result.response.unwrap().status(), http::StatusCode::OK);
        scheduler.stop();
    }

    #[tokio::test]
    async fn group_completion_fires_once_when_every_request_finishes() {
        let addr1 = spawn_responder("a", Duration::ZERO).await;
        let addr2 = spawn_responder("b", Duration::ZERO).await;
        let pool = Arc::new(Pool::new(4));
        let scheduler = SchedulerHandle::start(1, 4);

        let requests = vec![
            Request::new(
                get_request(Endpoint::new(addr1.ip().to_string(), addr1.port(), false)),
                Arc::clone(&pool),
            ),
            Request::new(
                get_request(Endpoint::new(addr2.ip().to_string(), addr2.port(), false)),
                Arc::clone(&pool),
            ),
        ];
        let manager = RequestManager::new(requests, scheduler.clone());

        let (tx, rx) = tokio::sync::oneshot::channel();
        manager
            .start(
                Duration::ZERO,
                Box::new(move |results| {
                    let _ = tx.send(results);
                }),
            )
            .unwrap();

        let results = tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("group should complete")
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.error.is_none()));
        scheduler.stop();
    }

    #[tokio::test]
    async fn group_deadline_times_out_a_stuck_request() {
        let addr = spawn_responder("late", Duration::from_secs(5)).await;
        let pool = Arc::new(Pool::new(4));
        let scheduler = SchedulerHandle::start(1, 2);
        let endpoint = Endpoint::new(addr.ip().to_string(), addr.port(), false);
        let requests = vec![Request::new(get_request(endpoint), pool)];
        let manager = RequestManager::new(requests, scheduler.clone());

        let (tx, rx) = tokio::sync::oneshot::channel();
        manager
            .start(
                Duration::from_millis(100),
                Box::new(move |results| {
                    let _ = tx.send(results);
                }),
            )
            .unwrap();

        let results = tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("group should complete after the deadline")
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            &results[0].error,
            Some(RequestFailure::Overseer(overseer_error::OverseerError::Client(
                overseer_error::ClientError::RequestTimedOut { .. }
            )))
        ));
        scheduler.stop();
    }

    #[test]
    fn starting_an_already_running_manager_fails() {
        let pool: Arc<Pool<Connection>> = Arc::new(Pool::new(1));
        let scheduler = SchedulerHandle::start(1, 1);
        let endpoint = Endpoint::new("127.0.0.1", 1, false);
        let requests = vec![Request::new(get_request(endpoint), pool)];
        let manager = RequestManager::new(requests, scheduler.clone());
        manager.start(Duration::ZERO, Box::new(|_| {})).unwrap();
        let err = manager
            .start(Duration::ZERO, Box::new(|_| {}))
            .unwrap_err();
        assert!(matches!(
            err,
            overseer_error::OverseerError::Client(overseer_error::ClientError::InternalError { .. })
        ));
        scheduler.stop();
    }
}
