//! A scripted [`Transport`], so that fetch policies can be tested without a server

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::client::{Response, Transport};
use crate::error::{PortalError, Result};

/// What the mock should do for one request
#[derive(Clone, Debug)]
pub enum MockReply {
    Status(u16, Vec<u8>),
    /// Fail as if the network was unreachable
    Unreachable,
}

impl MockReply {
    pub fn ok<B: Into<Vec<u8>>>(body: B) -> Self {
        MockReply::Status(200, body.into())
    }
}

/// A transport that replays queued replies and records every request it receives
///
/// When the queue is empty, requests fail as [`MockReply::Unreachable`].
/// Every request yields to the runtime before answering, so that concurrent requests actually overlap.
#[derive(Default, Debug)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<(Url, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I: IntoIterator<Item = MockReply>>(replies: I) -> Self {
        let mock = Self::new();
        for reply in replies {
            mock.push(reply);
        }
        mock
    }

    pub fn push(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// How many requests have been performed so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The URLs and `Authorization` headers of every request so far
    pub fn requests(&self) -> Vec<(Url, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// The highest number of requests that were pending at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url, authorization: &str) -> Result<Response> {
        self.requests.lock().unwrap().push((url.clone(), authorization.to_string()));

        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(pending, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Status(status, body)) => {
                log::debug!("Mock transport: answering {} with {}", url, status);
                Ok(Response { status, body })
            },
            Some(MockReply::Unreachable) | None => {
                log::debug!("Mock transport: failing request to {}", url);
                Err(PortalError::Transport(format!("mocked network failure for {}", url)))
            },
        }
    }
}
