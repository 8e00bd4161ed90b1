//! Recording test doubles for the reader service and the language model.
//!
//! Both stubs answer from a per-key queue: responses are handed out in order
//! and the last one repeats forever, so "429 then 200" or "fail then Yes"
//! scenarios read naturally at the call site.

use crate::api::AskAsync;
use crate::fetcher::{ReadResponse, ReadService};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::sync::Mutex;

fn next_from<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

// =============================================================================
// Stub Reader
// =============================================================================

/// Reader service answering from scripted per-URL responses.
///
/// URLs with no script answer 404.
#[derive(Debug, Default)]
pub struct StubReader {
    pages: Mutex<HashMap<String, VecDeque<Result<ReadResponse, String>>>>,
    calls: Mutex<Vec<String>>,
}

impl StubReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn page(self, url: &str, status: u16, body: &str) -> Self {
        self.push(
            url,
            Ok(ReadResponse {
                status,
                body: body.to_string(),
            }),
        )
    }

    /// Queue a transport error for `url`.
    pub fn unreachable(self, url: &str) -> Self {
        self.push(url, Err("connection refused".to_string()))
    }

    fn push(self, url: &str, response: Result<ReadResponse, String>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Number of requests made for `url`.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl ReadService for StubReader {
    async fn read(&self, url: &str) -> Result<ReadResponse, Box<dyn Error>> {
        self.calls.lock().unwrap().push(url.to_string());

        let mut pages = self.pages.lock().unwrap();
        match pages.get_mut(url).and_then(next_from) {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(message.into()),
            None => Ok(ReadResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

// =============================================================================
// Stub Model
// =============================================================================

/// Language model answering from a scripted queue and recording every prompt.
#[derive(Debug, Default)]
pub struct StubModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn replying(reply: &str) -> Self {
        Self::default().then(reply)
    }

    pub fn failing(message: &str) -> Self {
        let model = Self::default();
        model
            .replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        model
    }

    /// Queue another successful reply.
    pub fn then(self, reply: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
        self
    }

    /// Every prompt received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AskAsync for StubModel {
    type Response = String;

    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        self.calls.lock().unwrap().push(text.to_string());

        let mut replies = self.replies.lock().unwrap();
        match next_from(&mut replies) {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(message.into()),
            None => Err("stub model has no scripted reply".into()),
        }
    }
}
