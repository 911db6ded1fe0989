//! Shared helpers for the session integration tests.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use jobstream::{
    BoxError, EventTransport, RawEvent, StreamError, StreamHandler, StreamRequest, StreamResponse,
};
use tokio::time::Instant;

/// How a scripted body ends once its chunks are consumed.
#[derive(Debug, Clone)]
pub enum BodyEnd {
    /// The body ends normally.
    Eof,
    /// Reading the body fails.
    Error(&'static str),
    /// The body stays open without sending anything else.
    Hang,
}

/// One scripted answer to a connection attempt.
#[derive(Debug, Clone)]
pub enum Script {
    /// No response at all.
    Refuse,
    /// A response with the given status and an empty body.
    Status(u16),
    /// A 200 response with the given chunks.
    Body {
        chunks: Vec<&'static str>,
        end: BodyEnd,
    },
}

impl Script {
    /// A 200 response whose body is `body` in one chunk.
    pub fn body(body: &'static str) -> Self {
        Self::Body {
            chunks: vec![body],
            end: BodyEnd::Eof,
        }
    }

    /// A 200 response whose body arrives in several chunks.
    pub fn chunked(chunks: Vec<&'static str>) -> Self {
        Self::Body {
            chunks,
            end: BodyEnd::Eof,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    scripts: VecDeque<Script>,
    requests: Vec<StreamRequest>,
    attempts: Vec<Instant>,
}

/// In-memory transport answering attempts from a script.
///
/// Once the script is exhausted further attempts never complete, so tests
/// end sessions with a sentinel, an error or cancellation.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedTransport {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                scripts: scripts.into_iter().collect(),
                ..Default::default()
            })),
        }
    }

    /// Number of connection attempts so far.
    pub fn attempts(&self) -> usize {
        self.inner.lock().expect("lock").attempts.len()
    }

    /// Time between consecutive attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        let inner = self.inner.lock().expect("lock");
        inner
            .attempts
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.inner.lock().expect("lock").requests.clone()
    }
}

#[async_trait]
impl EventTransport for ScriptedTransport {
    async fn open(&self, request: StreamRequest) -> Result<StreamResponse, BoxError> {
        let script = {
            let mut inner = self.inner.lock().expect("lock");
            inner.attempts.push(Instant::now());
            inner.requests.push(request);
            inner.scripts.pop_front()
        };

        match script {
            None => std::future::pending().await,
            Some(Script::Refuse) => Err("connection refused".into()),
            Some(Script::Status(code)) => Ok(StreamResponse::new(
                http::StatusCode::from_u16(code).expect("valid status"),
                futures_util::stream::empty(),
            )),
            Some(Script::Body { chunks, end }) => {
                let items: Vec<Result<Bytes, BoxError>> = chunks
                    .into_iter()
                    .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                    .collect();
                let body = futures_util::stream::iter(items);
                Ok(match end {
                    BodyEnd::Eof => StreamResponse::new(http::StatusCode::OK, body),
                    BodyEnd::Error(message) => StreamResponse::new(
                        http::StatusCode::OK,
                        body.chain(futures_util::stream::once(async move {
                            Err::<Bytes, BoxError>(message.into())
                        })),
                    ),
                    BodyEnd::Hang => StreamResponse::new(
                        http::StatusCode::OK,
                        body.chain(futures_util::stream::pending()),
                    ),
                })
            }
        }
    }
}

/// Handler recording everything it is given.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub events: Arc<Mutex<Vec<String>>>,
    pub errors: Arc<Mutex<Vec<String>>>,
    pub connects: Arc<Mutex<usize>>,
    /// Absorb escalated errors instead of stopping.
    pub absorb: bool,
    /// Reject the event with this payload.
    pub reject: Option<&'static str>,
}

impl Recorder {
    pub fn absorbing() -> Self {
        Self {
            absorb: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().expect("lock").clone()
    }

    pub fn connects(&self) -> usize {
        *self.connects.lock().expect("lock")
    }
}

#[async_trait]
impl StreamHandler for Recorder {
    async fn on_event(&mut self, event: RawEvent) -> Result<(), BoxError> {
        let data = event.data().to_string();
        let rejected = self.reject == Some(data.as_str());
        self.events.lock().expect("lock").push(data);
        if rejected {
            return Err("consumer rejected event".into());
        }
        Ok(())
    }

    async fn on_error(&mut self, error: StreamError) -> Result<(), StreamError> {
        self.errors.lock().expect("lock").push(error.to_string());
        if self.absorb { Ok(()) } else { Err(error) }
    }

    fn on_connect(&mut self) {
        *self.connects.lock().expect("lock") += 1;
    }
}

/// Install a test subscriber once; respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
