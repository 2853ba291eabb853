use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use tracing::{debug, info};

use crate::config::SettingsStore;
use crate::context::Transcript;
use crate::error::{ChatError, Result};
use crate::llm::{ChatTransport, Reply, Turn};

/// Marker for the one exchange allowed in flight.
struct PendingExchange {
    id: u64,
    generation: u64,
    user_turn: Turn,
}

/// What an exchange produced; hand it back to `ChatSession::ingest`.
#[derive(Debug)]
pub struct ExchangeOutcome {
    id: u64,
    result: Result<Reply>,
}

impl ExchangeOutcome {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn result(&self) -> &Result<Reply> {
        &self.result
    }
}

/// Resolves once the transport call running on the worker finishes.
/// It holds no borrow of the session, so the owner can keep using the
/// session (e.g. `clear`) while waiting.
pub struct ExchangeHandle {
    id: u64,
    rx: oneshot::Receiver<Result<Reply>>,
}

impl ExchangeHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for ExchangeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeHandle").field("id", &self.id).finish()
    }
}

impl Future for ExchangeHandle {
    type Output = ExchangeOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(ExchangeOutcome { id, result }),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(ExchangeOutcome {
                id,
                result: Err(ChatError::Network(
                    "request worker stopped before replying".to_string(),
                )),
            }),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// One conversation. Owns the transcript; transport calls run on spawned
/// tokio tasks and come back through `ingest`, which is the only place the
/// transcript grows.
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    settings: Arc<dyn SettingsStore>,
    transcript: Transcript,
    generation: u64,
    next_exchange_id: u64,
    pending: Option<PendingExchange>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            transport,
            settings,
            transcript: Transcript::new(),
            generation: 0,
            next_exchange_id: 0,
            pending: None,
        }
    }

    pub fn transcript(&self) -> &[Turn] {
        self.transcript.turns()
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Bumped by every `clear`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Model the next exchange would use.
    pub fn model_in_use(&self) -> String {
        self.settings.selected_model()
    }

    /// Start an exchange for `user_text`.
    ///
    /// Returns `Ok(None)` for blank input without contacting the transport,
    /// `Busy` while a previous exchange is unresolved and `MissingCredential`
    /// when no API key is configured. Must be called within a tokio runtime.
    pub fn submit(&mut self, user_text: &str) -> Result<Option<ExchangeHandle>> {
        let text = user_text.trim();
        if text.is_empty() {
            debug!("Ignoring blank submit");
            return Ok(None);
        }
        if self.pending.is_some() {
            return Err(ChatError::Busy);
        }
        let api_key = self
            .settings
            .credential()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ChatError::MissingCredential)?;
        // Late binding: whatever is selected right now.
        let model_id = self.settings.selected_model();

        let id = self.next_exchange_id;
        self.next_exchange_id += 1;
        info!("Sending message with model: {model_id}");

        let history = self.transcript.turns().to_vec();
        let text = text.to_string();
        self.pending = Some(PendingExchange {
            id,
            generation: self.generation,
            user_turn: Turn::user(text.clone()),
        });

        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let result = transport
                .generate_content(&api_key, &model_id, &text, &history)
                .await;
            let _ = tx.send(result);
        });

        Ok(Some(ExchangeHandle { id, rx }))
    }

    /// Apply a finished exchange.
    ///
    /// On success the user turn and the reply are committed together and the
    /// reply is returned. Failures are returned unchanged and commit nothing.
    /// Outcomes from before the last `clear`, or from unknown exchanges, are
    /// dropped and yield `Ok(None)`.
    pub fn ingest(&mut self, outcome: ExchangeOutcome) -> Result<Option<Turn>> {
        let pending = match self.pending.take() {
            Some(p) if p.id == outcome.id => p,
            other => {
                self.pending = other;
                debug!("Ignoring outcome of unknown exchange {}", outcome.id);
                return Ok(None);
            }
        };

        if pending.generation != self.generation {
            debug!(
                "Dropping result of exchange {} from cleared generation {}",
                outcome.id, pending.generation
            );
            return Ok(None);
        }

        let reply = outcome.result?;
        self.transcript
            .push_exchange(pending.user_turn, reply.turn.clone());
        Ok(Some(reply.turn))
    }

    /// `submit`, wait, `ingest`.
    pub async fn send(&mut self, user_text: &str) -> Result<Option<Turn>> {
        let Some(handle) = self.submit(user_text)? else {
            return Ok(None);
        };
        let outcome = handle.await;
        self.ingest(outcome)
    }

    /// Forget the conversation and release the busy slot. An exchange
    /// already in flight keeps running but its outcome no longer matches
    /// anything and is dropped by `ingest`.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.generation += 1;
        if let Some(abandoned) = self.pending.take() {
            debug!("Abandoning exchange {} on clear", abandoned.id);
        }
        debug!("Transcript cleared, generation {}", self.generation);
    }
}
