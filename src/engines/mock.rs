/*!
 * Mock engine for dry runs and tests.
 *
 * The echo mode extracts the input payload from the rendered prompt and
 * returns it as a well-formed delimited result, so the whole pipeline can
 * be exercised without any network access. The scripted mode replays a
 * queue of canned replies and failures, which is what the retry, fallback
 * and escalation tests build on.
 */

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ChatReply, ChatRequest, Engine};
use crate::errors::EngineError;
use crate::prompts::{RESULT_BEGIN, RESULT_END};

/// A canned reply queued on a scripted mock engine.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text verbatim
    Text(String),
    /// Fail with a transient 503-style API error
    Transient,
    /// Fail with a rate-limit error carrying an explicit retry hint
    RateLimited {
        /// Hint in milliseconds
        retry_after_ms: u64,
    },
    /// Fail with a timeout classified against this timeout budget
    Timeout {
        /// Budget reported in the error
        timeout_ms: u64,
    },
    /// Fail with a permanent authentication error
    Permanent,
}

impl ScriptedReply {
    fn into_result(self, engine: &str) -> Result<String, EngineError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Transient => Err(EngineError::Api {
                engine: engine.to_string(),
                status_code: 503,
                message: "scripted transient failure".to_string(),
            }),
            Self::RateLimited { retry_after_ms } => Err(EngineError::RateLimited {
                engine: engine.to_string(),
                message: "scripted rate limit".to_string(),
                retry_after_ms: Some(retry_after_ms),
            }),
            Self::Timeout { timeout_ms } => Err(EngineError::Timeout {
                engine: engine.to_string(),
                timeout_ms,
            }),
            Self::Permanent => Err(EngineError::Authentication {
                engine: engine.to_string(),
                message: "scripted auth rejection".to_string(),
            }),
        }
    }
}

/// In-process engine implementation with no transport.
#[derive(Debug)]
pub struct MockEngine {
    name: String,
    replies: Mutex<VecDeque<ScriptedReply>>,
    call_count: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
    latency: Mutex<Option<std::time::Duration>>,
}

impl MockEngine {
    /// Create an echoing mock: every call returns the input payload as the
    /// "translation".
    pub fn echo(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            call_count: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            latency: Mutex::new(None),
        }
    }

    /// Create a scripted mock replaying the given replies in order.
    ///
    /// Once the script is exhausted, the engine behaves like `echo`.
    pub fn scripted(name: impl Into<String>, replies: Vec<ScriptedReply>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(replies.into()),
            call_count: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            latency: Mutex::new(None),
        }
    }

    /// Delay every reply by `latency`, to exercise adapter timeouts.
    pub fn with_latency(self, latency: std::time::Duration) -> Self {
        *self.latency.lock() = Some(latency);
        self
    }

    /// Queue one more scripted reply.
    pub fn push_reply(&self, reply: ScriptedReply) {
        self.replies.lock().push_back(reply);
    }

    /// Number of completed calls so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The most recent request, for assertions on prompt contents.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().clone()
    }

    /// Build the echo reply from a rendered prompt.
    ///
    /// Finds the input JSON array inside the user message and wraps it in
    /// the result delimiters; falls back to echoing the raw user text.
    fn echo_reply(user: &str) -> String {
        if let (Some(start), Some(end)) = (user.find('['), user.rfind(']')) {
            if start < end {
                let payload = &user[start..=end];
                if serde_json::from_str::<Vec<String>>(payload).is_ok() {
                    return format!("{}\n{}\n{}", RESULT_BEGIN, payload, RESULT_END);
                }
            }
        }
        user.to_string()
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, EngineError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.replies.lock().pop_front();
        let text = match scripted {
            Some(reply) => reply.into_result(&self.name)?,
            None => Self::echo_reply(&request.user),
        };

        Ok(ChatReply {
            text,
            prompt_tokens: None,
            completion_tokens: None,
        })
    }

    async fn check_connection(&self) -> Result<(), EngineError> {
        Ok(())
    }
}
