use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{stream, StreamExt};
use tutor_api::{is_cancelled, CancellationSignal};

use crate::relay::{ChunkStream, OutboundMessage, Relay, RelayError};

pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

const OFFLINE_GREETING: &str = "Hi! I'm running in offline mode, so no tutor model is \
connected right now. Set TUTOR_API_KEY to reach one, then ask me anything about your studies.";
const TOKEN_DELAY: Duration = Duration::from_millis(40);

/// One server-sent-event frame carrying a content fragment.
#[must_use]
pub fn delta_frame(text: &str) -> Vec<u8> {
    let payload = serde_json::json!({"choices": [{"delta": {"content": text}}]});
    format!("data: {payload}\n\n").into_bytes()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Bytes(Vec<u8>),
    Pause(Duration),
    /// Fail the stream mid-read.
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    Stream(Vec<ScriptStep>),
    /// Fail before any byte is delivered.
    Refuse(String),
}

impl Script {
    /// One frame per fragment followed by `[DONE]`, all in a single chunk each.
    #[must_use]
    pub fn reply(fragments: &[&str]) -> Self {
        let mut steps = fragments
            .iter()
            .map(|fragment| ScriptStep::Bytes(delta_frame(fragment)))
            .collect::<Vec<_>>();
        steps.push(ScriptStep::Bytes(DONE_FRAME.to_vec()));
        Self::Stream(steps)
    }

    #[must_use]
    pub fn chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self::Stream(chunks.into_iter().map(ScriptStep::Bytes).collect())
    }

    fn offline_greeting() -> Self {
        let mut steps = Vec::new();
        let mut pending = String::new();
        for ch in OFFLINE_GREETING.chars() {
            pending.push(ch);
            if ch == ' ' {
                steps.push(ScriptStep::Bytes(delta_frame(&std::mem::take(&mut pending))));
                steps.push(ScriptStep::Pause(TOKEN_DELAY));
            }
        }
        if !pending.is_empty() {
            steps.push(ScriptStep::Bytes(delta_frame(&pending)));
        }
        steps.push(ScriptStep::Bytes(DONE_FRAME.to_vec()));
        Self::Stream(steps)
    }
}

/// Replays queued scripts in order, then the offline greeting forever.
#[derive(Debug)]
pub struct ScriptedRelay {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<Vec<OutboundMessage>>>,
}

impl Default for ScriptedRelay {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ScriptedRelay {
    #[must_use]
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request seen so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<OutboundMessage>> {
        lock_unpoisoned(&self.requests).clone()
    }

    fn next_script(&self) -> Script {
        lock_unpoisoned(&self.scripts)
            .pop_front()
            .unwrap_or_else(Script::offline_greeting)
    }
}

impl Relay for ScriptedRelay {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn open<'a>(
        &'a self,
        messages: &'a [OutboundMessage],
        cancellation: Option<&'a CancellationSignal>,
    ) -> BoxFuture<'a, Result<ChunkStream, RelayError>> {
        Box::pin(async move {
            lock_unpoisoned(&self.requests).push(messages.to_vec());
            if is_cancelled(cancellation) {
                return Err(RelayError::Cancelled);
            }

            let steps = match self.next_script() {
                Script::Refuse(reason) => return Err(RelayError::Scripted(reason)),
                Script::Stream(steps) => steps,
            };

            let chunks = stream::unfold(steps.into_iter(), |mut steps| async move {
                loop {
                    match steps.next()? {
                        ScriptStep::Pause(delay) => tokio::time::sleep(delay).await,
                        ScriptStep::Bytes(bytes) => return Some((Ok(bytes), steps)),
                        ScriptStep::Fail(reason) => {
                            return Some((Err(RelayError::Scripted(reason)), steps))
                        }
                    }
                }
            });
            Ok(chunks.boxed())
        })
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
