#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tutor::relays::{Script, ScriptedRelay};
use tutor::ChatRuntime;
use tutor_api::CancellationSignal;
use tutor_store::{ConversationStore, MemorySnapshots};

pub const INSTRUCTIONS: &str = "You are a test tutor.";

pub fn runtime_with(scripts: Vec<Script>) -> (ChatRuntime<ScriptedRelay>, MemorySnapshots) {
    let backend = MemorySnapshots::new();
    let store = ConversationStore::open(backend.clone());
    let runtime = ChatRuntime::new(store, ScriptedRelay::new(scripts), INSTRUCTIONS);
    (runtime, backend)
}

pub fn cancellation() -> CancellationSignal {
    Arc::new(AtomicBool::new(false))
}

pub fn ignore(_: &str) {}
