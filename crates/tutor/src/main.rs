use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tutor::app::{Flow, TutorApp};
use tutor::{logging, relays, ChatRuntime, Relay, TutorConfig};
use tutor_store::ConversationStore;

#[tokio::main]
async fn main() -> io::Result<()> {
    logging::init();

    let config = TutorConfig::load().map_err(io::Error::other)?;
    let relay = relays::relay_for_config(&config).map_err(io::Error::other)?;
    let data_dir = config.data_dir();
    let store = ConversationStore::open_dir(&data_dir).map_err(io::Error::other)?;
    tracing::info!(data_dir = %data_dir.display(), relay = relay.name(), "tutor starting");

    let runtime = ChatRuntime::new(store, relay, config.system_instructions());
    let mut app = TutorApp::new(runtime, io::stdout());

    // Ctrl-C closes the conversation view: any in-flight stream is released
    // and the loop below exits.
    let cancellation = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(Notify::new());
    tokio::spawn({
        let cancellation = Arc::clone(&cancellation);
        let interrupted = Arc::clone(&interrupted);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancellation.store(true, Ordering::Release);
                interrupted.notify_one();
            }
        }
    });

    app.greet()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        app.prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = interrupted.notified() => None,
        };
        let Some(line) = line else {
            break;
        };

        let flow = app.handle_line(&line, &cancellation).await?;
        if flow == Flow::Quit || cancellation.load(Ordering::Acquire) {
            break;
        }
    }

    app.farewell()
}
