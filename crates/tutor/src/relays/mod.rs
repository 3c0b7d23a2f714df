use crate::config::{ConfigError, RelayKind, TutorConfig};
use crate::relay::{Relay, RelayError};

mod http;
mod mock;

pub use http::HttpRelay;
pub use mock::{delta_frame, Script, ScriptStep, ScriptedRelay, DONE_FRAME};

#[derive(Debug, thiserror::Error)]
pub enum RelaySetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build http relay: {0}")]
    Relay(#[from] RelayError),
}

/// Build the relay selected by `config`.
pub fn relay_for_config(config: &TutorConfig) -> Result<Box<dyn Relay>, RelaySetupError> {
    match config.resolved_relay() {
        RelayKind::Http => Ok(Box::new(HttpRelay::new(config.api_config()?)?)),
        RelayKind::Mock => {
            tracing::info!("no API key configured; using the offline mock relay");
            Ok(Box::new(ScriptedRelay::default()))
        }
    }
}
