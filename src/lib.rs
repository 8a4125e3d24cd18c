pub mod config;
pub mod models;
pub mod safety;

use tracing_subscriber::EnvFilter;

pub use models::{RiskDomain, Snapshot, TransitionMode};
pub use safety::{DefaultSafetyEngine, KnowledgeBase, SafetyAssessor, SafetyError, SafetyReport};

/// Install the global `tracing` subscriber. Honors `RUST_LOG`, otherwise
/// falls back to `config::default_log_filter()`. A second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
