pub mod alerts;
pub mod education;
pub mod engine;
pub mod features;
pub mod knowledge;
pub mod locale;
pub mod recommendations;
pub mod scoring;
pub mod types;

pub use engine::DefaultSafetyEngine;
pub use knowledge::KnowledgeBase;
pub use locale::{normalize_language, LocalizedText, Localizer};
pub use types::*;
