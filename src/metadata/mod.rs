pub mod classify;
pub mod defaults;
pub mod html;
pub mod orchestrator;
pub mod relay;
pub mod types;

pub use classify::normalize_url;
pub use orchestrator::Extractor;
pub use relay::{Relay, RelayChain};
pub use types::{ExtractionResult, Phase, RelayError};
