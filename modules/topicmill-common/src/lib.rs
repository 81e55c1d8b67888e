pub mod config;
pub mod fingerprint;
pub mod types;

pub use config::Config;
pub use fingerprint::fingerprint;
pub use types::{ContentItem, ContentKind, NewContentItem, NewReply, Persona, RawTopic};
