//! Tindev client library: config, session storage, candidate queue, devs API
//! calls and the realtime match listener. Used by the tindev app and CLI.

pub mod api;
pub mod config;
pub mod error;
pub mod interaction;
pub mod mailbox;
pub mod messages;
pub mod queue;
pub mod realtime;
pub mod session;

pub use api::{Action, ApiClient};
pub use config::{default_config_path, ApiSection, Config, ConfigError, RealtimeSection, StorageSection};
pub use error::ClientError;
pub use interaction::{InteractionOutcome, Interactions};
pub use mailbox::MatchMailbox;
pub use messages::{Candidate, MatchEvent};
pub use queue::CandidateQueue;
pub use realtime::{ConnectionState, MatchSubscription, RealtimeSettings};
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionStore, StorageError};
