pub mod acquisition;
pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod providers;
pub mod synthesis;
pub mod types;

pub use agent::TacticsAgent;
pub use config::Config;
pub use error::AgentError;
pub use types::*;
