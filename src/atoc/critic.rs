//! Centralized action-value critic.
mod base;
mod config;
mod q;
pub use base::Critic;
pub use config::CriticConfig;
pub use q::{StateActionValue, StateActionValueConfig};
