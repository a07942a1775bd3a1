//! Actor-critic agent with an attentional communication gate.
mod actor;
mod attention;
mod base;
mod config;
mod critic;
mod perception;
mod policy;
pub use actor::{Actor, ActorConfig};
pub use attention::{AttentionConfig, AttentionGate};
pub use base::Atoc;
pub use config::AtocConfig;
pub use critic::{Critic, CriticConfig, StateActionValue, StateActionValueConfig};
pub use perception::{Perception, PerceptionConfig};
pub use policy::{ActionSpace, PolicyConfig, PolicyHead};

use tch::nn;

/// Shrinks the weights and bias of a freshly initialized layer.
///
/// Output heads start at a fraction of their default initialization so the
/// initial policy and value estimates stay close to neutral.
pub(crate) fn scale_down(layer: &mut nn::Linear, factor: f64) {
    tch::no_grad(|| {
        let ws = factor * &layer.ws;
        layer.ws.copy_(&ws);
        if let Some(bs) = layer.bs.as_mut() {
            let scaled = factor * &*bs;
            bs.copy_(&scaled);
        }
    });
}
