//! Attentional communication gate.
use crate::model::SubModel2;
use serde::{Deserialize, Serialize};
use tch::{nn, Device, Tensor};

/// Configuration of [`AttentionGate`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AttentionConfig {
    pub(super) thought_dim: i64,
    pub(super) hidden_dim: i64,
}

impl AttentionConfig {
    /// Constructs a configuration given thought and hidden-state widths.
    pub fn new(thought_dim: i64, hidden_dim: i64) -> Self {
        Self {
            thought_dim,
            hidden_dim,
        }
    }
}

/// Recurrent unit scoring whether an agent should broadcast its thought.
///
/// Communication bandwidth is constrained, so each agent scores the value
/// of sharing its own thought before any collaborator selection happens
/// downstream. The hidden state is threaded by the caller between time
/// steps, starting from [`AttentionGate::init_hidden`]; the gate itself
/// keeps no state between calls.
pub struct AttentionGate {
    config: AttentionConfig,
    device: Device,
    i2h: nn::Linear,
    i2o: nn::Linear,
}

impl AttentionGate {
    /// Returns the zero hidden state that starts an episode.
    pub fn init_hidden(&self, batch_size: i64) -> Tensor {
        Tensor::zeros(&[batch_size, self.config.hidden_dim], tch::kind::FLOAT_CPU)
            .to(self.device)
    }
}

impl SubModel2 for AttentionGate {
    type Config = AttentionConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = (Tensor, Tensor);

    /// Returns the broadcast score in `(0, 1)` and the updated hidden state.
    ///
    /// The hidden update is a raw linear map of the concatenated input;
    /// consumers post-process it if they need a bounded state.
    fn forward(&self, thought: &Tensor, hidden: &Tensor) -> Self::Output {
        let combined = Tensor::cat(&[thought.to(self.device), hidden.to(self.device)], -1);
        let hidden = combined.apply(&self.i2h);
        let score = combined.apply(&self.i2o).sigmoid();
        (score, hidden)
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let p = &(var_store.root() / "attention");
        let in_dim = config.thought_dim + config.hidden_dim;
        let i2h = nn::linear(p / "i2h", in_dim, config.hidden_dim, Default::default());
        let i2o = nn::linear(p / "i2o", in_dim, 1, Default::default());

        Self {
            config,
            device: var_store.device(),
            i2h,
            i2o,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build(var_store, self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;
    use tch::{kind::FLOAT_CPU, nn::VarStore};

    #[test]
    fn fresh_episode_scores_inside_unit_interval() {
        let vs = VarStore::new(Device::Cpu);
        let gate = AttentionGate::build(&vs, AttentionConfig::new(64, 64));

        let hidden = gate.init_hidden(1);
        assert_eq!(hidden.size(), vec![1, 64]);

        let thought = Tensor::zeros(&[1, 64], FLOAT_CPU);
        let (score, hidden) = gate.forward(&thought, &hidden);

        let score = f32::try_from(score).unwrap();
        assert!(score > 0.0 && score < 1.0);

        let nans = f32::try_from(hidden.isnan().sum(tch::Kind::Float)).unwrap();
        assert_eq!(nans, 0.0);
    }

    #[test]
    fn hidden_state_keeps_width_across_steps() {
        let vs = VarStore::new(Device::Cpu);
        let gate = AttentionGate::build(&vs, AttentionConfig::new(32, 32));

        let mut hidden = gate.init_hidden(4);
        for _ in 0..3 {
            let thought = Tensor::randn(&[4, 32], FLOAT_CPU);
            let (score, next_hidden) = gate.forward(&thought, &hidden);
            assert_eq!(score.size(), vec![4, 1]);
            assert_eq!(next_hidden.size(), vec![4, 32]);
            hidden = next_hidden;
        }
    }
}
