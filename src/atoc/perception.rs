//! Perception stage of the actor pipeline.
use crate::model::SubModel;
use serde::{Deserialize, Serialize};
use tch::{nn, nn::Module, Device, Tensor};

/// Configuration of [`Perception`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerceptionConfig {
    pub(super) in_dim: i64,
    pub(super) hidden_dim: i64,
}

impl PerceptionConfig {
    /// Constructs a configuration given observation and thought widths.
    pub fn new(in_dim: i64, hidden_dim: i64) -> Self {
        Self { in_dim, hidden_dim }
    }
}

/// Maps an observation to a fixed-size thought vector.
///
/// Two linear layers, each followed by layer normalization. Only the first
/// block applies ReLU; the consumers of the thought apply their own
/// nonlinearity.
pub struct Perception {
    config: PerceptionConfig,
    device: Device,
    seq: nn::Sequential,
}

impl Perception {
    fn create_net(var_store: &nn::VarStore, config: &PerceptionConfig) -> nn::Sequential {
        let p = &(var_store.root() / "perception");

        nn::seq()
            .add(nn::linear(
                p / "l1",
                config.in_dim,
                config.hidden_dim,
                Default::default(),
            ))
            .add(nn::layer_norm(
                p / "ln1",
                vec![config.hidden_dim],
                Default::default(),
            ))
            .add_fn(|x| x.relu())
            .add(nn::linear(
                p / "l2",
                config.hidden_dim,
                config.hidden_dim,
                Default::default(),
            ))
            .add(nn::layer_norm(
                p / "ln2",
                vec![config.hidden_dim],
                Default::default(),
            ))
    }
}

impl SubModel for Perception {
    type Config = PerceptionConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        self.seq.forward(&x.to(self.device))
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let device = var_store.device();
        let seq = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            seq,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build(var_store, self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{kind::FLOAT_CPU, nn::VarStore};

    #[test]
    fn thought_width_equals_hidden_width() {
        let vs = VarStore::new(Device::Cpu);
        let perception = Perception::build(&vs, PerceptionConfig::new(10, 64));

        for &batch_size in &[1i64, 7, 32] {
            let obs = Tensor::randn(&[batch_size, 10], FLOAT_CPU);
            let thought = perception.forward(&obs);
            assert_eq!(thought.size(), vec![batch_size, 64]);
        }
    }
}
