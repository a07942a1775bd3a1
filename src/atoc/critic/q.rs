//! Action-value submodel.
use crate::atoc::scale_down;
use crate::model::SubModel2;
use serde::{Deserialize, Serialize};
use tch::{nn, nn::Module, Device, Tensor};

/// Configuration of [`StateActionValue`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct StateActionValueConfig {
    pub(in crate::atoc) obs_dim: i64,
    pub(in crate::atoc) act_dim: i64,
    pub(in crate::atoc) hidden_dim: i64,
}

impl StateActionValueConfig {
    /// Constructs a configuration given observation, action and hidden widths.
    pub fn new(obs_dim: i64, act_dim: i64, hidden_dim: i64) -> Self {
        Self {
            obs_dim,
            act_dim,
            hidden_dim,
        }
    }
}

/// Estimates the value of an observation-action pair.
///
/// The observation passes through its own linear+layer-norm+ReLU block;
/// the action vector is concatenated only at the second block, then a
/// single linear unit projects to the scalar value. The value head starts
/// at a tenth of its default initialization.
pub struct StateActionValue {
    config: StateActionValueConfig,
    device: Device,
    obs_block: nn::Sequential,
    joint_block: nn::Sequential,
    v: nn::Linear,
}

impl StateActionValue {
    fn create_net(
        var_store: &nn::VarStore,
        config: &StateActionValueConfig,
    ) -> (nn::Sequential, nn::Sequential, nn::Linear) {
        let p = &(var_store.root() / "q");

        let obs_block = nn::seq()
            .add(nn::linear(
                p / "l1",
                config.obs_dim,
                config.hidden_dim,
                Default::default(),
            ))
            .add(nn::layer_norm(
                p / "ln1",
                vec![config.hidden_dim],
                Default::default(),
            ))
            .add_fn(|x| x.relu());

        let joint_block = nn::seq()
            .add(nn::linear(
                p / "l2",
                config.hidden_dim + config.act_dim,
                config.hidden_dim,
                Default::default(),
            ))
            .add(nn::layer_norm(
                p / "ln2",
                vec![config.hidden_dim],
                Default::default(),
            ))
            .add_fn(|x| x.relu());

        let mut v = nn::linear(p / "v", config.hidden_dim, 1, Default::default());
        scale_down(&mut v, 0.1);

        (obs_block, joint_block, v)
    }
}

impl SubModel2 for StateActionValue {
    type Config = StateActionValueConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn forward(&self, obs: &Self::Input1, act: &Self::Input2) -> Tensor {
        let x = self.obs_block.forward(&obs.to(self.device));
        let x = Tensor::cat(&[x, act.to(self.device)], -1);
        self.joint_block.forward(&x).apply(&self.v)
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let device = var_store.device();
        let (obs_block, joint_block, v) = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            obs_block,
            joint_block,
            v,
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
    fn value_is_one_scalar_per_transition() {
        let vs = VarStore::new(Device::Cpu);
        let q = StateActionValue::build(&vs, StateActionValueConfig::new(10, 2, 64));

        let obs = Tensor::randn(&[32, 10], FLOAT_CPU);
        let act = Tensor::randn(&[32, 2], FLOAT_CPU);
        assert_eq!(q.forward(&obs, &act).size(), vec![32, 1]);
    }
}
