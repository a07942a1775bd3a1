//! Policy stage of the actor pipeline.
use super::scale_down;
use crate::model::SubModel;
use serde::{Deserialize, Serialize};
use tch::{nn, nn::Module, Device, Tensor};

/// Action space of the policy output.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum ActionSpace {
    /// `n` discrete actions; the output is a probability vector over them.
    Discrete(i64),

    /// `d`-dimensional continuous actions, squashed into `[-1, 1]^d`.
    Continuous(i64),
}

impl ActionSpace {
    /// Number of output dimensions of the policy head.
    pub fn out_dim(&self) -> i64 {
        match self {
            Self::Discrete(n) => *n,
            Self::Continuous(d) => *d,
        }
    }
}

/// Configuration of [`PolicyHead`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PolicyConfig {
    pub(super) in_dim: i64,
    pub(super) hidden_dim: i64,
    pub(super) action_space: ActionSpace,
}

impl PolicyConfig {
    /// Constructs a configuration given latent width and action space.
    pub fn new(in_dim: i64, hidden_dim: i64, action_space: ActionSpace) -> Self {
        Self {
            in_dim,
            hidden_dim,
            action_space,
        }
    }
}

/// Maps a latent representation to an action distribution.
///
/// Two linear+layer-norm+ReLU blocks, then an output head squashed with
/// `tanh`. Discrete action spaces additionally normalize the squashed
/// output into a probability vector with a softmax over the action axis.
/// The head starts at a tenth of its default initialization; the initial
/// policy must stay close to neutral for early exploration.
pub struct PolicyHead {
    config: PolicyConfig,
    device: Device,
    seq: nn::Sequential,
    mu: nn::Linear,
}

impl PolicyHead {
    fn create_net(var_store: &nn::VarStore, config: &PolicyConfig) -> (nn::Sequential, nn::Linear) {
        let p = &(var_store.root() / "policy");

        let seq = nn::seq()
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
            .add_fn(|x| x.relu());

        let mut mu = nn::linear(
            p / "mu",
            config.hidden_dim,
            config.action_space.out_dim(),
            Default::default(),
        );
        scale_down(&mut mu, 0.1);

        (seq, mu)
    }
}

impl SubModel for PolicyHead {
    type Config = PolicyConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, latent: &Self::Input) -> Tensor {
        let x = self.seq.forward(&latent.to(self.device));
        let mu = x.apply(&self.mu).tanh();
        match self.config.action_space {
            ActionSpace::Discrete(_) => mu.softmax(-1, tch::Kind::Float),
            ActionSpace::Continuous(_) => mu,
        }
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let device = var_store.device();
        let (seq, mu) = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            seq,
            mu,
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
    fn discrete_output_is_a_distribution() {
        let vs = VarStore::new(Device::Cpu);
        let policy = PolicyHead::build(&vs, PolicyConfig::new(16, 16, ActionSpace::Discrete(4)));

        let latent = Tensor::randn(&[8, 16], FLOAT_CPU);
        let probs = policy.forward(&latent);
        assert_eq!(probs.size(), vec![8, 4]);

        let sums = probs.sum_dim_intlist(Some([-1].as_slice()), false, tch::Kind::Float);
        let err = f32::try_from((sums - 1.0).abs().max()).unwrap();
        assert!(err < 1e-5);
    }

    #[test]
    fn initial_discrete_policy_is_near_uniform() {
        let vs = VarStore::new(Device::Cpu);
        let policy = PolicyHead::build(&vs, PolicyConfig::new(16, 16, ActionSpace::Discrete(4)));

        let latent = Tensor::randn(&[8, 16], FLOAT_CPU);
        let probs = policy.forward(&latent);
        let err = f32::try_from((probs - 0.25).abs().max()).unwrap();
        assert!(err < 0.15);
    }

    #[test]
    fn continuous_output_stays_bounded() {
        let vs = VarStore::new(Device::Cpu);
        let policy = PolicyHead::build(&vs, PolicyConfig::new(16, 16, ActionSpace::Continuous(2)));

        let latent = 100.0 * Tensor::randn(&[8, 16], FLOAT_CPU);
        let act = policy.forward(&latent);
        assert_eq!(act.size(), vec![8, 2]);
        assert!(f32::try_from(act.max()).unwrap() <= 1.0);
        assert!(f32::try_from(act.min()).unwrap() >= -1.0);
    }
}
