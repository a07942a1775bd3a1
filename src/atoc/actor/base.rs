use super::ActorConfig;
use crate::{
    atoc::{AttentionGate, Perception, PolicyHead},
    error::AtocError,
    model::{ModelBase, SubModel, SubModel2},
    opt::{Optimizer, OptimizerConfig},
};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;
use tch::{nn, Device, Tensor};

/// The actor pipeline with its variable store and optimizer.
///
/// One store covers the perception stage, the attention gate and the policy
/// head, so the pipeline synchronizes and optimizes as a unit.
/// [`Actor::forward`] chains perception into the policy head; the gate is
/// driven separately through [`Actor::attend`] by the rollout loop, which
/// owns the decision of what to do with broadcast scores.
pub struct Actor {
    device: Device,
    var_store: nn::VarStore,

    // Observation and action widths, for contract checks.
    in_dim: i64,
    out_dim: i64,

    perception: Perception,
    gate: AttentionGate,
    policy: PolicyHead,

    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl Actor {
    /// Constructs [`Actor`].
    pub fn build(config: ActorConfig, device: Device) -> Result<Actor> {
        let perception_config = config
            .perception_config
            .context("perception_config is not set.")?;
        let attention_config = config
            .attention_config
            .context("attention_config is not set.")?;
        let policy_config = config.policy_config.context("policy_config is not set.")?;

        let in_dim = perception_config.in_dim;
        let out_dim = policy_config.action_space.out_dim();
        if out_dim == 0 {
            return Err(AtocError::EmptyActionSpace.into());
        }

        let var_store = nn::VarStore::new(device);
        let perception = Perception::build(&var_store, perception_config);
        let gate = AttentionGate::build(&var_store, attention_config);
        let policy = PolicyHead::build(&var_store, policy_config);

        Ok(Self::_build(
            device,
            in_dim,
            out_dim,
            config.opt_config,
            perception,
            gate,
            policy,
            var_store,
            None,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn _build(
        device: Device,
        in_dim: i64,
        out_dim: i64,
        opt_config: OptimizerConfig,
        perception: Perception,
        gate: AttentionGate,
        policy: PolicyHead,
        mut var_store: nn::VarStore,
        var_store_src: Option<&nn::VarStore>,
    ) -> Self {
        let opt = opt_config.build(&var_store).unwrap();

        if let Some(var_store_src) = var_store_src {
            var_store.copy(var_store_src).unwrap();
        }

        Self {
            device,
            var_store,
            in_dim,
            out_dim,
            perception,
            gate,
            policy,
            opt_config,
            opt,
        }
    }

    /// Action distribution for a batch of observations.
    pub fn forward(&self, obs: &Tensor) -> Tensor {
        let thought = self.perception.forward(obs);
        let act = self.policy.forward(&thought);
        debug_assert_eq!(*act.size().last().unwrap(), self.out_dim);
        act
    }

    /// Thought vectors of the perception stage.
    pub fn thought(&self, obs: &Tensor) -> Tensor {
        self.perception.forward(obs)
    }

    /// Broadcast scores and updated hidden states of the attention gate.
    pub fn attend(&self, thought: &Tensor, hidden: &Tensor) -> (Tensor, Tensor) {
        self.gate.forward(thought, hidden)
    }

    /// Zero hidden state starting a fresh episode.
    pub fn init_hidden(&self, batch_size: i64) -> Tensor {
        self.gate.init_hidden(batch_size)
    }

    /// Observation width the pipeline was configured with.
    pub fn in_dim(&self) -> i64 {
        self.in_dim
    }

    /// Action width the pipeline was configured with.
    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }
}

impl Clone for Actor {
    fn clone(&self) -> Self {
        let device = self.device;
        let opt_config = self.opt_config.clone();
        let var_store = nn::VarStore::new(device);
        let perception = self.perception.clone_with_var_store(&var_store);
        let gate = self.gate.clone_with_var_store(&var_store);
        let policy = self.policy.clone_with_var_store(&var_store);

        Self::_build(
            device,
            self.in_dim,
            self.out_dim,
            opt_config,
            perception,
            gate,
            policy,
            var_store,
            Some(&self.var_store),
        )
    }
}

impl ModelBase for Actor {
    fn backward_step(&mut self, loss: &Tensor) {
        self.opt.backward_step(loss);
    }

    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }

    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.var_store.save(&path)?;
        info!("Save actor to {:?}", path.as_ref());
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load actor from {:?}", path.as_ref());
        Ok(())
    }
}
