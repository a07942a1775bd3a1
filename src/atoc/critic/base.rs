use super::{CriticConfig, StateActionValue};
use crate::{
    model::{ModelBase, SubModel2},
    opt::{Optimizer, OptimizerConfig},
};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;
use tch::{nn, Device, Tensor};

/// Action-value estimator with its variable store and optimizer.
pub struct Critic {
    device: Device,
    var_store: nn::VarStore,
    q: StateActionValue,
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl Critic {
    /// Constructs [`Critic`].
    pub fn build(config: CriticConfig, device: Device) -> Result<Critic> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let opt_config = config.opt_config;
        let var_store = nn::VarStore::new(device);
        let q = StateActionValue::build(&var_store, q_config);

        Ok(Self::_build(device, opt_config, q, var_store, None))
    }

    fn _build(
        device: Device,
        opt_config: OptimizerConfig,
        q: StateActionValue,
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
            q,
            opt_config,
            opt,
        }
    }

    /// Value of a batch of observation-action pairs, `[batch, 1]`.
    pub fn forward(&self, obs: &Tensor, act: &Tensor) -> Tensor {
        self.q.forward(obs, act)
    }
}

impl Clone for Critic {
    fn clone(&self) -> Self {
        let device = self.device;
        let opt_config = self.opt_config.clone();
        let var_store = nn::VarStore::new(device);
        let q = self.q.clone_with_var_store(&var_store);

        Self::_build(device, opt_config, q, var_store, Some(&self.var_store))
    }
}

impl ModelBase for Critic {
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
        info!("Save critic to {:?}", path.as_ref());
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load critic from {:?}", path.as_ref());
        Ok(())
    }
}
