//! Configuration of the agent.
use super::{
    ActionSpace, ActorConfig, AttentionConfig, CriticConfig, PerceptionConfig, PolicyConfig,
    StateActionValueConfig,
};
use crate::Device;
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Atoc`](super::Atoc).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AtocConfig {
    pub(super) actor_config: ActorConfig,
    pub(super) critic_config: CriticConfig,
    pub(super) gamma: f64,
    pub(super) tau: f64,
    pub(super) train: bool,
    pub(super) seed: Option<i64>,
    /// Device on which the networks live; CPU when not set.
    pub device: Option<Device>,
}

impl Default for AtocConfig {
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            gamma: 0.99,
            tau: 0.001,
            train: false,
            seed: None,
            device: None,
        }
    }
}

impl AtocConfig {
    /// Wires every submodel from the scalar surface: discount factor,
    /// synchronization rate, shared hidden width, observation width and the
    /// action space.
    ///
    /// The thought, gate hidden state and policy latent all share
    /// `hidden_size`.
    pub fn new(
        gamma: f64,
        tau: f64,
        hidden_size: i64,
        num_inputs: i64,
        action_space: ActionSpace,
    ) -> Self {
        let actor_config = ActorConfig::default()
            .perception_config(PerceptionConfig::new(num_inputs, hidden_size))
            .attention_config(AttentionConfig::new(hidden_size, hidden_size))
            .policy_config(PolicyConfig::new(
                hidden_size,
                hidden_size,
                action_space.clone(),
            ));
        let critic_config = CriticConfig::default().q_config(StateActionValueConfig::new(
            num_inputs,
            action_space.out_dim(),
            hidden_size,
        ));

        Self {
            actor_config,
            critic_config,
            gamma,
            tau,
            ..Default::default()
        }
    }

    /// Configuration of the actor pipeline.
    pub fn actor_config(mut self, v: ActorConfig) -> Self {
        self.actor_config = v;
        self
    }

    /// Configuration of the critic.
    pub fn critic_config(mut self, v: CriticConfig) -> Self {
        self.critic_config = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Whether the agent starts in training mode.
    pub fn train(mut self, v: bool) -> Self {
        self.train = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Device.
    pub fn device(mut self, device: tch::Device) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Constructs [`AtocConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of agent from {}", path_.to_str().unwrap());
        Ok(b)
    }

    /// Saves [`AtocConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of agent into {}", path_.to_str().unwrap());
        Ok(())
    }
}
