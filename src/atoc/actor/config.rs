use crate::{
    atoc::{AttentionConfig, PerceptionConfig, PolicyConfig},
    opt::OptimizerConfig,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Actor`](super::Actor).
pub struct ActorConfig {
    pub(in crate::atoc) perception_config: Option<PerceptionConfig>,
    pub(in crate::atoc) attention_config: Option<AttentionConfig>,
    pub(in crate::atoc) policy_config: Option<PolicyConfig>,
    pub(in crate::atoc) opt_config: OptimizerConfig,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            perception_config: None,
            attention_config: None,
            policy_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-4 },
        }
    }
}

impl ActorConfig {
    /// Sets the configuration of the perception stage.
    pub fn perception_config(mut self, v: PerceptionConfig) -> Self {
        self.perception_config = Some(v);
        self
    }

    /// Sets the configuration of the attention gate.
    pub fn attention_config(mut self, v: AttentionConfig) -> Self {
        self.attention_config = Some(v);
        self
    }

    /// Sets the configuration of the policy head.
    pub fn policy_config(mut self, v: PolicyConfig) -> Self {
        self.policy_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
