//! The trainer tying the actor pipeline and the critic together.
use super::{Actor, AtocConfig, Critic};
use crate::{
    error::AtocError, model::ModelBase, tensor_batch::TransitionBatch, util::track,
};
use anyhow::Result;
use log::trace;
use std::convert::TryFrom;
use std::{fs, path::Path};
use tch::{no_grad, Tensor};

/// Actor-critic agent with an attentional communication gate.
///
/// The agent exclusively owns the live and target parameter stores and
/// their optimizers; the target stores are written only by the
/// synchronization functions in [`crate::util`]. One call to
/// [`Atoc::update_parameters`] is one synchronous training step: the critic
/// regresses on temporal-difference targets computed from the lagged target
/// networks, the actor then differentiates through the freshly updated
/// critic, and both targets are soft-synchronized last.
pub struct Atoc {
    actor: Actor,
    actor_tgt: Actor,
    critic: Critic,
    critic_tgt: Critic,
    gamma: f64,
    tau: f64,
    num_inputs: i64,
    out_dim: i64,
    train: bool,
    device: tch::Device,
}

impl Atoc {
    /// Constructs the agent.
    ///
    /// Each target network starts as an exact copy of its live counterpart;
    /// this is the only hard synchronization in the agent's lifetime.
    pub fn build(config: AtocConfig) -> Result<Self> {
        let device = config.device.map(Into::into).unwrap_or(tch::Device::Cpu);

        if let Some(seed) = config.seed {
            tch::manual_seed(seed);
        }

        let actor = Actor::build(config.actor_config, device)?;
        let critic = Critic::build(config.critic_config, device)?;
        let actor_tgt = actor.clone();
        let critic_tgt = critic.clone();

        let num_inputs = actor.in_dim();
        let out_dim = actor.out_dim();

        Ok(Self {
            actor,
            actor_tgt,
            critic,
            critic_tgt,
            gamma: config.gamma,
            tau: config.tau,
            num_inputs,
            out_dim,
            train: config.train,
            device,
        })
    }

    /// One synchronous training step over a transition batch.
    ///
    /// Returns `(critic_loss, actor_loss)`. The step order is a contract:
    /// temporal-difference targets come from the targets as they stood
    /// before this call, and the actor step sees the critic as updated by
    /// this call.
    pub fn update_parameters(&mut self, batch: &TransitionBatch) -> Result<(f32, f32)> {
        self.check_batch(batch)?;

        let tgt = no_grad(|| {
            let next_a = self.actor_tgt.forward(&batch.next_obs);
            let next_q = self.critic_tgt.forward(&batch.next_obs, &next_a);
            batch.reward.to(self.device)
                + Tensor::from(self.gamma) * batch.not_done.to(self.device) * next_q
        });

        let critic_loss = {
            let pred = self.critic.forward(&batch.obs, &batch.act);
            debug_assert_eq!(pred.size(), tgt.size());
            pred.mse_loss(&tgt, tch::Reduction::Mean)
        };
        self.critic.backward_step(&critic_loss);
        trace!("critic step");

        let actor_loss = {
            let act = self.actor.forward(&batch.obs);
            -self.critic.forward(&batch.obs, &act).mean(tch::Kind::Float)
        };
        self.actor.backward_step(&actor_loss);
        trace!("actor step");

        track(&mut self.critic_tgt, &mut self.critic, self.tau);
        track(&mut self.actor_tgt, &mut self.actor, self.tau);

        Ok((f32::try_from(critic_loss)?, f32::try_from(actor_loss)?))
    }

    /// Greedy action for `obs`, with optional exploration noise on top.
    ///
    /// The forward pass runs without gradient tracking. The result is
    /// clamped componentwise to `[-1, 1]` whatever the noise magnitude.
    pub fn select_action(&self, obs: &Tensor, action_noise: Option<&Tensor>) -> Result<Tensor> {
        if *obs.size().last().unwrap_or(&0) != self.num_inputs {
            return Err(AtocError::ShapeMismatch {
                name: "obs",
                expected: vec![-1, self.num_inputs],
                got: obs.size(),
            }
            .into());
        }

        let act = no_grad(|| self.actor.forward(obs));
        let act = match action_noise {
            Some(noise) => act + noise,
            None => act,
        };

        Ok(act.clip(-1.0, 1.0))
    }

    /// Zero hidden state for a fresh episode of `batch_size` agents.
    pub fn init_hidden(&self, batch_size: i64) -> Tensor {
        self.actor.init_hidden(batch_size)
    }

    /// Thought vectors for a batch of observations, without gradient tracking.
    pub fn thought(&self, obs: &Tensor) -> Tensor {
        no_grad(|| self.actor.thought(obs))
    }

    /// Scores whether each agent should broadcast its thought.
    ///
    /// Returns the scores in `(0, 1)` and the hidden states for the next
    /// round; the caller threads the hidden states between calls.
    pub fn attend(&self, thought: &Tensor, hidden: &Tensor) -> (Tensor, Tensor) {
        no_grad(|| self.actor.attend(thought, hidden))
    }

    /// Switches to training mode.
    pub fn train(&mut self) {
        self.train = true;
    }

    /// Switches to evaluation mode.
    pub fn eval(&mut self) {
        self.train = false;
    }

    /// Whether the agent is in training mode.
    pub fn is_train(&self) -> bool {
        self.train
    }

    /// Saves the live and target networks under `path`.
    ///
    /// The directory is created when missing.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        fs::create_dir_all(&path)?;
        self.actor.save(path.as_ref().join("actor.pt"))?;
        self.actor_tgt.save(path.as_ref().join("actor_tgt.pt"))?;
        self.critic.save(path.as_ref().join("critic.pt"))?;
        self.critic_tgt.save(path.as_ref().join("critic_tgt.pt"))?;
        Ok(())
    }

    /// Loads the live and target networks from `path`.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.actor.load(path.as_ref().join("actor.pt"))?;
        self.actor_tgt.load(path.as_ref().join("actor_tgt.pt"))?;
        self.critic.load(path.as_ref().join("critic.pt"))?;
        self.critic_tgt.load(path.as_ref().join("critic_tgt.pt"))?;
        Ok(())
    }

    fn check_batch(&self, batch: &TransitionBatch) -> Result<()> {
        if batch.obs.size()[1] != self.num_inputs {
            return Err(AtocError::ShapeMismatch {
                name: "obs",
                expected: vec![batch.batch_size(), self.num_inputs],
                got: batch.obs.size(),
            }
            .into());
        }
        if batch.act.size()[1] != self.out_dim {
            return Err(AtocError::ShapeMismatch {
                name: "act",
                expected: vec![batch.batch_size(), self.out_dim],
                got: batch.act.size(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;
    use crate::atoc::ActionSpace;
    use crate::model::ModelBase;
    use tch::kind::FLOAT_CPU;
    use tempdir::TempDir;

    fn agent(seed: i64) -> Atoc {
        let config = AtocConfig::new(0.99, 0.001, 64, 10, ActionSpace::Continuous(2)).seed(seed);
        Atoc::build(config).unwrap()
    }

    fn distance<M: ModelBase>(a: &M, b: &M) -> f32 {
        let va = a.get_var_store().variables();
        let vb = b.get_var_store().variables();
        let mut d = 0f32;
        for (name, ta) in va.iter() {
            let tb = vb.get(name).unwrap();
            d += f32::try_from((ta - tb).square().sum(tch::Kind::Float)).unwrap();
        }
        d.sqrt()
    }

    fn zero_batch(n: i64) -> TransitionBatch {
        TransitionBatch::new(
            Tensor::zeros(&[n, 10], FLOAT_CPU),
            Tensor::zeros(&[n, 2], FLOAT_CPU),
            Tensor::zeros(&[n], FLOAT_CPU),
            Tensor::zeros(&[n, 10], FLOAT_CPU),
            Tensor::ones(&[n], FLOAT_CPU),
        )
        .unwrap()
    }

    fn random_batch(n: i64) -> TransitionBatch {
        TransitionBatch::new(
            Tensor::randn(&[n, 10], FLOAT_CPU),
            Tensor::randn(&[n, 2], FLOAT_CPU).clamp(-1.0, 1.0),
            Tensor::randn(&[n], FLOAT_CPU),
            Tensor::randn(&[n, 10], FLOAT_CPU),
            Tensor::ones(&[n], FLOAT_CPU),
        )
        .unwrap()
    }

    #[test]
    fn update_yields_finite_losses_and_lagging_targets() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut agent = agent(42);
        assert_eq!(distance(&agent.critic, &agent.critic_tgt), 0.0);
        assert_eq!(distance(&agent.actor, &agent.actor_tgt), 0.0);

        let critic_before = agent.critic.clone();
        let (critic_loss, actor_loss) = agent.update_parameters(&zero_batch(32)).unwrap();

        assert!(critic_loss.is_finite());
        assert!(actor_loss.is_finite());

        // One soft update: live - target = (1 - tau) * (live - old live).
        let live_tgt = distance(&agent.critic, &agent.critic_tgt);
        let live_old = distance(&agent.critic, &critic_before);
        assert!(live_old > 0.0);
        assert!((live_tgt - 0.999 * live_old).abs() < 1e-3 * live_old.max(1.0));
    }

    #[test]
    fn repeated_updates_shrink_critic_loss() {
        let mut agent = agent(7);
        let batch = random_batch(32);

        let (first, _) = agent.update_parameters(&batch).unwrap();
        let (second, _) = agent.update_parameters(&batch).unwrap();

        // Descent on a fixed batch; a little slack for overshoot.
        assert!(second <= first * 1.05 + 1e-4);
    }

    #[test]
    fn select_action_is_clamped() {
        let agent = agent(3);
        let obs = Tensor::randn(&[5, 10], FLOAT_CPU);
        let noise = 1e3 * Tensor::randn(&[5, 2], FLOAT_CPU);

        let act = agent.select_action(&obs, Some(&noise)).unwrap();
        assert_eq!(act.size(), vec![5, 2]);
        assert!(f32::try_from(act.max()).unwrap() <= 1.0);
        assert!(f32::try_from(act.min()).unwrap() >= -1.0);
    }

    #[test]
    fn communication_round() {
        let agent = agent(11);
        let hidden = agent.init_hidden(3);
        let thought = agent.thought(&Tensor::randn(&[3, 10], FLOAT_CPU));
        assert_eq!(thought.size(), vec![3, 64]);

        let (score, next_hidden) = agent.attend(&thought, &hidden);
        assert_eq!(score.size(), vec![3, 1]);
        assert_eq!(next_hidden.size(), hidden.size());
        assert!(f32::try_from(score.max()).unwrap() < 1.0);
        assert!(f32::try_from(score.min()).unwrap() > 0.0);
    }

    #[test]
    fn rejects_mismatched_observation_width() {
        let mut agent = agent(5);

        let batch = TransitionBatch::new(
            Tensor::zeros(&[4, 3], FLOAT_CPU),
            Tensor::zeros(&[4, 2], FLOAT_CPU),
            Tensor::zeros(&[4], FLOAT_CPU),
            Tensor::zeros(&[4, 3], FLOAT_CPU),
            Tensor::ones(&[4], FLOAT_CPU),
        )
        .unwrap();
        assert!(agent.update_parameters(&batch).is_err());

        let obs = Tensor::zeros(&[1, 3], FLOAT_CPU);
        assert!(agent.select_action(&obs, None).is_err());
    }

    #[test]
    fn empty_action_space_fails_at_construction() {
        let config = AtocConfig::new(0.99, 0.001, 16, 4, ActionSpace::Continuous(0));
        assert!(Atoc::build(config).is_err());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = TempDir::new("atoc").unwrap();
        let path = dir.path().join("models").join("atoc");

        let agent = agent(21);
        agent.save(&path).unwrap();

        let mut other = self::agent(22);
        assert!(distance(&other.actor, &agent.actor) > 0.0);

        other.load(&path).unwrap();
        assert_eq!(distance(&other.actor, &agent.actor), 0.0);
        assert_eq!(distance(&other.critic, &agent.critic), 0.0);
        assert_eq!(distance(&other.actor_tgt, &agent.actor_tgt), 0.0);
        assert_eq!(distance(&other.critic_tgt, &agent.critic_tgt), 0.0);
    }
}
