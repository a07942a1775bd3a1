//! Batch of transitions consumed by the training step.
use crate::error::AtocError;
use anyhow::Result;
use tch::Tensor;

/// A batch of environment transitions.
///
/// The replay collaborator assembles this from its storage; all five fields
/// share one leading batch dimension. `not_done` is the continuation mask,
/// 1.0 for a non-terminal `next_obs` and 0.0 for a terminal one, which
/// zeroes the bootstrap term of the temporal-difference target.
pub struct TransitionBatch {
    /// Observations, `[batch, obs_dim]`.
    pub obs: Tensor,

    /// Actions, `[batch, act_dim]`.
    pub act: Tensor,

    /// Rewards, `[batch, 1]`.
    pub reward: Tensor,

    /// Next observations, `[batch, obs_dim]`.
    pub next_obs: Tensor,

    /// Continuation mask, `[batch, 1]`.
    pub not_done: Tensor,
}

impl TransitionBatch {
    /// Validates and assembles a batch from pre-aligned tensors.
    ///
    /// `reward` and `not_done` may be given as `[batch]` or `[batch, 1]`
    /// and are stored as columns. A batch that is empty or misaligned is
    /// rejected here rather than surfacing as degenerate gradients later.
    pub fn new(
        obs: Tensor,
        act: Tensor,
        reward: Tensor,
        next_obs: Tensor,
        not_done: Tensor,
    ) -> Result<Self> {
        if obs.size().len() != 2 || act.size().len() != 2 {
            return Err(AtocError::MalformedBatch(format!(
                "obs and act must have shape [batch, dim], got {:?} and {:?}",
                obs.size(),
                act.size()
            ))
            .into());
        }

        let batch_size = obs.size()[0];
        if batch_size == 0 {
            return Err(AtocError::MalformedBatch("empty batch".into()).into());
        }
        if next_obs.size() != obs.size() {
            return Err(AtocError::MalformedBatch(format!(
                "next_obs shape {:?} differs from obs shape {:?}",
                next_obs.size(),
                obs.size()
            ))
            .into());
        }
        if act.size()[0] != batch_size {
            return Err(AtocError::MalformedBatch(format!(
                "act has leading dimension {}, expected {}",
                act.size()[0],
                batch_size
            ))
            .into());
        }

        let reward = Self::column(reward, batch_size, "reward")?;
        let not_done = Self::column(not_done, batch_size, "not_done")?;

        Ok(Self {
            obs,
            act,
            reward,
            next_obs,
            not_done,
        })
    }

    /// Returns the shared leading batch dimension.
    pub fn batch_size(&self) -> i64 {
        self.obs.size()[0]
    }

    fn column(t: Tensor, batch_size: i64, name: &'static str) -> Result<Tensor> {
        match t.size().as_slice() {
            [n] if *n == batch_size => Ok(t.unsqueeze(-1)),
            [n, 1] if *n == batch_size => Ok(t),
            s => Err(AtocError::ShapeMismatch {
                name,
                expected: vec![batch_size, 1],
                got: s.to_vec(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TransitionBatch;
    use tch::{kind::FLOAT_CPU, Tensor};

    #[test]
    fn accepts_flat_reward_and_mask() {
        let batch = TransitionBatch::new(
            Tensor::zeros(&[4, 3], FLOAT_CPU),
            Tensor::zeros(&[4, 2], FLOAT_CPU),
            Tensor::zeros(&[4], FLOAT_CPU),
            Tensor::zeros(&[4, 3], FLOAT_CPU),
            Tensor::ones(&[4, 1], FLOAT_CPU),
        )
        .unwrap();

        assert_eq!(batch.batch_size(), 4);
        assert_eq!(batch.reward.size(), vec![4, 1]);
        assert_eq!(batch.not_done.size(), vec![4, 1]);
    }

    #[test]
    fn rejects_empty_batch() {
        let res = TransitionBatch::new(
            Tensor::zeros(&[0, 3], FLOAT_CPU),
            Tensor::zeros(&[0, 2], FLOAT_CPU),
            Tensor::zeros(&[0], FLOAT_CPU),
            Tensor::zeros(&[0, 3], FLOAT_CPU),
            Tensor::zeros(&[0], FLOAT_CPU),
        );
        assert!(res.is_err());
    }

    #[test]
    fn rejects_misaligned_leading_dimensions() {
        let res = TransitionBatch::new(
            Tensor::zeros(&[4, 3], FLOAT_CPU),
            Tensor::zeros(&[3, 2], FLOAT_CPU),
            Tensor::zeros(&[4], FLOAT_CPU),
            Tensor::zeros(&[4, 3], FLOAT_CPU),
            Tensor::ones(&[4], FLOAT_CPU),
        );
        assert!(res.is_err());

        let res = TransitionBatch::new(
            Tensor::zeros(&[4, 3], FLOAT_CPU),
            Tensor::zeros(&[4, 2], FLOAT_CPU),
            Tensor::zeros(&[5], FLOAT_CPU),
            Tensor::zeros(&[4, 3], FLOAT_CPU),
            Tensor::ones(&[4], FLOAT_CPU),
        );
        assert!(res.is_err());
    }
}
