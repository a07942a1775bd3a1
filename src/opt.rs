//! Optimizers.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tch::{
    nn::{Adam, AdamW, Optimizer as Optimizer_, OptimizerConfig as OptimizerConfig_, VarStore},
    Tensor,
};

/// Configures the optimizer attached to a model's variable store.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// First moment decay.
        beta1: f64,
        /// Second moment decay.
        beta2: f64,
        /// Weight decay.
        wd: f64,
        /// Epsilon in the denominator.
        eps: f64,
        /// Whether to use the AMSGrad variant.
        amsgrad: bool,
    },
}

impl OptimizerConfig {
    /// Constructs an optimizer over the variables of `vs`.
    pub fn build(&self, vs: &VarStore) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam { lr } => {
                let opt = Adam::default().build(vs, *lr)?;
                Ok(Optimizer::Adam(opt))
            }
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                wd,
                eps,
                amsgrad,
            } => {
                let opt = AdamW {
                    beta1: *beta1,
                    beta2: *beta2,
                    wd: *wd,
                    eps: *eps,
                    amsgrad: *amsgrad,
                }
                .build(vs, *lr)?;
                Ok(Optimizer::AdamW(opt))
            }
        }
    }
}

/// Thin wrapper of [`tch::nn::Optimizer`].
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Optimizer_),

    /// AdamW optimizer.
    AdamW(Optimizer_),
}

impl Optimizer {
    /// Zeroes gradients, backpropagates `loss` and applies one step.
    ///
    /// Only variables of the store this optimizer was built over are
    /// stepped; gradients flowing into other stores are left for their own
    /// optimizers to clear.
    pub fn backward_step(&mut self, loss: &Tensor) {
        match self {
            Self::Adam(opt) => {
                opt.backward_step(loss);
            }
            Self::AdamW(opt) => {
                opt.backward_step(loss);
            }
        }
    }
}
