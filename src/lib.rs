//! Actor-critic agent with an attentional communication gate, implemented
//! with [tch](https://crates.io/crates/tch).
//!
//! The agent splits its actor into a perception stage producing a "thought"
//! vector, a recurrent attention gate scoring whether that thought should be
//! broadcast to collaborating agents, and a policy head mapping the thought
//! to an action distribution. A centralized critic estimates action values
//! and drives both its own temporal-difference updates and the policy
//! gradient of the actor pipeline. Environment interaction, replay storage
//! and exploration-noise generation live outside this crate; training
//! consumes pre-assembled [`TransitionBatch`]es.
pub mod atoc;
mod error;
pub mod model;
pub mod opt;
mod tensor_batch;
pub mod util;
use serde::{Deserialize, Serialize};
pub use error::AtocError;
pub use tensor_batch::TransitionBatch;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device on which model parameters are placed.
///
/// This enum is added because [`tch::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// A CUDA device.
    Cuda(usize),
}

impl From<tch::Device> for Device {
    fn from(device: tch::Device) -> Self {
        match device {
            tch::Device::Cpu => Self::Cpu,
            tch::Device::Cuda(n) => Self::Cuda(n),
            _ => unimplemented!(),
        }
    }
}

impl From<Device> for tch::Device {
    fn from(device: Device) -> Self {
        match device {
            Device::Cpu => Self::Cpu,
            Device::Cuda(n) => Self::Cuda(n),
        }
    }
}
