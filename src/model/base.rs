//! Definition of interfaces of neural networks.
use anyhow::Result;
use std::path::Path;
use tch::{nn::VarStore, Tensor};

/// Interface of a model owning its [`VarStore`] and optimizer.
///
/// Only two kinds of writers ever touch parameters: [`backward_step`]
/// writes the live variables of its own store, and the synchronization
/// functions in [`crate::util`] write target stores.
///
/// [`backward_step`]: ModelBase::backward_step
pub trait ModelBase {
    /// Zeroes gradients, backpropagates `loss` and applies one optimizer step.
    fn backward_step(&mut self, loss: &Tensor);

    /// Returns `var_store`.
    fn get_var_store(&self) -> &VarStore;

    /// Returns `var_store` as mutable reference.
    fn get_var_store_mut(&mut self) -> &mut VarStore;

    /// Save parameters of the neural network.
    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()>;

    /// Load parameters of the neural network.
    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()>;
}

/// Neural network module initialized with a [`VarStore`] and a configuration.
///
/// Modules composing one network share a [`VarStore`]; the store, not the
/// module, is the unit of optimization and target synchronization.
/// [`clone_with_var_store`] rebuilds the same architecture on a fresh store,
/// which is how target networks are created.
///
/// [`clone_with_var_store`]: SubModel::clone_with_var_store
pub trait SubModel {
    /// Configuration from which the module is constructed.
    type Config;

    /// Input of the module.
    type Input;

    /// Output of the module.
    type Output;

    /// Builds the module, registering variables under `var_store`.
    fn build(var_store: &VarStore, config: Self::Config) -> Self;

    /// Rebuilds the same architecture under another [`VarStore`].
    fn clone_with_var_store(&self, var_store: &VarStore) -> Self;

    /// Performs forward computation given an input.
    fn forward(&self, input: &Self::Input) -> Self::Output;
}

/// [`SubModel`] taking two inputs.
pub trait SubModel2 {
    /// Configuration from which the module is constructed.
    type Config;

    /// First input of the module.
    type Input1;

    /// Second input of the module.
    type Input2;

    /// Output of the module.
    type Output;

    /// Builds the module, registering variables under `var_store`.
    fn build(var_store: &VarStore, config: Self::Config) -> Self;

    /// Rebuilds the same architecture under another [`VarStore`].
    fn clone_with_var_store(&self, var_store: &VarStore) -> Self;

    /// Performs forward computation given a pair of inputs.
    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Self::Output;
}
