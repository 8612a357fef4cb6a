use core::fmt::Debug;

use alloy_primitives::{Address, Bytes, U256};
use auto_impl::auto_impl;

use crate::{active_precompiles, Rules, StateDb, VmError};

/// Inputs of a top-level message call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallInputs {
    /// The caller.
    pub caller: Address,
    /// The callee.
    pub target: Address,
    /// The call data.
    pub input: Bytes,
    /// The gas available to the call.
    pub gas_limit: u64,
    /// The value transferred to the callee.
    pub value: U256,
}

/// Inputs of a top-level contract creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateInputs {
    /// The creator.
    pub caller: Address,
    /// The init code.
    pub init_code: Bytes,
    /// The gas available to the init code.
    pub gas_limit: u64,
    /// The value endowed to the new contract.
    pub value: U256,
}

/// Outcome of a top-level frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameResult {
    /// The return data, or the revert payload.
    pub output: Bytes,
    /// The gas left unspent.
    pub gas_left: u64,
    /// The execution error, if the frame did not complete normally.
    pub error: Option<VmError>,
    /// The address of the created contract, for creations.
    pub created_address: Option<Address>,
}

impl FrameResult {
    /// A successful frame.
    pub const fn success(output: Bytes, gas_left: u64) -> Self {
        Self { output, gas_left, error: None, created_address: None }
    }

    /// A frame that stopped with `error`.
    pub const fn failure(error: VmError, output: Bytes, gas_left: u64) -> Self {
        Self { output, gas_left, error: Some(error), created_address: None }
    }
}

/// The virtual machine that runs contract code on behalf of the state transition.
///
/// The interpreter owns everything below the top-level frame: value transfer, nonce increment
/// of the creator, nested calls and the frame-local revert of state changes. Execution errors are
/// reported in [`FrameResult::error`] and never abort the transaction.
#[auto_impl(&mut, Box)]
pub trait Interpreter<S: StateDb>: Debug {
    /// Executes a message call.
    fn call(&mut self, state: &mut S, rules: &Rules, inputs: CallInputs) -> FrameResult;

    /// Executes a contract creation. The interpreter increments the creator's nonce.
    fn create(&mut self, state: &mut S, rules: &Rules, inputs: CreateInputs) -> FrameResult;

    /// Whether `from` can transfer `value` at the top level.
    fn can_transfer(&self, state: &S, from: Address, value: U256) -> bool {
        state.balance(from) >= value
    }

    /// The precompiles warmed before execution.
    fn active_precompiles(&self, rules: &Rules) -> Vec<Address> {
        active_precompiles(rules)
    }
}
