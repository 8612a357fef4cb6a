use alloy_primitives::{map::HashMap, Address, Bytes, B256};

use crate::{
    CallInputs, CreateInputs, FrameResult, Interpreter, Rules, StateDb, VmError,
};

/// Gas charged per byte of deployed code.
pub const CODE_DEPOSIT_GAS: u64 = 200;

/// One step of a scripted frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Behavior {
    /// Stops successfully with no output.
    Stop,
    /// Stops successfully with the given output.
    Return(Bytes),
    /// Reverts with the given payload, keeping the unspent gas.
    Revert(Bytes),
    /// Burns gas, running out of gas if the frame does not have enough.
    ConsumeGas(u64),
    /// Accrues a gas refund.
    Refund(u64),
    /// Writes a storage slot of the executing account.
    Store {
        /// The slot.
        key: B256,
        /// The value.
        value: B256,
    },
    /// Runs out of gas, consuming everything.
    OutOfGas,
}

/// A frame the [`ScriptedInterpreter`] executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutedFrame {
    /// The callee or the created address.
    pub address: Address,
    /// The gas the frame was given.
    pub gas_limit: u64,
    /// Whether the frame was a creation.
    pub is_create: bool,
}

/// A deterministic [`Interpreter`] running scripted [`Behavior`]s instead of bytecode.
///
/// Calls run the script registered for their target; accounts without a script simply accept the
/// value transferred to them. Creations run the creation script and deploy the output of its
/// [`Behavior::Return`] step.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInterpreter {
    scripts: HashMap<Address, Vec<Behavior>>,
    create_script: Vec<Behavior>,
    /// The frames executed so far.
    pub frames: Vec<ExecutedFrame>,
}

impl ScriptedInterpreter {
    /// Registers the script run when `address` is called.
    pub fn with_script(mut self, address: Address, script: Vec<Behavior>) -> Self {
        self.scripts.insert(address, script);
        self
    }

    /// Registers the script run by contract creations.
    pub fn with_create_script(mut self, script: Vec<Behavior>) -> Self {
        self.create_script = script;
        self
    }

    fn run<S: StateDb>(
        state: &mut S,
        address: Address,
        script: &[Behavior],
        gas_limit: u64,
    ) -> FrameResult {
        let mut gas_left = gas_limit;
        for step in script {
            match step {
                Behavior::Stop => break,
                Behavior::Return(output) => return FrameResult::success(output.clone(), gas_left),
                Behavior::Revert(output) => {
                    return FrameResult::failure(VmError::ExecutionReverted, output.clone(), gas_left)
                }
                Behavior::ConsumeGas(gas) => match gas_left.checked_sub(*gas) {
                    Some(left) => gas_left = left,
                    None => return FrameResult::failure(VmError::OutOfGas, Bytes::new(), 0),
                },
                Behavior::Refund(gas) => state.add_refund(*gas),
                Behavior::Store { key, value } => state.set_storage(address, *key, *value),
                Behavior::OutOfGas => {
                    return FrameResult::failure(VmError::OutOfGas, Bytes::new(), 0)
                }
            }
        }
        FrameResult::success(Bytes::new(), gas_left)
    }
}

impl<S: StateDb> Interpreter<S> for ScriptedInterpreter {
    fn call(&mut self, state: &mut S, _rules: &Rules, inputs: CallInputs) -> FrameResult {
        self.frames.push(ExecutedFrame {
            address: inputs.target,
            gas_limit: inputs.gas_limit,
            is_create: false,
        });
        if state.balance(inputs.caller) < inputs.value {
            return FrameResult::failure(
                VmError::InsufficientBalance,
                Bytes::new(),
                inputs.gas_limit,
            );
        }

        let snapshot = state.snapshot();
        state.sub_balance(inputs.caller, inputs.value);
        state.add_balance(inputs.target, inputs.value);

        let script = self.scripts.get(&inputs.target).map(Vec::as_slice).unwrap_or_default();
        let result = Self::run(state, inputs.target, script, inputs.gas_limit);
        if result.error.is_some() {
            state.revert_to_snapshot(snapshot);
        }
        result
    }

    fn create(&mut self, state: &mut S, rules: &Rules, inputs: CreateInputs) -> FrameResult {
        let nonce = state.nonce(inputs.caller);
        let Some(next_nonce) = nonce.checked_add(1) else {
            return FrameResult::failure(VmError::NonceUintOverflow, Bytes::new(), inputs.gas_limit);
        };
        let address = inputs.caller.create(nonce);
        self.frames.push(ExecutedFrame { address, gas_limit: inputs.gas_limit, is_create: true });
        state.set_nonce(inputs.caller, next_nonce);

        if state.nonce(address) != 0 || !state.code(address).is_empty() {
            return FrameResult::failure(VmError::ContractAddressCollision, Bytes::new(), 0);
        }

        let snapshot = state.snapshot();
        state.set_nonce(address, 1);
        state.sub_balance(inputs.caller, inputs.value);
        state.add_balance(address, inputs.value);

        let mut result = Self::run(state, address, &self.create_script, inputs.gas_limit);
        if result.error.is_none() {
            let deposit_gas = result.output.len() as u64 * CODE_DEPOSIT_GAS;
            match result.gas_left.checked_sub(deposit_gas) {
                Some(gas_left) => {
                    state.set_code(address, result.output.clone());
                    result.gas_left = gas_left;
                }
                // Frontier deployed nothing and kept the gas instead of failing.
                None if !rules.is_homestead => result.output = Bytes::new(),
                None => result = FrameResult::failure(VmError::CodeStoreOutOfGas, Bytes::new(), 0),
            }
        }
        if result.error.is_some() {
            state.revert_to_snapshot(snapshot);
        } else {
            result.created_address = Some(address);
        }
        result
    }
}
