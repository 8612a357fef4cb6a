use alloy_primitives::Bytes;

use crate::TransitionError;

/// Errors that stop contract execution without invalidating the transaction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    /// The code executed `REVERT`.
    #[error("execution reverted")]
    ExecutionReverted,
    /// The frame ran out of gas.
    #[error("out of gas")]
    OutOfGas,
    /// The created code could not be paid for.
    #[error("contract creation code storage out of gas")]
    CodeStoreOutOfGas,
    /// The call stack is too deep.
    #[error("max call depth exceeded")]
    Depth,
    /// The caller cannot cover the transferred value.
    #[error("insufficient balance for transfer")]
    InsufficientBalance,
    /// A contract already exists at the creation address.
    #[error("contract address collision")]
    ContractAddressCollision,
    /// A jump targeted something other than a `JUMPDEST`.
    #[error("invalid jump destination")]
    InvalidJump,
    /// An undefined opcode was executed.
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),
    /// An instruction needed more stack items than available.
    #[error("stack underflow")]
    StackUnderflow,
    /// The stack limit was exceeded.
    #[error("stack limit reached")]
    StackOverflow,
    /// A state modification was attempted in a static call.
    #[error("write protection")]
    WriteProtection,
    /// `RETURNDATACOPY` read past the return data.
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,
    /// A gas computation overflowed.
    #[error("gas uint64 overflow")]
    GasUintOverflow,
    /// The created code exceeds the maximum code size.
    #[error("max code size exceeded")]
    MaxCodeSizeExceeded,
    /// The creator's nonce cannot be incremented.
    #[error("nonce uint64 overflow")]
    NonceUintOverflow,
}

/// Why an included transaction did not complete normally.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// Execution stopped with a VM error.
    #[error(transparent)]
    Vm(#[from] VmError),
    /// A deposit was invalid. It is still included, its changes are discarded and its sender
    /// nonce is incremented.
    #[error("failed deposit: {0}")]
    FailedDeposit(TransitionError),
}

/// The outcome of a transaction that can be included in a block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// The gas used, net of refunds.
    pub used_gas: u64,
    /// The execution error, `None` on success.
    pub error: Option<ExecutionError>,
    /// The return data, or the revert payload.
    pub return_data: Bytes,
}

impl ExecutionResult {
    /// Whether execution did not complete normally.
    pub const fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// The return data of a successful execution.
    pub fn return_value(&self) -> Option<Bytes> {
        if self.failed() {
            return None;
        }
        Some(self.return_data.clone())
    }

    /// The revert payload, if execution stopped with `REVERT`.
    pub fn revert(&self) -> Option<Bytes> {
        match self.error {
            Some(ExecutionError::Vm(VmError::ExecutionReverted)) => Some(self.return_data.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_and_revert_data() {
        let data = Bytes::from_static(b"reason");
        let reverted = ExecutionResult {
            used_gas: 30_000,
            error: Some(VmError::ExecutionReverted.into()),
            return_data: data.clone(),
        };
        assert!(reverted.failed());
        assert_eq!(reverted.revert(), Some(data.clone()));
        assert_eq!(reverted.return_value(), None);

        let out_of_gas = ExecutionResult { error: Some(VmError::OutOfGas.into()), ..reverted };
        assert_eq!(out_of_gas.revert(), None);

        let success = ExecutionResult { used_gas: 21_000, error: None, return_data: data.clone() };
        assert_eq!(success.return_value(), Some(data));
        assert_eq!(success.revert(), None);
    }

    #[test]
    fn test_failed_deposit_message() {
        let error = ExecutionError::FailedDeposit(TransitionError::GasUintOverflow);
        assert_eq!(error.to_string(), "failed deposit: gas uint64 overflow");
        assert_eq!(ExecutionError::from(VmError::InvalidOpcode(0xfe)).to_string(), "invalid opcode: 0xfe");
    }
}
