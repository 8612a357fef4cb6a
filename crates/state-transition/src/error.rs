//! Consensus error types of the state transition.
//!
//! Every error in this module means the transaction is invalid: it must never be charged and
//! never appear in a block. Execution-level failures (reverts, out of gas, ...) are not errors of
//! the transition and live in [`crate::VmError`] instead.

use alloy_primitives::{Address, B256, U256};

/// Errors returned by the [`GasPool`](crate::GasPool) when the block cannot make room for a
/// transaction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GasPoolError {
    /// The block does not have enough ordinary gas left.
    #[error("gas limit reached: have {available}, want {requested}")]
    GasLimitReached {
        /// The gas remaining in the block.
        available: u64,
        /// The gas requested by the transaction.
        requested: u64,
    },
    /// The block does not have enough data gas left.
    #[error("data gas limit reached: have {available}, want {requested}")]
    DataGasLimitReached {
        /// The data gas remaining in the block.
        available: u64,
        /// The data gas requested by the transaction.
        requested: u64,
    },
}

/// Errors returned by [`intrinsic_gas`](crate::intrinsic_gas).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IntrinsicGasError {
    /// The intrinsic gas does not fit in 64 bits.
    #[error("gas uint64 overflow")]
    GasUintOverflow,
}

/// Consensus errors of the state transition.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The block cannot make room for the transaction.
    #[error(transparent)]
    GasPool(#[from] GasPoolError),

    /// The transaction nonce is lower than the sender's account nonce.
    #[error("nonce too low: address {address}, tx: {tx} state: {state}")]
    NonceTooLow {
        /// The sender.
        address: Address,
        /// The transaction nonce.
        tx: u64,
        /// The account nonce.
        state: u64,
    },

    /// The transaction nonce is higher than the sender's account nonce.
    #[error("nonce too high: address {address}, tx: {tx} state: {state}")]
    NonceTooHigh {
        /// The sender.
        address: Address,
        /// The transaction nonce.
        tx: u64,
        /// The account nonce.
        state: u64,
    },

    /// The sender's account nonce cannot be incremented.
    #[error("nonce has max value: address {address}, nonce: {nonce}")]
    NonceMax {
        /// The sender.
        address: Address,
        /// The account nonce.
        nonce: u64,
    },

    /// The sender has deployed code.
    #[error("sender not an eoa: address {address}, codehash: {code_hash}")]
    SenderNoEoa {
        /// The sender.
        address: Address,
        /// The code hash of the sender account.
        code_hash: B256,
    },

    /// The sender cannot pay for the gas (and value) up front.
    #[error("insufficient funds for gas * price + value: address {address} have {have} want {want}")]
    InsufficientFunds {
        /// The sender.
        address: Address,
        /// The sender balance.
        have: U256,
        /// The balance required.
        want: U256,
    },

    /// The sender cannot cover the value of the top-level call after buying gas.
    #[error("insufficient funds for transfer: address {address}")]
    InsufficientFundsForTransfer {
        /// The sender.
        address: Address,
    },

    /// The gas limit does not cover the intrinsic gas.
    #[error("intrinsic gas too low: have {have}, want {want}")]
    IntrinsicGas {
        /// The gas purchased.
        have: u64,
        /// The intrinsic gas.
        want: u64,
    },

    /// The intrinsic gas does not fit in 64 bits.
    #[error("gas uint64 overflow")]
    GasUintOverflow,

    /// The priority fee is higher than the fee cap.
    #[error(
        "max priority fee per gas higher than max fee per gas: address {address}, \
         maxPriorityFeePerGas: {tip_cap}, maxFeePerGas: {fee_cap}"
    )]
    TipAboveFeeCap {
        /// The sender.
        address: Address,
        /// The priority fee cap.
        tip_cap: U256,
        /// The fee cap.
        fee_cap: U256,
    },

    /// The fee cap is below the block base fee.
    #[error("max fee per gas less than block base fee: address {address}, maxFeePerGas: {fee_cap} baseFee: {base_fee}")]
    FeeCapTooLow {
        /// The sender.
        address: Address,
        /// The fee cap.
        fee_cap: U256,
        /// The block base fee.
        base_fee: U256,
    },

    /// The data gas price is above the transaction's declared maximum.
    #[error(
        "max fee per data gas less than block data gas fee: address {address}, \
         maxFeePerDataGas: {max_fee_per_data_gas} dataGasPrice: {data_gas_price}"
    )]
    MaxFeePerDataGas {
        /// The sender.
        address: Address,
        /// The maximum fee per data gas declared by the transaction.
        max_fee_per_data_gas: U256,
        /// The current data gas price.
        data_gas_price: U256,
    },

    /// A contract creation carries more init code than allowed.
    #[error("max initcode size exceeded: code size {size} limit {limit}")]
    MaxInitCodeSizeExceeded {
        /// The init code size.
        size: usize,
        /// The limit.
        limit: usize,
    },

    /// The execution context is inconsistent with the active rules. This signals a bug in the
    /// caller, not an invalid transaction.
    #[error("internal failure: {0}")]
    InternalFailure(String),
}

impl TransitionError {
    /// Whether the block gas pool ran out of ordinary gas. This is the only failure that aborts a
    /// deposit transaction instead of being recorded as a failed deposit.
    pub const fn is_gas_limit_reached(&self) -> bool {
        matches!(self, Self::GasPool(GasPoolError::GasLimitReached { .. }))
    }
}

impl From<IntrinsicGasError> for TransitionError {
    fn from(err: IntrinsicGasError) -> Self {
        match err {
            IntrinsicGasError::GasUintOverflow => Self::GasUintOverflow,
        }
    }
}

/// Misuse of the signature accessors of a transaction.
///
/// This is a programming error of the caller, not a [`TransitionError`]: no
/// transaction is ever rejected for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Deposit transactions are authenticated on L1 and carry no signature.
    #[error("deposit tx does not have a signature")]
    DepositTransaction,
}
