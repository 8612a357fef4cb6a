//! The transaction state transition of the `MegaETH` execution layer.
//!
//! Given a transaction, the world state and the rules in force, the state transition either
//! applies the transaction and reports an [`ExecutionResult`], or rejects it with a
//! [`TransitionError`] proving it can never be included in a block. It covers:
//!
//! - legacy, EIP-2930 and EIP-1559 fee pricing, with EIP-4844 data gas
//! - intrinsic gas, gas purchase, refunds and fee payment
//! - force-included L1 deposits and the rollup fee surcharge
//! - the block gas pool shared by the transactions of a block
//!
//! Contract code runs on an [`Interpreter`] and state lives in a [`StateDb`], both supplied by the
//! caller.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod error;
pub use error::*;

mod evm;
pub use evm::*;

mod gas_pool;
pub use gas_pool::*;

mod intrinsic;
pub use intrinsic::*;

pub mod l1;
pub use l1::{L1BlockInfo, L1CostFn};

mod message;
pub use message::*;

mod processor;
pub use processor::*;

mod result;
pub use result::*;

mod spec;
pub use spec::*;

mod state;
pub use state::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod transaction;
pub use transaction::*;

mod transition;
pub use transition::*;
