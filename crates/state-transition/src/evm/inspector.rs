use core::fmt::Debug;

use auto_impl::auto_impl;

/// Hooks around the execution of a transaction.
///
/// They fire only for transactions that passed validation and bought their gas: `on_tx_start`
/// before the intrinsic gas is charged and `on_tx_end` once refunds are settled, including when
/// the transaction is rejected in between.
#[auto_impl(&mut, Box)]
pub trait TxInspector: Debug {
    /// Called with the gas limit of the transaction.
    fn on_tx_start(&mut self, _gas_limit: u64) {}

    /// Called with the gas left after execution and refunds.
    fn on_tx_end(&mut self, _gas_remaining: u64) {}
}

/// A [`TxInspector`] that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpInspector;

impl TxInspector for NoOpInspector {}
