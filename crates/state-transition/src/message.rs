use core::fmt::Debug;

use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, B256, U256};
use auto_impl::auto_impl;

use crate::constants::{optimism, sharding::DATA_GAS_PER_BLOB};

/// A transaction as seen by the state transition.
///
/// The state transition never inspects the concrete transaction type. Everything it needs to
/// validate, charge and execute a transaction is exposed through this trait.
///
/// Implementations must uphold `is_system_tx() => is_deposit_tx()`. A [`Self::mint`] on a
/// non-deposit message is ignored.
#[auto_impl(&, Box, Arc)]
pub trait Message: Debug {
    /// The sender.
    fn from(&self) -> Address;

    /// The recipient, `None` for a contract creation.
    fn to(&self) -> Option<Address>;

    /// The price per gas the sender pays, and the price unspent gas is refunded at.
    ///
    /// For dynamic-fee transactions this is the effective price the caller derived from the fee
    /// caps and the block base fee.
    fn gas_price(&self) -> U256;

    /// The EIP-1559 fee cap. `None` means the message only commits to [`Self::gas_price`].
    fn gas_fee_cap(&self) -> Option<U256>;

    /// The EIP-1559 priority fee cap. `None` means the message only commits to
    /// [`Self::gas_price`].
    fn gas_tip_cap(&self) -> Option<U256>;

    /// The maximum price per data gas the sender accepts.
    fn max_fee_per_data_gas(&self) -> U256;

    /// The gas limit.
    fn gas(&self) -> u64;

    /// The value transferred to the recipient.
    fn value(&self) -> U256;

    /// The sender nonce declared by the transaction.
    fn nonce(&self) -> u64;

    /// Whether nonce and account type checks are skipped. Only simulated calls set this.
    fn is_fake(&self) -> bool;

    /// The call data or init code.
    fn data(&self) -> &Bytes;

    /// The EIP-2930 access list.
    fn access_list(&self) -> &AccessList;

    /// The versioned hashes of the data blobs referenced by the transaction.
    fn data_hashes(&self) -> &[B256];

    /// Whether the message is a system deposit, which consumes no block gas at all.
    fn is_system_tx(&self) -> bool;

    /// Whether the message is a force-included deposit.
    fn is_deposit_tx(&self) -> bool;

    /// The amount credited to the sender before execution. Deposits only.
    fn mint(&self) -> Option<U256>;

    /// The L1 data gas footprint of the transaction, zero when there is none.
    fn rollup_data_gas(&self) -> u64;

    /// The data gas consumed by the referenced blobs.
    fn data_gas_used(&self) -> u64 {
        self.data_hashes().len() as u64 * DATA_GAS_PER_BLOB
    }
}

/// The concrete [`Message`] used by block processing and simulation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxMessage {
    from: Address,
    to: Option<Address>,
    nonce: u64,
    value: U256,
    gas: u64,
    gas_price: U256,
    gas_fee_cap: Option<U256>,
    gas_tip_cap: Option<U256>,
    max_fee_per_data_gas: U256,
    data: Bytes,
    access_list: AccessList,
    data_hashes: Vec<B256>,
    is_fake: bool,
    is_deposit_tx: bool,
    is_system_tx: bool,
    mint: Option<U256>,
    rollup_data_gas: u64,
}

impl TxMessage {
    /// Creates a message priced by a plain gas price.
    pub fn new(
        from: Address,
        to: Option<Address>,
        nonce: u64,
        value: U256,
        gas: u64,
        gas_price: U256,
        data: Bytes,
    ) -> Self {
        Self { from, to, nonce, value, gas, gas_price, data, ..Default::default() }
    }

    /// Creates a deposit message.
    ///
    /// Deposits declare [`DEPOSIT_TX_GAS`](optimism::DEPOSIT_TX_GAS), pay nothing and carry no
    /// nonce of their own. A system deposit does not consume block gas and reports no gas used.
    pub fn deposit(
        from: Address,
        to: Option<Address>,
        value: U256,
        data: Bytes,
        mint: Option<U256>,
        is_system_tx: bool,
    ) -> Self {
        Self {
            from,
            to,
            nonce: optimism::DEPOSIT_TX_NONCE,
            value,
            gas: optimism::DEPOSIT_TX_GAS,
            gas_fee_cap: Some(U256::ZERO),
            gas_tip_cap: Some(U256::ZERO),
            data,
            is_deposit_tx: true,
            is_system_tx,
            mint,
            ..Default::default()
        }
    }

    /// Creates a message for a simulated call (gas estimation, read-only calls).
    ///
    /// The result skips nonce and account type checks, and its zero fee fields let it run
    /// without paying when [`EvmConfig::no_base_fee`](crate::EvmConfig::no_base_fee) is set.
    /// Simulated messages must never be applied to a block.
    pub fn simulation(
        from: Address,
        to: Option<Address>,
        gas: u64,
        value: U256,
        data: Bytes,
    ) -> Self {
        Self {
            from,
            to,
            value,
            gas,
            gas_fee_cap: Some(U256::ZERO),
            gas_tip_cap: Some(U256::ZERO),
            data,
            is_fake: true,
            ..Default::default()
        }
    }

    /// Sets the EIP-1559 fee caps.
    pub fn with_fee_caps(mut self, gas_fee_cap: U256, gas_tip_cap: U256) -> Self {
        self.gas_fee_cap = Some(gas_fee_cap);
        self.gas_tip_cap = Some(gas_tip_cap);
        self
    }

    /// Sets the gas price.
    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Sets the gas limit.
    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    /// Sets the access list.
    pub fn with_access_list(mut self, access_list: AccessList) -> Self {
        self.access_list = access_list;
        self
    }

    /// Sets the referenced data blobs and the maximum price per data gas.
    pub fn with_data_gas(mut self, max_fee_per_data_gas: U256, data_hashes: Vec<B256>) -> Self {
        self.max_fee_per_data_gas = max_fee_per_data_gas;
        self.data_hashes = data_hashes;
        self
    }

    /// Sets the L1 data gas footprint.
    pub fn with_rollup_data_gas(mut self, rollup_data_gas: u64) -> Self {
        self.rollup_data_gas = rollup_data_gas;
        self
    }
}

impl Message for TxMessage {
    fn from(&self) -> Address {
        self.from
    }

    fn to(&self) -> Option<Address> {
        self.to
    }

    fn gas_price(&self) -> U256 {
        self.gas_price
    }

    fn gas_fee_cap(&self) -> Option<U256> {
        self.gas_fee_cap
    }

    fn gas_tip_cap(&self) -> Option<U256> {
        self.gas_tip_cap
    }

    fn max_fee_per_data_gas(&self) -> U256 {
        self.max_fee_per_data_gas
    }

    fn gas(&self) -> u64 {
        self.gas
    }

    fn value(&self) -> U256 {
        self.value
    }

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn is_fake(&self) -> bool {
        self.is_fake
    }

    fn data(&self) -> &Bytes {
        &self.data
    }

    fn access_list(&self) -> &AccessList {
        &self.access_list
    }

    fn data_hashes(&self) -> &[B256] {
        &self.data_hashes
    }

    fn is_system_tx(&self) -> bool {
        self.is_system_tx
    }

    fn is_deposit_tx(&self) -> bool {
        self.is_deposit_tx
    }

    fn mint(&self) -> Option<U256> {
        self.mint.filter(|_| self.is_deposit_tx)
    }

    fn rollup_data_gas(&self) -> u64 {
        if self.is_deposit_tx {
            0
        } else {
            self.rollup_data_gas
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_message_shape() {
        let msg = TxMessage::deposit(
            Address::repeat_byte(1),
            None,
            U256::ZERO,
            Bytes::new(),
            Some(U256::from(5)),
            true,
        )
        .with_rollup_data_gas(100);

        assert!(msg.is_deposit_tx() && msg.is_system_tx());
        assert_eq!(msg.gas(), 100_000_000);
        assert_eq!(msg.nonce(), u64::MAX);
        assert_eq!(msg.gas_price(), U256::ZERO);
        assert_eq!(msg.mint(), Some(U256::from(5)));
        assert_eq!(msg.rollup_data_gas(), 0);
    }

    #[test]
    fn test_mint_ignored_outside_deposits() {
        let mut msg = TxMessage::new(
            Address::ZERO,
            None,
            0,
            U256::ZERO,
            21_000,
            U256::from(1),
            Bytes::new(),
        );
        msg.mint = Some(U256::from(1));
        assert_eq!(msg.mint(), None);
        assert_eq!(msg.gas_fee_cap(), None);
    }

    #[test]
    fn test_data_gas_used_counts_blobs() {
        let msg = TxMessage::default().with_data_gas(U256::from(1), vec![B256::ZERO; 2]);
        assert_eq!(msg.data_gas_used(), 2 * DATA_GAS_PER_BLOB);

        let boxed: Box<dyn Message> = Box::new(msg);
        assert_eq!(boxed.data_gas_used(), 2 * DATA_GAS_PER_BLOB);
    }
}
