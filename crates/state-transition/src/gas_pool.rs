use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::GasPoolError;

/// Block-scoped pool of the gas still available to transactions.
///
/// Transactions buy gas from the pool before execution and return the unspent part afterwards,
/// so later transactions of the same block can use it. Ordinary gas and data gas are tracked
/// independently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPool {
    gas: u64,
    data_gas: u64,
}

impl GasPool {
    /// Creates a pool holding `gas` ordinary gas and no data gas.
    pub const fn new(gas: u64) -> Self {
        Self { gas, data_gas: 0 }
    }

    /// Sets the data gas available to the block.
    pub const fn with_data_gas(mut self, data_gas: u64) -> Self {
        self.data_gas = data_gas;
        self
    }

    /// The ordinary gas left in the pool.
    pub const fn gas(&self) -> u64 {
        self.gas
    }

    /// The data gas left in the pool.
    pub const fn data_gas(&self) -> u64 {
        self.data_gas
    }

    /// Takes `amount` gas out of the pool. Fails without touching the pool when it does not hold
    /// enough.
    pub fn sub_gas(&mut self, amount: u64) -> Result<(), GasPoolError> {
        if self.gas < amount {
            return Err(GasPoolError::GasLimitReached { available: self.gas, requested: amount });
        }
        self.gas -= amount;
        trace!(amount, remaining = self.gas, "Gas taken from block pool");
        Ok(())
    }

    /// Returns `amount` gas to the pool.
    pub fn add_gas(&mut self, amount: u64) {
        self.gas = self.gas.saturating_add(amount);
        trace!(amount, remaining = self.gas, "Gas returned to block pool");
    }

    /// Takes `amount` data gas out of the pool. Fails without touching the pool when it does not
    /// hold enough.
    pub fn sub_data_gas(&mut self, amount: u64) -> Result<(), GasPoolError> {
        if self.data_gas < amount {
            return Err(GasPoolError::DataGasLimitReached {
                available: self.data_gas,
                requested: amount,
            });
        }
        self.data_gas -= amount;
        Ok(())
    }

    /// Returns `amount` data gas to the pool.
    pub fn add_data_gas(&mut self, amount: u64) {
        self.data_gas = self.data_gas.saturating_add(amount);
    }
}

impl core::fmt::Display for GasPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (data gas {})", self.gas, self.data_gas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_gas_fails_without_mutation() {
        let mut pool = GasPool::new(21_000).with_data_gas(10);
        assert_eq!(
            pool.sub_gas(21_001),
            Err(GasPoolError::GasLimitReached { available: 21_000, requested: 21_001 })
        );
        assert_eq!(pool.gas(), 21_000);

        pool.sub_gas(21_000).unwrap();
        assert_eq!(pool.gas(), 0);
        pool.add_gas(500);
        assert_eq!(pool.gas(), 500);
    }

    #[test]
    fn test_data_gas_is_independent() {
        let mut pool = GasPool::new(100).with_data_gas(10);
        assert!(matches!(pool.sub_data_gas(11), Err(GasPoolError::DataGasLimitReached { .. })));
        pool.sub_data_gas(10).unwrap();
        assert_eq!(pool.data_gas(), 0);
        assert_eq!(pool.gas(), 100);
        pool.add_data_gas(3);
        assert_eq!(pool.data_gas(), 3);
    }

    #[test]
    fn test_add_gas_saturates() {
        let mut pool = GasPool::new(u64::MAX - 1);
        pool.add_gas(10);
        assert_eq!(pool.gas(), u64::MAX);
    }
}
