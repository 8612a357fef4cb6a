use alloy_eips::eip2930::AccessList;

use crate::{
    constants::{berlin, frontier, homestead, istanbul, shanghai},
    IntrinsicGasError, Rules,
};

/// Computes the gas a transaction must pay before any of its code runs.
///
/// # Arguments
///
/// * `data` - The transaction payload (calldata or init code)
/// * `access_list` - The EIP-2930 access list, empty for untyped transactions
/// * `is_contract_creation` - Whether the transaction has no recipient
/// * `rules` - The rules in force; Homestead, Istanbul and Shanghai change the result
///
/// # Returns
///
/// The intrinsic gas, or [`IntrinsicGasError::GasUintOverflow`] when it does not fit in 64 bits.
/// The computation never wraps.
pub fn intrinsic_gas(
    data: &[u8],
    access_list: &AccessList,
    is_contract_creation: bool,
    rules: &Rules,
) -> Result<u64, IntrinsicGasError> {
    let mut gas = if is_contract_creation && rules.is_homestead {
        homestead::TX_GAS_CONTRACT_CREATION
    } else {
        frontier::TX_GAS
    };

    if !data.is_empty() {
        let data_len = data.len() as u64;
        let non_zero = data.iter().filter(|byte| **byte != 0).count() as u64;
        let zero = data_len - non_zero;

        let non_zero_gas = if rules.is_istanbul {
            istanbul::TX_DATA_NON_ZERO_GAS
        } else {
            frontier::TX_DATA_NON_ZERO_GAS
        };
        gas = add_product(gas, non_zero, non_zero_gas)?;
        gas = add_product(gas, zero, frontier::TX_DATA_ZERO_GAS)?;

        if is_contract_creation && rules.is_shanghai {
            gas = add_product(gas, to_word_size(data_len), shanghai::INIT_CODE_WORD_GAS)?;
        }
    }

    let addresses = access_list.0.len() as u64;
    let storage_keys = access_list.0.iter().map(|item| item.storage_keys.len() as u64).sum();
    gas = add_product(gas, addresses, berlin::TX_ACCESS_LIST_ADDRESS_GAS)?;
    gas = add_product(gas, storage_keys, berlin::TX_ACCESS_LIST_STORAGE_KEY_GAS)?;

    Ok(gas)
}

/// `gas + count * unit`, failing instead of wrapping.
fn add_product(gas: u64, count: u64, unit: u64) -> Result<u64, IntrinsicGasError> {
    count
        .checked_mul(unit)
        .and_then(|cost| gas.checked_add(cost))
        .ok_or(IntrinsicGasError::GasUintOverflow)
}

/// Number of 32-byte words needed to hold `size` bytes, rounded up.
pub const fn to_word_size(size: u64) -> u64 {
    size.div_ceil(32)
}
