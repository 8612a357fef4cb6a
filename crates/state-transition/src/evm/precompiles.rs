use alloy_primitives::Address;

use crate::Rules;

/// The addresses of the precompiled contracts available under `rules`.
///
/// - `0x01..=0x04` since genesis
/// - `0x05..=0x08` from Byzantium on
/// - `0x09` from Istanbul on
/// - `0x0a` (point evaluation) once data sharding is active
pub fn active_precompiles(rules: &Rules) -> Vec<Address> {
    let last = if rules.is_istanbul {
        0x09
    } else if rules.is_byzantium {
        0x08
    } else {
        0x04
    };
    let mut precompiles: Vec<Address> = (0x01..=last).map(Address::with_last_byte).collect();
    if rules.is_sharding {
        precompiles.push(Address::with_last_byte(0x0a));
    }
    precompiles
}
