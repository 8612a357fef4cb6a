//! Tests for intrinsic gas, refunds and gas accounting.

use alloy_eips::eip2930::{AccessList, AccessListItem};
use alloy_primitives::{address, Address, B256, U256};
use mega_state_transition::{
    apply_message, intrinsic_gas,
    test_utils::{Behavior, ScriptedInterpreter},
    BlockEnv, Evm, GasPool, InMemoryState, Rules, SpecId, StateDb, TransitionError, TxAccessList,
    TxEnvelope, TxLegacy,
};
use proptest::{
    collection::vec,
    prelude::{any, prop_assert, prop_assert_eq},
    proptest,
};
use rstest::rstest;

const CALLER: Address = address!("0x2000000000000000000000000000000000000002");
const CALLEE: Address = address!("0x1000000000000000000000000000000000000001");
const COINBASE: Address = address!("0x000000000000000000000000000000000000beef");

const INITIAL_BALANCE: u64 = 1_000_000_000_000;

fn block() -> BlockEnv {
    BlockEnv {
        number: 1,
        timestamp: 1,
        coinbase: COINBASE,
        base_fee: Some(U256::from(1)),
        random: Some(B256::ZERO),
        excess_data_gas: Some(0),
    }
}

fn create_evm(interpreter: ScriptedInterpreter) -> Evm<InMemoryState, ScriptedInterpreter, SpecId> {
    Evm::new(
        block(),
        SpecId::CANCUN,
        InMemoryState::default().account_balance(CALLER, U256::from(INITIAL_BALANCE)),
        interpreter,
    )
}

fn access_list(addresses: usize, keys_per_address: usize) -> AccessList {
    AccessList(
        (0..addresses)
            .map(|i| AccessListItem {
                address: Address::with_last_byte(i as u8),
                storage_keys: (0..keys_per_address).map(|k| B256::with_last_byte(k as u8)).collect(),
            })
            .collect(),
    )
}

#[rstest]
#[case::empty(0, 0, 21_000)]
#[case::addresses_only(3, 0, 21_000 + 3 * 2_400)]
#[case::with_keys(2, 3, 21_000 + 2 * 2_400 + 6 * 1_900)]
fn test_access_list_intrinsic_gas(
    #[case] addresses: usize,
    #[case] keys_per_address: usize,
    #[case] expected: u64,
) {
    let rules = Rules::from_spec(SpecId::CANCUN, true);
    let list = access_list(addresses, keys_per_address);
    assert_eq!(intrinsic_gas(&[], &list, false, &rules), Ok(expected));
}

#[test]
fn test_access_list_transaction_charges_its_list() {
    let mut evm = create_evm(ScriptedInterpreter::default());
    let tx = TxEnvelope::AccessList(TxAccessList {
        chain_id: 1,
        gas_price: U256::from(1),
        gas_limit: 100_000,
        to: Some(CALLEE),
        access_list: access_list(2, 3),
        ..Default::default()
    });
    let msg = tx.as_message(CALLER, evm.block.base_fee);

    let result = apply_message(&mut evm, &msg, &mut GasPool::new(30_000_000)).unwrap();

    assert_eq!(result.used_gas, 21_000 + 2 * 2_400 + 6 * 1_900);
    assert!(evm.state.is_slot_warm(Address::with_last_byte(1), B256::with_last_byte(2)));
}

#[rstest]
#[case::frontier(SpecId::FRONTIER, 68)]
#[case::istanbul(SpecId::ISTANBUL, 16)]
fn test_non_zero_byte_pricing(#[case] spec: SpecId, #[case] per_byte: u64) {
    let rules = Rules::from_spec(spec, false);
    let gas = intrinsic_gas(&[1, 0, 1], &AccessList::default(), false, &rules).unwrap();
    assert_eq!(gas, 21_000 + 2 * per_byte + 4);
}

#[test]
fn test_creation_before_homestead_costs_a_call() {
    let rules = Rules::from_spec(SpecId::FRONTIER, false);
    assert_eq!(intrinsic_gas(&[], &AccessList::default(), true, &rules), Ok(21_000));
}

#[test]
fn test_rejected_transaction_uses_no_gas() {
    let mut evm = create_evm(ScriptedInterpreter::default());
    let mut pool = GasPool::new(30_000_000);
    let tx = TxEnvelope::AccessList(TxAccessList {
        chain_id: 1,
        gas_price: U256::from(1),
        gas_limit: 21_000,
        to: Some(CALLEE),
        access_list: access_list(1, 0),
        ..Default::default()
    });
    let msg = tx.as_message(CALLER, evm.block.base_fee);

    let err = apply_message(&mut evm, &msg, &mut pool).unwrap_err();

    assert_eq!(err, TransitionError::IntrinsicGas { have: 21_000, want: 23_400 });
    assert_eq!(pool.gas(), 30_000_000);
    assert_eq!(evm.state.balance(CALLER), U256::from(INITIAL_BALANCE));
}

proptest! {
    #[test]
    fn proptest_intrinsic_gas_grows_with_payload(
        data in vec(any::<u8>(), 0..512),
        extra in vec(any::<u8>(), 1..64),
        is_contract_creation in any::<bool>(),
    ) {
        let rules = Rules::from_spec(SpecId::CANCUN, true);
        let list = AccessList::default();
        let base = intrinsic_gas(&data, &list, is_contract_creation, &rules).unwrap();
        let longer = [data.as_slice(), extra.as_slice()].concat();
        let grown = intrinsic_gas(&longer, &list, is_contract_creation, &rules).unwrap();
        prop_assert!(grown > base);
        prop_assert!(base >= 21_000);
    }

    #[test]
    fn proptest_refund_never_exceeds_a_fifth(consumed in 0u64..70_000, refund in 0u64..200_000) {
        // refunds are earned by spending gas
        let refund = refund.min(consumed);
        let interpreter = ScriptedInterpreter::default().with_script(
            CALLEE,
            vec![Behavior::ConsumeGas(consumed), Behavior::Refund(refund)],
        );
        let mut evm = create_evm(interpreter);
        let mut pool = GasPool::new(30_000_000);
        let gas_limit = 100_000;
        let msg = TxEnvelope::from(TxLegacy {
            gas_price: U256::from(3),
            gas_limit,
            to: Some(CALLEE),
            ..Default::default()
        })
        .as_message(CALLER, evm.block.base_fee);

        let result = apply_message(&mut evm, &msg, &mut pool).unwrap();

        let spent = 21_000 + consumed;
        prop_assert_eq!(result.used_gas, spent - (spent / 5).min(refund));
        prop_assert!(result.used_gas <= gas_limit);
        prop_assert!(result.used_gas >= 21_000);
        prop_assert_eq!(
            evm.state.balance(CALLER),
            U256::from(INITIAL_BALANCE - result.used_gas * 3)
        );
        prop_assert_eq!(pool.gas(), 30_000_000 - result.used_gas);
    }
}
