//! Tests for the application of L1 deposit transactions.

use alloy_primitives::{address, bytes, Address, Bytes, B256, U256};
use mega_state_transition::{
    apply_message, apply_transaction,
    constants::optimism::{BASE_FEE_RECIPIENT, DEPOSIT_TX_GAS},
    test_utils::{init_tracing, Behavior, ScriptedInterpreter},
    BlockEnv, ChainConfig, Evm, ExecutionError, GasPool, GasPoolError, InMemoryState, StateDb,
    TransitionError, TxDeposit, TxEnvelope, TxMessage, VmError,
};
use rstest::rstest;

const DEPOSITOR: Address = address!("0x3000000000000000000000000000000000000003");
const CALLEE: Address = address!("0x1000000000000000000000000000000000000001");
const COINBASE: Address = address!("0x000000000000000000000000000000000000beef");

const BLOCK_GAS_LIMIT: u64 = 2 * DEPOSIT_TX_GAS;
const MINT: u64 = 1_000;

type TestEvm = Evm<InMemoryState, ScriptedInterpreter, ChainConfig>;

fn block() -> BlockEnv {
    BlockEnv {
        number: 1,
        timestamp: 2,
        coinbase: COINBASE,
        base_fee: Some(U256::from(7)),
        random: Some(B256::ZERO),
        excess_data_gas: None,
    }
}

/// Creates a Bedrock rollup context.
fn create_evm(state: InMemoryState, interpreter: ScriptedInterpreter) -> TestEvm {
    let chain = ChainConfig::all_blocks_from_genesis(10).with_bedrock_block(0);
    Evm::new(block(), chain, state, interpreter)
}

fn deposit(value: u64, is_system_tx: bool) -> TxMessage {
    TxMessage::deposit(
        DEPOSITOR,
        Some(CALLEE),
        U256::from(value),
        Bytes::new(),
        Some(U256::from(MINT)),
        is_system_tx,
    )
}

#[test]
fn test_deposit_uses_declared_gas() {
    init_tracing();
    let interpreter =
        ScriptedInterpreter::default().with_script(CALLEE, vec![Behavior::ConsumeGas(1_000)]);
    let mut evm = create_evm(InMemoryState::default(), interpreter);
    let mut pool = GasPool::new(BLOCK_GAS_LIMIT);

    let result = apply_message(&mut evm, &deposit(0, false), &mut pool).unwrap();

    assert_eq!(result.used_gas, DEPOSIT_TX_GAS);
    assert!(!result.failed());
    assert_eq!(evm.state.balance(DEPOSITOR), U256::from(MINT));
    assert_eq!(evm.state.nonce(DEPOSITOR), 1);
    assert_eq!(pool.gas(), BLOCK_GAS_LIMIT - DEPOSIT_TX_GAS);
    // deposits pay no fees, not even under Bedrock
    assert_eq!(evm.state.balance(COINBASE), U256::ZERO);
    assert_eq!(evm.state.balance(BASE_FEE_RECIPIENT), U256::ZERO);
}

#[test]
fn test_reverted_deposit_keeps_mint() {
    let interpreter = ScriptedInterpreter::default().with_script(
        CALLEE,
        vec![
            Behavior::Store { key: B256::ZERO, value: B256::repeat_byte(1) },
            Behavior::Revert(bytes!("01")),
        ],
    );
    let mut evm = create_evm(InMemoryState::default(), interpreter);
    let mut pool = GasPool::new(BLOCK_GAS_LIMIT);

    let result = apply_message(&mut evm, &deposit(0, false), &mut pool).unwrap();

    assert_eq!(result.used_gas, DEPOSIT_TX_GAS);
    assert_eq!(result.error, Some(ExecutionError::Vm(VmError::ExecutionReverted)));
    assert_eq!(evm.state.balance(DEPOSITOR), U256::from(MINT));
    assert_eq!(evm.state.nonce(DEPOSITOR), 1);
    assert_eq!(evm.state.storage(CALLEE, B256::ZERO), B256::ZERO);
}

#[test]
fn test_failed_deposit_is_included() {
    let state = InMemoryState::default().account_nonce(DEPOSITOR, 3);
    let mut evm = create_evm(state, ScriptedInterpreter::default());
    let mut pool = GasPool::new(BLOCK_GAS_LIMIT);

    // transfers more than the minted balance
    let result = apply_message(&mut evm, &deposit(MINT + 1, false), &mut pool).unwrap();

    assert_eq!(result.used_gas, DEPOSIT_TX_GAS);
    assert_eq!(
        result.error,
        Some(ExecutionError::FailedDeposit(TransitionError::InsufficientFundsForTransfer {
            address: DEPOSITOR
        }))
    );
    assert!(result.error.as_ref().unwrap().to_string().starts_with("failed deposit"));
    assert_eq!(evm.state.nonce(DEPOSITOR), 4);
    assert_eq!(evm.state.balance(DEPOSITOR), U256::from(MINT));
    assert_eq!(evm.state.balance(CALLEE), U256::ZERO);
    assert_eq!(pool.gas(), BLOCK_GAS_LIMIT - DEPOSIT_TX_GAS);
    assert!(evm.interpreter.frames.is_empty());
}

#[rstest]
#[case::succeeds(0)]
#[case::fails(MINT + 1)]
fn test_system_deposit_uses_no_block_gas(#[case] value: u64) {
    let mut evm = create_evm(InMemoryState::default(), ScriptedInterpreter::default());
    let mut pool = GasPool::new(BLOCK_GAS_LIMIT);

    let result = apply_message(&mut evm, &deposit(value, true), &mut pool).unwrap();

    assert_eq!(result.used_gas, 0);
    assert_eq!(pool.gas(), BLOCK_GAS_LIMIT);
    assert_eq!(evm.state.nonce(DEPOSITOR), 1);
}

#[test]
fn test_deposit_exceeding_block_gas_is_rejected() {
    let mut evm = create_evm(InMemoryState::default(), ScriptedInterpreter::default());
    let mut pool = GasPool::new(1_000_000);

    let err = apply_message(&mut evm, &deposit(0, false), &mut pool).unwrap_err();

    assert_eq!(
        err,
        TransitionError::GasPool(GasPoolError::GasLimitReached {
            available: 1_000_000,
            requested: DEPOSIT_TX_GAS,
        })
    );
    assert_eq!(pool.gas(), 1_000_000);
    assert_eq!(evm.state.nonce(DEPOSITOR), 0);
    // the mint is applied before the block gas is taken
    assert_eq!(evm.state.balance(DEPOSITOR), U256::from(MINT));
}

#[test]
fn test_deposit_skips_sender_checks() {
    let state = InMemoryState::default()
        .account_nonce(DEPOSITOR, 5)
        .account_code(DEPOSITOR, bytes!("6000"));
    let mut evm = create_evm(state, ScriptedInterpreter::default());

    let result =
        apply_message(&mut evm, &deposit(0, false), &mut GasPool::new(BLOCK_GAS_LIMIT)).unwrap();

    assert!(!result.failed());
    assert_eq!(evm.state.nonce(DEPOSITOR), 6);
}

#[test]
fn test_deposit_creates_contract() {
    let code = bytes!("600160005260206000f3");
    let interpreter =
        ScriptedInterpreter::default().with_create_script(vec![Behavior::Return(code.clone())]);
    let mut evm = create_evm(InMemoryState::default(), interpreter);
    let msg = TxMessage::deposit(DEPOSITOR, None, U256::ZERO, bytes!("00"), None, false);

    let result = apply_message(&mut evm, &msg, &mut GasPool::new(BLOCK_GAS_LIMIT)).unwrap();

    assert_eq!(result.used_gas, DEPOSIT_TX_GAS);
    assert_eq!(evm.state.code(DEPOSITOR.create(0)), code);
    assert_eq!(evm.state.nonce(DEPOSITOR), 1);
}

#[test]
fn test_deposit_receipts() {
    let interpreter =
        ScriptedInterpreter::default().with_script(CALLEE, vec![Behavior::Revert(Bytes::new())]);
    let mut evm = create_evm(InMemoryState::default(), interpreter);
    let mut pool = GasPool::new(3 * DEPOSIT_TX_GAS);
    let mut used_gas = 0;

    let system = TxEnvelope::Deposit(TxDeposit {
        chain_id: 10,
        from: DEPOSITOR,
        to: Some(COINBASE),
        is_system_tx: true,
        ..Default::default()
    });
    let (receipt, _) =
        apply_transaction(&mut evm, &mut pool, &system, Address::ZERO, &mut used_gas).unwrap();
    assert_eq!(receipt.tx_type, 0x7e);
    assert!(receipt.status);
    assert_eq!(receipt.cumulative_gas_used, 0);

    let user = TxEnvelope::Deposit(TxDeposit {
        chain_id: 10,
        from: DEPOSITOR,
        to: Some(CALLEE),
        mint: Some(U256::from(MINT)),
        ..Default::default()
    });
    let (receipt, result) =
        apply_transaction(&mut evm, &mut pool, &user, Address::ZERO, &mut used_gas).unwrap();
    assert!(!receipt.status);
    assert_eq!(result.revert(), Some(Bytes::new()));
    assert_eq!(receipt.cumulative_gas_used, DEPOSIT_TX_GAS);
    assert_eq!(evm.state.nonce(DEPOSITOR), 2);
}
