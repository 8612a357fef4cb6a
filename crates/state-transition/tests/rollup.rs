//! Tests for rollup chains: configuration and the L1 data fee.

use alloy_primitives::{address, bytes, Address, B256, U256};
use mega_state_transition::{
    apply_message,
    constants::optimism::{BASE_FEE_RECIPIENT, L1_FEE_RECIPIENT},
    test_utils::ScriptedInterpreter,
    BlockEnv, ChainConfig, ChainRules, Evm, GasPool, InMemoryState, L1BlockInfo, StateDb,
    TransitionError, TxEnvelope, TxLegacy,
};

const CALLER: Address = address!("0x2000000000000000000000000000000000000002");
const CALLEE: Address = address!("0x1000000000000000000000000000000000000001");
const COINBASE: Address = address!("0x000000000000000000000000000000000000beef");

const BASE_FEE: u64 = 7;
const GAS_PRICE: u64 = 10;

const CHAIN_CONFIG: &str = r#"{
    "chainId": 10,
    "homesteadBlock": 0,
    "byzantiumBlock": 0,
    "istanbulBlock": 0,
    "berlinBlock": 0,
    "londonBlock": 0,
    "shanghaiTime": 1000,
    "optimism": { "bedrockBlock": 100 }
}"#;

fn chain_config() -> ChainConfig {
    serde_json::from_str(CHAIN_CONFIG).unwrap()
}

fn block(number: u64) -> BlockEnv {
    BlockEnv {
        number,
        timestamp: 500,
        coinbase: COINBASE,
        base_fee: Some(U256::from(BASE_FEE)),
        random: Some(B256::ZERO),
        excess_data_gas: None,
    }
}

fn l1_block_info() -> L1BlockInfo {
    L1BlockInfo::new(U256::from(1_000), U256::from(188), U256::from(1_000_000))
}

fn create_evm(number: u64, balance: u64) -> Evm<InMemoryState, ScriptedInterpreter, ChainConfig> {
    Evm::new(
        block(number),
        chain_config(),
        InMemoryState::default().account_balance(CALLER, U256::from(balance)),
        ScriptedInterpreter::default(),
    )
    .with_l1_cost_fn(l1_block_info())
}

/// A call carrying ten non-zero bytes of payload.
fn rollup_call() -> TxEnvelope {
    TxEnvelope::Legacy(TxLegacy {
        gas_price: U256::from(GAS_PRICE),
        gas_limit: 30_000,
        to: Some(CALLEE),
        input: bytes!("01010101010101010101"),
        ..Default::default()
    })
}

#[test]
fn test_chain_config_from_json() {
    let config = chain_config();
    assert_eq!(config.chain_id, 10);
    assert!(config.is_optimism());

    let rules = config.rules(99, true, 999);
    assert!(rules.is_london);
    assert!(!rules.is_shanghai);
    assert!(!rules.is_optimism_bedrock);

    let rules = config.rules(100, true, 1_000);
    assert!(rules.is_shanghai);
    assert!(rules.is_optimism_bedrock);
    assert!(!rules.is_sharding);
}

#[test]
fn test_bedrock_fee_vaults() {
    let mut evm = create_evm(100, 1_000_000);
    let mut pool = GasPool::new(30_000_000);
    let msg = rollup_call().as_message(CALLER, evm.block.base_fee);

    let result = apply_message(&mut evm, &msg, &mut pool).unwrap();

    let used = 21_000 + 10 * 16;
    // (160 + 188) * 1000 * 1_000_000 / 1_000_000
    let l1_cost = 348_000;
    assert_eq!(result.used_gas, used);
    assert_eq!(evm.state.balance(CALLER), U256::from(1_000_000 - used * GAS_PRICE - l1_cost));
    assert_eq!(evm.state.balance(COINBASE), U256::from(used * (GAS_PRICE - BASE_FEE)));
    assert_eq!(evm.state.balance(BASE_FEE_RECIPIENT), U256::from(used * BASE_FEE));
    assert_eq!(evm.state.balance(L1_FEE_RECIPIENT), U256::from(l1_cost));
}

#[test]
fn test_no_fee_vaults_before_bedrock() {
    let mut evm = create_evm(99, 1_000_000);
    let msg = rollup_call().as_message(CALLER, evm.block.base_fee);

    apply_message(&mut evm, &msg, &mut GasPool::new(30_000_000)).unwrap();

    assert_eq!(evm.state.balance(BASE_FEE_RECIPIENT), U256::ZERO);
    assert_eq!(evm.state.balance(L1_FEE_RECIPIENT), U256::ZERO);
}

#[test]
fn test_balance_must_cover_l1_cost() {
    let mut evm = create_evm(100, 30_000 * GAS_PRICE);
    let msg = rollup_call().as_message(CALLER, evm.block.base_fee);

    let err = apply_message(&mut evm, &msg, &mut GasPool::new(30_000_000)).unwrap_err();

    assert_eq!(
        err,
        TransitionError::InsufficientFunds {
            address: CALLER,
            have: U256::from(30_000 * GAS_PRICE),
            want: U256::from(30_000 * GAS_PRICE + 348_000),
        }
    );
}
