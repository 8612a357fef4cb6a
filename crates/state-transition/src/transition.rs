//! Application of a single message to the world state.
//!
//! [`apply_message`] is the only entry point. It either returns an [`ExecutionResult`], meaning
//! the transaction is valid and was charged (even if its execution failed), or a
//! [`TransitionError`], meaning the transaction is invalid and must not be included in a block.
//!
//! The transition runs in four steps:
//!
//! 1. `pre_check`: nonce, sender account type, fee caps and data gas price are validated, and the
//!    gas is bought from the sender and the block gas pool.
//! 2. The intrinsic gas is charged and the transaction limits (value transfer, init code size)
//!    are checked.
//! 3. The top-level call or creation runs on the [`Interpreter`].
//! 4. Unused gas is refunded to the sender and the pool, and the fee recipients are paid.
//!
//! Deposits skip the validation of step 1 and the settlement of step 4. A deposit that fails
//! validation is still included: its changes are discarded, its sender nonce is incremented and
//! it is recorded as having used all of its gas.

use alloy_primitives::{Bytes, U256};
use tracing::{debug, trace, warn};

use crate::{
    constants::{frontier, london, optimism, shanghai::MAX_INITCODE_SIZE},
    intrinsic_gas, ChainRules, CallInputs, CreateInputs, Evm, ExecutionError, ExecutionResult,
    GasPool, Interpreter, Message, Rules, StateDb, TransitionError, TxInspector,
};

/// Applies a message to the state of `evm`.
///
/// # Arguments
///
/// * `evm` - The execution context; its state is mutated
/// * `msg` - The message
/// * `gas_pool` - The gas left in the block
///
/// # Returns
///
/// The execution result of a valid transaction, or the consensus error of an invalid one. An
/// invalid non-deposit transaction leaves the state and the gas pool untouched.
pub fn apply_message<S, I, C, N, M>(
    evm: &mut Evm<S, I, C, N>,
    msg: &M,
    gas_pool: &mut GasPool,
) -> Result<ExecutionResult, TransitionError>
where
    S: StateDb,
    I: Interpreter<S>,
    C: ChainRules,
    N: TxInspector,
    M: Message + ?Sized,
{
    StateTransition::new(evm, msg, gas_pool).transition()
}

/// The working state of one [`apply_message`] call.
#[derive(derive_more::Debug)]
pub struct StateTransition<'a, S, I, C, N, M: ?Sized> {
    #[debug(ignore)]
    evm: &'a mut Evm<S, I, C, N>,
    #[debug(ignore)]
    msg: &'a M,
    gas_pool: &'a mut GasPool,
    gas_remaining: u64,
    rules: Rules,
}

impl<'a, S, I, C, N, M> StateTransition<'a, S, I, C, N, M>
where
    S: StateDb,
    I: Interpreter<S>,
    C: ChainRules,
    N: TxInspector,
    M: Message + ?Sized,
{
    /// Creates the working state. The rules are fixed from the current block of `evm`.
    pub fn new(evm: &'a mut Evm<S, I, C, N>, msg: &'a M, gas_pool: &'a mut GasPool) -> Self {
        let rules = evm.rules();
        Self { evm, msg, gas_pool, gas_remaining: 0, rules }
    }

    /// Runs the transition, converting every deposit failure except an exhausted block gas pool
    /// into an included failed deposit. Any other failure restores the state (except a deposit
    /// mint) and the gas pool.
    pub fn transition(mut self) -> Result<ExecutionResult, TransitionError> {
        let sender = self.msg.from();
        // The mint reflects a finalized L1 event and survives any failure below.
        if let Some(mint) = self.msg.mint() {
            self.evm.state.add_balance(sender, mint);
        }
        let snapshot = self.evm.state.snapshot();
        let gas_pool = *self.gas_pool;

        match self.inner_transition() {
            Err(err) if self.msg.is_deposit_tx() && !err.is_gas_limit_reached() => {
                self.evm.state.revert_to_snapshot(snapshot);
                let nonce = self.evm.state.nonce(sender);
                self.evm.state.set_nonce(sender, nonce.wrapping_add(1));

                let used_gas = self.deposit_gas_used();
                warn!(%sender, used_gas, error = %err, "Deposit failed, including it as failed");
                Ok(ExecutionResult {
                    used_gas,
                    error: Some(ExecutionError::FailedDeposit(err)),
                    return_data: Bytes::new(),
                })
            }
            Err(err) => {
                // Rejected transactions are never charged.
                self.evm.state.revert_to_snapshot(snapshot);
                *self.gas_pool = gas_pool;
                Err(err)
            }
            result => result,
        }
    }

    /// The gas used so far.
    pub fn gas_used(&self) -> u64 {
        self.msg.gas().saturating_sub(self.gas_remaining)
    }

    fn inner_transition(&mut self) -> Result<ExecutionResult, TransitionError> {
        self.pre_check()?;

        self.evm.inspector.on_tx_start(self.msg.gas());
        let result = self.execute();
        self.evm.inspector.on_tx_end(self.gas_remaining);
        result
    }

    fn execute(&mut self) -> Result<ExecutionResult, TransitionError> {
        let msg = self.msg;
        let sender = msg.from();
        let rules = self.rules;
        let is_contract_creation = msg.to().is_none();

        let intrinsic = intrinsic_gas(msg.data(), msg.access_list(), is_contract_creation, &rules)?;
        if self.gas_remaining < intrinsic {
            debug!(%sender, have = self.gas_remaining, want = intrinsic, "Intrinsic gas too low");
            return Err(TransitionError::IntrinsicGas { have: self.gas_remaining, want: intrinsic });
        }
        self.gas_remaining -= intrinsic;

        let value = msg.value();
        if !value.is_zero() && !self.evm.interpreter.can_transfer(&self.evm.state, sender, value) {
            return Err(TransitionError::InsufficientFundsForTransfer { address: sender });
        }

        if rules.is_shanghai && is_contract_creation && msg.data().len() > MAX_INITCODE_SIZE {
            return Err(TransitionError::MaxInitCodeSizeExceeded {
                size: msg.data().len(),
                limit: MAX_INITCODE_SIZE,
            });
        }

        let precompiles = self.evm.interpreter.active_precompiles(&rules);
        self.evm.state.prepare(
            &rules,
            sender,
            self.evm.block.coinbase,
            msg.to(),
            &precompiles,
            msg.access_list(),
        );

        let frame = match msg.to() {
            None => self.evm.interpreter.create(
                &mut self.evm.state,
                &rules,
                CreateInputs {
                    caller: sender,
                    init_code: msg.data().clone(),
                    gas_limit: self.gas_remaining,
                    value,
                },
            ),
            Some(target) => {
                // Bumped before the call so that it sticks even if the call reverts.
                let nonce = self.evm.state.nonce(sender);
                self.evm.state.set_nonce(sender, nonce.wrapping_add(1));
                self.evm.interpreter.call(
                    &mut self.evm.state,
                    &rules,
                    CallInputs {
                        caller: sender,
                        target,
                        input: msg.data().clone(),
                        gas_limit: self.gas_remaining,
                        value,
                    },
                )
            }
        };
        self.gas_remaining = frame.gas_left;
        let error = frame.error.map(ExecutionError::from);

        // Deposits pay no fees and get no refunds.
        if msg.is_deposit_tx() {
            return Ok(ExecutionResult {
                used_gas: self.deposit_gas_used(),
                error,
                return_data: frame.output,
            });
        }

        let refund_quotient =
            if rules.is_london { london::REFUND_QUOTIENT } else { frontier::REFUND_QUOTIENT };
        self.refund_gas(refund_quotient);

        let gas_used = self.gas_used();
        let base_fee = self.evm.block.base_fee.unwrap_or_default();
        let gas_fee_cap = msg.gas_fee_cap().unwrap_or_else(|| msg.gas_price());
        let gas_tip_cap = msg.gas_tip_cap().unwrap_or_else(|| msg.gas_price());

        if self.evm.config.no_base_fee && gas_fee_cap.is_zero() && gas_tip_cap.is_zero() {
            trace!(%sender, "Skipping fee payment of a zero-fee simulated call");
        } else {
            let effective_tip = if rules.is_london {
                gas_tip_cap.min(gas_fee_cap.saturating_sub(base_fee))
            } else {
                msg.gas_price()
            };
            let fee = U256::from(gas_used).saturating_mul(effective_tip);
            self.evm.state.add_balance(self.evm.block.coinbase, fee);
            trace!(coinbase = %self.evm.block.coinbase, %fee, %effective_tip, "Paid priority fee");
        }

        if rules.is_optimism_bedrock {
            let base_fee_paid = U256::from(gas_used).saturating_mul(base_fee);
            self.evm.state.add_balance(optimism::BASE_FEE_RECIPIENT, base_fee_paid);
            let l1_msg: &dyn Message = &msg;
            if let Some(l1_cost) = self.evm.l1_cost(l1_msg) {
                self.evm.state.add_balance(optimism::L1_FEE_RECIPIENT, l1_cost);
            }
        }

        debug!(%sender, gas_used, failed = error.is_some(), "Applied message");
        Ok(ExecutionResult { used_gas: gas_used, error, return_data: frame.output })
    }

    fn pre_check(&mut self) -> Result<(), TransitionError> {
        let msg = self.msg;
        if msg.is_deposit_tx() {
            // L1 already authenticated the deposit and its sender.
            self.gas_remaining += msg.gas();
            // System deposits do not consume block gas.
            if !msg.is_system_tx() {
                self.gas_pool.sub_gas(msg.gas())?;
            }
            return Ok(());
        }

        let sender = msg.from();
        if !msg.is_fake() {
            let state_nonce = self.evm.state.nonce(sender);
            let msg_nonce = msg.nonce();
            if state_nonce < msg_nonce {
                return Err(TransitionError::NonceTooHigh {
                    address: sender,
                    tx: msg_nonce,
                    state: state_nonce,
                });
            } else if state_nonce > msg_nonce {
                return Err(TransitionError::NonceTooLow {
                    address: sender,
                    tx: msg_nonce,
                    state: state_nonce,
                });
            } else if state_nonce == u64::MAX {
                return Err(TransitionError::NonceMax { address: sender, nonce: state_nonce });
            }

            let code_hash = self.evm.state.code_hash(sender);
            if code_hash != frontier::KECCAK_EMPTY && !code_hash.is_zero() {
                return Err(TransitionError::SenderNoEoa { address: sender, code_hash });
            }
        }

        if self.rules.is_london {
            let base_fee = self.evm.block.base_fee.ok_or_else(|| {
                TransitionError::InternalFailure(format!(
                    "london is active but the base fee is missing, block: {}",
                    self.evm.block.number
                ))
            })?;
            let gas_fee_cap = msg.gas_fee_cap().unwrap_or_else(|| msg.gas_price());
            let gas_tip_cap = msg.gas_tip_cap().unwrap_or_else(|| msg.gas_price());
            // Zero fee fields may run below the base fee when it is explicitly disabled.
            if !self.evm.config.no_base_fee || !gas_fee_cap.is_zero() || !gas_tip_cap.is_zero() {
                if gas_fee_cap < gas_tip_cap {
                    return Err(TransitionError::TipAboveFeeCap {
                        address: sender,
                        tip_cap: gas_tip_cap,
                        fee_cap: gas_fee_cap,
                    });
                }
                if gas_fee_cap < base_fee {
                    debug!(%sender, %gas_fee_cap, %base_fee, "Fee cap below base fee");
                    return Err(TransitionError::FeeCapTooLow {
                        address: sender,
                        fee_cap: gas_fee_cap,
                        base_fee,
                    });
                }
            }
        }

        if msg.data_gas_used() > 0 && self.rules.is_sharding {
            let data_gas_price = self.data_gas_price()?;
            let max_fee_per_data_gas = msg.max_fee_per_data_gas();
            if data_gas_price > max_fee_per_data_gas {
                return Err(TransitionError::MaxFeePerDataGas {
                    address: sender,
                    max_fee_per_data_gas,
                    data_gas_price,
                });
            }
        }

        self.buy_gas()
    }

    /// Charges the sender for the whole gas limit and takes it out of the block gas pool. Either
    /// everything is bought or nothing changes.
    fn buy_gas(&mut self) -> Result<(), TransitionError> {
        let msg = self.msg;
        let sender = msg.from();
        let gas = U256::from(msg.gas());
        let have = self.evm.state.balance(sender);
        let unaffordable = || TransitionError::InsufficientFunds {
            address: sender,
            have,
            want: U256::MAX,
        };

        let l1_msg: &dyn Message = &msg;
        let l1_cost = self.evm.l1_cost(l1_msg);
        let mut gas_cost = gas.checked_mul(msg.gas_price()).ok_or_else(unaffordable)?;
        if let Some(l1_cost) = l1_cost {
            gas_cost = gas_cost.checked_add(l1_cost).ok_or_else(unaffordable)?;
        }

        let (data_gas_used, data_cost) = if self.rules.is_sharding {
            let data_gas_used = msg.data_gas_used();
            let data_gas_price = self.data_gas_price()?;
            (data_gas_used, U256::from(data_gas_used).saturating_mul(data_gas_price))
        } else {
            (0, U256::ZERO)
        };

        // The fee cap is the binding commitment of a dynamic-fee sender, not the price it ends up
        // paying.
        let want = match msg.gas_fee_cap() {
            None => Some(gas_cost),
            Some(gas_fee_cap) => gas
                .checked_mul(gas_fee_cap)
                .and_then(|max_gas_fee| max_gas_fee.checked_add(msg.value()))
                .and_then(|want| want.checked_add(data_cost))
                .and_then(|want| want.checked_add(l1_cost.unwrap_or_default())),
        }
        .ok_or_else(unaffordable)?;
        if have < want {
            debug!(%sender, %have, %want, "Insufficient funds to buy gas");
            return Err(TransitionError::InsufficientFunds { address: sender, have, want });
        }

        self.gas_pool.sub_gas(msg.gas())?;
        if let Err(err) = self.gas_pool.sub_data_gas(data_gas_used) {
            self.gas_pool.add_gas(msg.gas());
            return Err(err.into());
        }
        self.gas_remaining += msg.gas();

        self.evm.state.sub_balance(sender, gas_cost.saturating_add(data_cost));
        trace!(%sender, gas = msg.gas(), %gas_cost, %data_cost, "Bought gas");
        Ok(())
    }

    /// Returns the allowed refund and the unused gas to the sender and the block gas pool.
    fn refund_gas(&mut self, refund_quotient: u64) {
        let refund = (self.gas_used() / refund_quotient).min(self.evm.state.refund());
        self.gas_remaining += refund;

        // Unused gas is exchanged at the price the sender paid, never at the fee cap.
        let remaining = U256::from(self.gas_remaining).saturating_mul(self.msg.gas_price());
        self.evm.state.add_balance(self.msg.from(), remaining);

        self.gas_pool.add_gas(self.gas_remaining);
        trace!(refund, gas_remaining = self.gas_remaining, "Refunded gas");
    }

    fn data_gas_price(&self) -> Result<U256, TransitionError> {
        self.evm.block.data_gas_price().ok_or_else(|| {
            TransitionError::InternalFailure(format!(
                "sharding is active but the excess data gas is missing, time: {}",
                self.evm.block.timestamp
            ))
        })
    }

    /// Deposits report their whole allowance as used, system deposits nothing.
    fn deposit_gas_used(&self) -> u64 {
        if self.msg.is_system_tx() {
            0
        } else {
            self.msg.gas()
        }
    }
}
