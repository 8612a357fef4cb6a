//! The execution context a transaction is applied in.
//!
//! [`Evm`] bundles what the state transition needs besides the message itself:
//!
//! - the [`BlockEnv`] and the [`ChainRules`] deciding which rules are in force
//! - the [`StateDb`] the transaction mutates
//! - the [`Interpreter`] running contract code
//! - an optional [`L1CostFn`] pricing the L1 data of rollup transactions
//! - a [`TxInspector`] observing execution

mod env;
mod inspector;
mod interpreter;
mod precompiles;

pub use env::*;
pub use inspector::*;
pub use interpreter::*;
pub use precompiles::*;

use alloy_primitives::U256;

use crate::{ChainRules, L1CostFn, Message, Rules, StateDb};

/// The execution context of a transaction.
///
/// # Type Parameters
///
/// - `S`: The world state, implementing [`StateDb`]
/// - `I`: The virtual machine, implementing [`Interpreter`]
/// - `C`: The rule activation schedule, implementing [`ChainRules`]
/// - `N`: The inspector, implementing [`TxInspector`]
#[derive(derive_more::Debug)]
pub struct Evm<S, I, C, N = NoOpInspector> {
    /// The block.
    pub block: BlockEnv,
    /// Execution switches.
    pub config: EvmConfig,
    /// The rule activation schedule.
    pub chain: C,
    /// The world state.
    pub state: S,
    /// The virtual machine.
    pub interpreter: I,
    /// The L1 data cost function of rollup chains.
    #[debug(ignore)]
    pub l1_cost_fn: Option<Box<dyn L1CostFn>>,
    /// The inspector.
    pub inspector: N,
}

impl<S, I, C> Evm<S, I, C>
where
    S: StateDb,
    I: Interpreter<S>,
    C: ChainRules,
{
    /// Creates a context with the default config, no L1 cost function and no inspector.
    pub fn new(block: BlockEnv, chain: C, state: S, interpreter: I) -> Self {
        Self {
            block,
            config: EvmConfig::default(),
            chain,
            state,
            interpreter,
            l1_cost_fn: None,
            inspector: NoOpInspector,
        }
    }
}

impl<S, I, C, N> Evm<S, I, C, N>
where
    S: StateDb,
    I: Interpreter<S>,
    C: ChainRules,
    N: TxInspector,
{
    /// Sets the execution switches.
    pub fn with_config(mut self, config: EvmConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the L1 data cost function.
    pub fn with_l1_cost_fn(mut self, l1_cost_fn: impl L1CostFn + 'static) -> Self {
        self.l1_cost_fn = Some(Box::new(l1_cost_fn));
        self
    }

    /// Replaces the inspector.
    pub fn with_inspector<N2: TxInspector>(self, inspector: N2) -> Evm<S, I, C, N2> {
        Evm {
            block: self.block,
            config: self.config,
            chain: self.chain,
            state: self.state,
            interpreter: self.interpreter,
            l1_cost_fn: self.l1_cost_fn,
            inspector,
        }
    }

    /// Replaces the block, keeping the state. Used to apply the transactions of consecutive
    /// blocks.
    pub fn set_block(&mut self, block: BlockEnv) {
        self.block = block;
    }

    /// The rules in force for the current block.
    pub fn rules(&self) -> Rules {
        self.chain.rules(self.block.number, self.block.is_merge(), self.block.timestamp)
    }

    /// The L1 data cost of a message in the current block, if any.
    pub fn l1_cost(&self, msg: &dyn Message) -> Option<U256> {
        self.l1_cost_fn.as_ref().and_then(|l1_cost_fn| l1_cost_fn.l1_cost(self.block.number, msg))
    }

    /// Consumes the context, returning the world state.
    pub fn into_state(self) -> S {
        self.state
    }
}
