use crate::TxInspector;

/// A [`TxInspector`] recording the gas it is notified of.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GasRecorder {
    /// The gas limits passed to `on_tx_start`, in order.
    pub started: Vec<u64>,
    /// The remaining gas passed to `on_tx_end`, in order.
    pub ended: Vec<u64>,
}

impl TxInspector for GasRecorder {
    fn on_tx_start(&mut self, gas_limit: u64) {
        self.started.push(gas_limit);
    }

    fn on_tx_end(&mut self, gas_remaining: u64) {
        self.ended.push(gas_remaining);
    }
}
