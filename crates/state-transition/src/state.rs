use core::fmt::Debug;

use alloy_eips::eip2930::AccessList;
use alloy_primitives::{
    keccak256,
    map::{HashMap, HashSet},
    Address, Bytes, B256, U256,
};

use crate::{constants::frontier::KECCAK_EMPTY, Rules};

/// Handle to a point in the state history, returned by [`StateDb::snapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(usize);

/// The world state a transaction is applied to.
///
/// Every mutation made through this trait must be revertible with
/// [`StateDb::revert_to_snapshot`] until [`StateDb::finalize`] is called.
pub trait StateDb: Debug {
    /// Whether the account exists.
    fn exists(&self, address: Address) -> bool;

    /// The balance of an account, zero if it does not exist.
    fn balance(&self, address: Address) -> U256;

    /// Sets the balance of an account, creating it if needed.
    fn set_balance(&mut self, address: Address, balance: U256);

    /// Credits an account.
    fn add_balance(&mut self, address: Address, amount: U256) {
        let balance = self.balance(address).saturating_add(amount);
        self.set_balance(address, balance);
    }

    /// Debits an account. Callers check the balance first.
    fn sub_balance(&mut self, address: Address, amount: U256) {
        let balance = self.balance(address).saturating_sub(amount);
        self.set_balance(address, balance);
    }

    /// The nonce of an account, zero if it does not exist.
    fn nonce(&self, address: Address) -> u64;

    /// Sets the nonce of an account, creating it if needed.
    fn set_nonce(&mut self, address: Address, nonce: u64);

    /// The code hash of an account: [`B256::ZERO`] if it does not exist, [`KECCAK_EMPTY`] if it
    /// has no code.
    fn code_hash(&self, address: Address) -> B256;

    /// The code of an account.
    fn code(&self, address: Address) -> Bytes;

    /// Sets the code of an account, creating it if needed.
    fn set_code(&mut self, address: Address, code: Bytes);

    /// Reads a storage slot.
    fn storage(&self, address: Address, key: B256) -> B256;

    /// Writes a storage slot, creating the account if needed.
    fn set_storage(&mut self, address: Address, key: B256, value: B256);

    /// The gas refund counter of the current transaction.
    fn refund(&self) -> u64;

    /// Increases the refund counter.
    fn add_refund(&mut self, gas: u64);

    /// Decreases the refund counter.
    fn sub_refund(&mut self, gas: u64);

    /// Whether an address is in the warm set of the current transaction.
    fn is_address_warm(&self, address: Address) -> bool;

    /// Whether a storage slot is in the warm set of the current transaction.
    fn is_slot_warm(&self, address: Address, key: B256) -> bool;

    /// Adds an address to the warm set.
    fn warm_address(&mut self, address: Address);

    /// Adds a storage slot (and its address) to the warm set.
    fn warm_slot(&mut self, address: Address, key: B256);

    /// Reads a transient storage slot (EIP-1153).
    fn transient_storage(&self, address: Address, key: B256) -> B256;

    /// Writes a transient storage slot (EIP-1153).
    fn set_transient_storage(&mut self, address: Address, key: B256, value: B256);

    /// Records the current point of the state history.
    fn snapshot(&mut self) -> SnapshotId;

    /// Undoes every mutation made since `snapshot` was taken.
    fn revert_to_snapshot(&mut self, snapshot: SnapshotId);

    /// Resets the per-transaction state before execution.
    ///
    /// # Arguments
    ///
    /// * `rules` - The rules in force
    /// * `sender` - The transaction sender
    /// * `coinbase` - The block fee recipient, warm from Shanghai on (EIP-3651)
    /// * `destination` - The recipient, `None` for a contract creation
    /// * `precompiles` - The addresses of the active precompiles
    /// * `access_list` - The access list of the transaction
    fn prepare(
        &mut self,
        rules: &Rules,
        sender: Address,
        coinbase: Address,
        destination: Option<Address>,
        precompiles: &[Address],
        access_list: &AccessList,
    );

    /// Ends the current transaction: its changes can no longer be reverted and the refund counter
    /// is cleared.
    fn finalize(&mut self);
}

/// An account of the [`InMemoryState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// The balance.
    pub balance: U256,
    /// The nonce.
    pub nonce: u64,
    /// The code.
    pub code: Bytes,
    /// The hash of the code.
    pub code_hash: B256,
    /// The storage.
    pub storage: HashMap<B256, B256>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::ZERO,
            nonce: 0,
            code: Bytes::new(),
            code_hash: KECCAK_EMPTY,
            storage: HashMap::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum JournalEntry {
    AccountCreated { address: Address },
    BalanceChanged { address: Address, previous: U256 },
    NonceChanged { address: Address, previous: u64 },
    CodeChanged { address: Address, previous: Bytes, previous_hash: B256 },
    StorageChanged { address: Address, key: B256, previous: B256 },
    RefundChanged { previous: u64 },
    AddressWarmed { address: Address },
    SlotWarmed { address: Address, key: B256 },
    TransientStorageChanged { address: Address, key: B256, previous: B256 },
}

/// A [`StateDb`] held in memory.
///
/// Every mutation records its previous value in a journal. A snapshot is a position in the
/// journal, and reverting pops entries back to it, so the cost of a revert is proportional to the
/// number of changes since the snapshot.
#[derive(Clone, Debug, Default)]
pub struct InMemoryState {
    accounts: HashMap<Address, Account>,
    refund: u64,
    warm_addresses: HashSet<Address>,
    warm_slots: HashSet<(Address, B256)>,
    transient_storage: HashMap<(Address, B256), B256>,
    journal: Vec<JournalEntry>,
}

impl InMemoryState {
    /// Sets the balance of an account without journaling it.
    pub fn account_balance(mut self, address: Address, balance: U256) -> Self {
        self.accounts.entry(address).or_default().balance = balance;
        self
    }

    /// Sets the nonce of an account without journaling it.
    pub fn account_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.accounts.entry(address).or_default().nonce = nonce;
        self
    }

    /// Sets the code of an account without journaling it.
    pub fn account_code(mut self, address: Address, code: Bytes) -> Self {
        let account = self.accounts.entry(address).or_default();
        account.code_hash = if code.is_empty() { KECCAK_EMPTY } else { keccak256(&code) };
        account.code = code;
        self
    }

    /// Sets a storage slot of an account without journaling it.
    pub fn account_storage(mut self, address: Address, key: B256, value: B256) -> Self {
        self.accounts.entry(address).or_default().storage.insert(key, value);
        self
    }

    /// Returns an account.
    pub fn account(&self, address: Address) -> Option<&Account> {
        self.accounts.get(&address)
    }

    /// The number of changes that a revert to the start of the current transaction would undo.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    fn account_mut(&mut self, address: Address) -> &mut Account {
        if !self.accounts.contains_key(&address) {
            self.journal.push(JournalEntry::AccountCreated { address });
        }
        self.accounts.entry(address).or_default()
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::AccountCreated { address } => {
                self.accounts.remove(&address);
            }
            JournalEntry::BalanceChanged { address, previous } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.balance = previous;
                }
            }
            JournalEntry::NonceChanged { address, previous } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.nonce = previous;
                }
            }
            JournalEntry::CodeChanged { address, previous, previous_hash } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.code = previous;
                    account.code_hash = previous_hash;
                }
            }
            JournalEntry::StorageChanged { address, key, previous } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.storage.insert(key, previous);
                }
            }
            JournalEntry::RefundChanged { previous } => self.refund = previous,
            JournalEntry::AddressWarmed { address } => {
                self.warm_addresses.remove(&address);
            }
            JournalEntry::SlotWarmed { address, key } => {
                self.warm_slots.remove(&(address, key));
            }
            JournalEntry::TransientStorageChanged { address, key, previous } => {
                self.transient_storage.insert((address, key), previous);
            }
        }
    }
}

impl StateDb for InMemoryState {
    fn exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn balance(&self, address: Address) -> U256 {
        self.accounts.get(&address).map(|account| account.balance).unwrap_or_default()
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        let account = self.account_mut(address);
        let previous = core::mem::replace(&mut account.balance, balance);
        self.journal.push(JournalEntry::BalanceChanged { address, previous });
    }

    fn nonce(&self, address: Address) -> u64 {
        self.accounts.get(&address).map(|account| account.nonce).unwrap_or_default()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        let account = self.account_mut(address);
        let previous = core::mem::replace(&mut account.nonce, nonce);
        self.journal.push(JournalEntry::NonceChanged { address, previous });
    }

    fn code_hash(&self, address: Address) -> B256 {
        self.accounts.get(&address).map(|account| account.code_hash).unwrap_or_default()
    }

    fn code(&self, address: Address) -> Bytes {
        self.accounts.get(&address).map(|account| account.code.clone()).unwrap_or_default()
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        let code_hash = if code.is_empty() { KECCAK_EMPTY } else { keccak256(&code) };
        let account = self.account_mut(address);
        let previous = core::mem::replace(&mut account.code, code);
        let previous_hash = core::mem::replace(&mut account.code_hash, code_hash);
        self.journal.push(JournalEntry::CodeChanged { address, previous, previous_hash });
    }

    fn storage(&self, address: Address, key: B256) -> B256 {
        self.accounts
            .get(&address)
            .and_then(|account| account.storage.get(&key).copied())
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, key: B256, value: B256) {
        let account = self.account_mut(address);
        let previous = account.storage.insert(key, value).unwrap_or_default();
        self.journal.push(JournalEntry::StorageChanged { address, key, previous });
    }

    fn refund(&self) -> u64 {
        self.refund
    }

    fn add_refund(&mut self, gas: u64) {
        self.journal.push(JournalEntry::RefundChanged { previous: self.refund });
        self.refund = self.refund.saturating_add(gas);
    }

    fn sub_refund(&mut self, gas: u64) {
        self.journal.push(JournalEntry::RefundChanged { previous: self.refund });
        self.refund = self.refund.saturating_sub(gas);
    }

    fn is_address_warm(&self, address: Address) -> bool {
        self.warm_addresses.contains(&address)
    }

    fn is_slot_warm(&self, address: Address, key: B256) -> bool {
        self.warm_slots.contains(&(address, key))
    }

    fn warm_address(&mut self, address: Address) {
        if self.warm_addresses.insert(address) {
            self.journal.push(JournalEntry::AddressWarmed { address });
        }
    }

    fn warm_slot(&mut self, address: Address, key: B256) {
        self.warm_address(address);
        if self.warm_slots.insert((address, key)) {
            self.journal.push(JournalEntry::SlotWarmed { address, key });
        }
    }

    fn transient_storage(&self, address: Address, key: B256) -> B256 {
        self.transient_storage.get(&(address, key)).copied().unwrap_or_default()
    }

    fn set_transient_storage(&mut self, address: Address, key: B256, value: B256) {
        let previous = self.transient_storage.insert((address, key), value).unwrap_or_default();
        self.journal.push(JournalEntry::TransientStorageChanged { address, key, previous });
    }

    fn snapshot(&mut self) -> SnapshotId {
        SnapshotId(self.journal.len())
    }

    fn revert_to_snapshot(&mut self, snapshot: SnapshotId) {
        while self.journal.len() > snapshot.0 {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
    }

    fn prepare(
        &mut self,
        rules: &Rules,
        sender: Address,
        coinbase: Address,
        destination: Option<Address>,
        precompiles: &[Address],
        access_list: &AccessList,
    ) {
        self.transient_storage.clear();
        if !rules.is_berlin {
            return;
        }
        self.warm_addresses.clear();
        self.warm_slots.clear();

        self.warm_address(sender);
        if let Some(destination) = destination {
            self.warm_address(destination);
        }
        for precompile in precompiles {
            self.warm_address(*precompile);
        }
        for item in &access_list.0 {
            self.warm_address(item.address);
            for key in &item.storage_keys {
                self.warm_slot(item.address, *key);
            }
        }
        if rules.is_shanghai {
            self.warm_address(coinbase);
        }
    }

    fn finalize(&mut self) {
        self.journal.clear();
        self.refund = 0;
    }
}
