//! Transaction variants understood by the state transition.
//!
//! Three variants are signed by an externally-owned account ([`TxLegacy`], [`TxAccessList`],
//! [`TxDynamicFee`]). The deposit variant ([`TxDeposit`]) is authenticated on L1 instead and
//! carries no signature at all: [`SignedTransaction`] is not implemented for it, so asking a
//! deposit for its signature does not type-check. Through the type-erased [`TxEnvelope`] the
//! same request yields [`SignatureError::DepositTransaction`].

use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{constants::optimism, l1, SignatureError, TxMessage};

/// Type byte of [`TxLegacy`].
pub const LEGACY_TX_TYPE: u8 = 0x00;
/// Type byte of [`TxAccessList`].
pub const ACCESS_LIST_TX_TYPE: u8 = 0x01;
/// Type byte of [`TxDynamicFee`].
pub const DYNAMIC_FEE_TX_TYPE: u8 = 0x02;
/// Type byte of [`TxDeposit`].
pub const DEPOSIT_TX_TYPE: u8 = 0x7e;

static EMPTY_ACCESS_LIST: AccessList = AccessList(Vec::new());

/// Raw ECDSA signature values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxSignature {
    /// Recovery id, EIP-155 encoded for protected legacy transactions.
    pub v: u64,
    /// The `r` value.
    pub r: U256,
    /// The `s` value.
    pub s: U256,
}

/// Access to the signature of a signed transaction.
pub trait SignedTransaction {
    /// Returns the raw signature values.
    fn signature(&self) -> &TxSignature;

    /// Replaces the signature values.
    fn set_signature(&mut self, signature: TxSignature);
}

/// A pre-EIP-2718 transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxLegacy {
    /// The chain id, `None` for transactions signed before EIP-155.
    pub chain_id: Option<u64>,
    /// The sender nonce.
    pub nonce: u64,
    /// The gas price.
    pub gas_price: U256,
    /// The gas limit.
    pub gas_limit: u64,
    /// The recipient, `None` for a contract creation.
    pub to: Option<Address>,
    /// The value transferred.
    pub value: U256,
    /// The call data or init code.
    pub input: Bytes,
    /// The signature.
    pub signature: TxSignature,
}

/// An EIP-2930 transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxAccessList {
    /// The chain id.
    pub chain_id: u64,
    /// The sender nonce.
    pub nonce: u64,
    /// The gas price.
    pub gas_price: U256,
    /// The gas limit.
    pub gas_limit: u64,
    /// The recipient, `None` for a contract creation.
    pub to: Option<Address>,
    /// The value transferred.
    pub value: U256,
    /// The call data or init code.
    pub input: Bytes,
    /// The accounts and storage keys warmed before execution.
    pub access_list: AccessList,
    /// The signature.
    pub signature: TxSignature,
}

/// An EIP-1559 transaction, optionally referencing EIP-4844 data blobs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDynamicFee {
    /// The chain id.
    pub chain_id: u64,
    /// The sender nonce.
    pub nonce: u64,
    /// The priority fee cap.
    pub max_priority_fee_per_gas: U256,
    /// The fee cap.
    pub max_fee_per_gas: U256,
    /// The gas limit.
    pub gas_limit: u64,
    /// The recipient, `None` for a contract creation.
    pub to: Option<Address>,
    /// The value transferred.
    pub value: U256,
    /// The call data or init code.
    pub input: Bytes,
    /// The accounts and storage keys warmed before execution.
    pub access_list: AccessList,
    /// The maximum price per data gas, present once data sharding is active.
    pub max_fee_per_data_gas: Option<U256>,
    /// The versioned hashes of the referenced data blobs.
    pub blob_versioned_hashes: Vec<B256>,
    /// The signature.
    pub signature: TxSignature,
}

/// A deposit made on L1 and force-included on L2.
///
/// Deposits have no fee fields and no signature. Their gas allowance is the fixed
/// [`DEPOSIT_TX_GAS`](optimism::DEPOSIT_TX_GAS) and they never receive refunds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDeposit {
    /// The chain id.
    pub chain_id: u64,
    /// The sender, authenticated on L1.
    pub from: Address,
    /// The recipient, `None` for a contract creation.
    pub to: Option<Address>,
    /// The amount minted to the sender before execution.
    pub mint: Option<U256>,
    /// The value transferred.
    pub value: U256,
    /// The call data or init code.
    pub data: Bytes,
    /// Whether this is a system deposit.
    pub is_system_tx: bool,
}

impl TxDeposit {
    /// The declared gas allowance.
    pub const fn gas_limit(&self) -> u64 {
        optimism::DEPOSIT_TX_GAS
    }

    /// The nonce reported by every deposit.
    pub const fn nonce(&self) -> u64 {
        optimism::DEPOSIT_TX_NONCE
    }
}

macro_rules! impl_signed_transaction {
    ($($ty:ty),+) => {
        $(
            impl SignedTransaction for $ty {
                fn signature(&self) -> &TxSignature {
                    &self.signature
                }

                fn set_signature(&mut self, signature: TxSignature) {
                    self.signature = signature;
                }
            }
        )+
    };
}

impl_signed_transaction!(TxLegacy, TxAccessList, TxDynamicFee);

/// Any transaction the state transition can apply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TxEnvelope {
    /// A legacy transaction.
    Legacy(TxLegacy),
    /// An access list transaction.
    AccessList(TxAccessList),
    /// A dynamic-fee transaction.
    DynamicFee(TxDynamicFee),
    /// A deposit transaction.
    Deposit(TxDeposit),
}

impl TxEnvelope {
    /// The EIP-2718 type byte.
    pub const fn tx_type(&self) -> u8 {
        match self {
            Self::Legacy(_) => LEGACY_TX_TYPE,
            Self::AccessList(_) => ACCESS_LIST_TX_TYPE,
            Self::DynamicFee(_) => DYNAMIC_FEE_TX_TYPE,
            Self::Deposit(_) => DEPOSIT_TX_TYPE,
        }
    }

    /// Whether this is a deposit.
    pub const fn is_deposit(&self) -> bool {
        matches!(self, Self::Deposit(_))
    }

    /// The chain id, `None` for unprotected legacy transactions.
    pub const fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Legacy(tx) => tx.chain_id,
            Self::AccessList(tx) => Some(tx.chain_id),
            Self::DynamicFee(tx) => Some(tx.chain_id),
            Self::Deposit(tx) => Some(tx.chain_id),
        }
    }

    /// The nonce.
    pub const fn nonce(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.nonce,
            Self::AccessList(tx) => tx.nonce,
            Self::DynamicFee(tx) => tx.nonce,
            Self::Deposit(tx) => tx.nonce(),
        }
    }

    /// The gas limit.
    pub const fn gas_limit(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.gas_limit,
            Self::AccessList(tx) => tx.gas_limit,
            Self::DynamicFee(tx) => tx.gas_limit,
            Self::Deposit(tx) => tx.gas_limit(),
        }
    }

    /// The recipient, `None` for a contract creation.
    pub const fn to(&self) -> Option<Address> {
        match self {
            Self::Legacy(tx) => tx.to,
            Self::AccessList(tx) => tx.to,
            Self::DynamicFee(tx) => tx.to,
            Self::Deposit(tx) => tx.to,
        }
    }

    /// The value transferred.
    pub const fn value(&self) -> U256 {
        match self {
            Self::Legacy(tx) => tx.value,
            Self::AccessList(tx) => tx.value,
            Self::DynamicFee(tx) => tx.value,
            Self::Deposit(tx) => tx.value,
        }
    }

    /// The call data or init code.
    pub const fn input(&self) -> &Bytes {
        match self {
            Self::Legacy(tx) => &tx.input,
            Self::AccessList(tx) => &tx.input,
            Self::DynamicFee(tx) => &tx.input,
            Self::Deposit(tx) => &tx.data,
        }
    }

    /// The access list, empty for legacy and deposit transactions.
    pub fn access_list(&self) -> &AccessList {
        match self {
            Self::AccessList(tx) => &tx.access_list,
            Self::DynamicFee(tx) => &tx.access_list,
            Self::Legacy(_) | Self::Deposit(_) => &EMPTY_ACCESS_LIST,
        }
    }

    /// Whether the transaction is replay protected.
    ///
    /// Legacy transactions are protected when signed with an EIP-155 `v`. Typed transactions and
    /// deposits always are.
    pub const fn is_protected(&self) -> bool {
        match self {
            Self::Legacy(tx) => !matches!(tx.signature.v, 27 | 28),
            _ => true,
        }
    }

    /// Returns the raw signature values.
    pub fn signature(&self) -> Result<&TxSignature, SignatureError> {
        match self {
            Self::Legacy(tx) => Ok(tx.signature()),
            Self::AccessList(tx) => Ok(tx.signature()),
            Self::DynamicFee(tx) => Ok(tx.signature()),
            Self::Deposit(_) => Err(SignatureError::DepositTransaction),
        }
    }

    /// Replaces the signature values.
    pub fn set_signature(&mut self, signature: TxSignature) -> Result<(), SignatureError> {
        match self {
            Self::Legacy(tx) => tx.set_signature(signature),
            Self::AccessList(tx) => tx.set_signature(signature),
            Self::DynamicFee(tx) => tx.set_signature(signature),
            Self::Deposit(_) => return Err(SignatureError::DepositTransaction),
        }
        Ok(())
    }

    /// The L1 data gas footprint, derived from the payload. The fixed cost of the envelope
    /// fields is accounted for by the L1 fee overhead. Zero for deposits.
    pub fn rollup_data_gas(&self) -> u64 {
        match self {
            Self::Deposit(_) => 0,
            _ => l1::rollup_data_gas(self.input()),
        }
    }

    /// Converts the transaction into the message applied by the state transition.
    ///
    /// # Arguments
    ///
    /// * `sender` - The recovered signer. Ignored for deposits, whose sender is part of the
    ///   transaction.
    /// * `base_fee` - The block base fee. When known, the gas price of a dynamic-fee transaction
    ///   is its effective price `min(tip_cap + base_fee, fee_cap)`; otherwise its fee cap.
    pub fn as_message(&self, sender: Address, base_fee: Option<U256>) -> TxMessage {
        let message = match self {
            Self::Legacy(tx) => TxMessage::new(
                sender,
                tx.to,
                tx.nonce,
                tx.value,
                tx.gas_limit,
                tx.gas_price,
                tx.input.clone(),
            )
            .with_fee_caps(tx.gas_price, tx.gas_price),
            Self::AccessList(tx) => TxMessage::new(
                sender,
                tx.to,
                tx.nonce,
                tx.value,
                tx.gas_limit,
                tx.gas_price,
                tx.input.clone(),
            )
            .with_fee_caps(tx.gas_price, tx.gas_price)
            .with_access_list(tx.access_list.clone()),
            Self::DynamicFee(tx) => {
                let gas_price = base_fee.map_or(tx.max_fee_per_gas, |base_fee| {
                    tx.max_priority_fee_per_gas.saturating_add(base_fee).min(tx.max_fee_per_gas)
                });
                let message = TxMessage::new(
                    sender,
                    tx.to,
                    tx.nonce,
                    tx.value,
                    tx.gas_limit,
                    gas_price,
                    tx.input.clone(),
                )
                .with_fee_caps(tx.max_fee_per_gas, tx.max_priority_fee_per_gas)
                .with_access_list(tx.access_list.clone());
                match tx.max_fee_per_data_gas {
                    Some(max_fee) => {
                        message.with_data_gas(max_fee, tx.blob_versioned_hashes.clone())
                    }
                    None => message,
                }
            }
            Self::Deposit(tx) => {
                return TxMessage::deposit(
                    tx.from,
                    tx.to,
                    tx.value,
                    tx.data.clone(),
                    tx.mint,
                    tx.is_system_tx,
                );
            }
        };
        message.with_rollup_data_gas(self.rollup_data_gas())
    }
}
