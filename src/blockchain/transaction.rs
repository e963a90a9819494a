//! Transaction building and finalization.
//!
//! # Responsibilities
//! - Collect transaction fields and signatures while a transaction is built
//! - Check a transaction is complete before it is submitted
//! - Serialize the finalized transaction for `sendrawtransaction`

use alloy::primitives::Address;

use crate::blockchain::codec::ByteWriter;
use crate::client::types::{ClientError, ClientResult};

/// Transaction type byte for contract deployment.
pub const TX_TYPE_DEPLOY: u8 = 0xd0;
/// Transaction type byte for contract invocation.
pub const TX_TYPE_INVOKE: u8 = 0xd1;

/// Upper bound on signature sets per transaction.
pub const MAX_SIGNATURES: usize = 16;

/// One (possibly multi-) signature over a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxSignature {
    pub pub_keys: Vec<Vec<u8>>,
    /// Number of signatures required out of `pub_keys`.
    pub m: u16,
    pub sig_data: Vec<Vec<u8>>,
}

impl TxSignature {
    /// Single-key signature.
    pub fn single(pub_key: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            pub_keys: vec![pub_key],
            m: 1,
            sig_data: vec![signature],
        }
    }

    fn check(&self, index: usize) -> ClientResult<()> {
        if self.pub_keys.is_empty() {
            return Err(ClientError::InvalidInput(format!(
                "signature {} has no public keys",
                index
            )));
        }
        let m = self.m as usize;
        if m == 0 || m > self.pub_keys.len() {
            return Err(ClientError::InvalidInput(format!(
                "signature {} requires {} of {} keys",
                index,
                m,
                self.pub_keys.len()
            )));
        }
        if self.sig_data.len() < m {
            return Err(ClientError::InvalidInput(format!(
                "signature {} has {} of {} required signatures",
                index,
                self.sig_data.len(),
                m
            )));
        }
        Ok(())
    }
}

/// A transaction still being assembled; fields and signatures may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub version: u8,
    pub tx_type: u8,
    pub nonce: u32,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub payer: Option<Address>,
    pub payload: Vec<u8>,
    pub sigs: Vec<TxSignature>,
}

impl UnsignedTransaction {
    pub fn new(tx_type: u8, payload: Vec<u8>) -> Self {
        Self {
            tx_type,
            payload,
            ..Default::default()
        }
    }

    pub fn with_payer(mut self, payer: Address) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn with_gas(mut self, gas_price: u64, gas_limit: u64) -> Self {
        self.gas_price = gas_price;
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn add_signature(&mut self, sig: TxSignature) {
        self.sigs.push(sig);
    }

    /// Freeze the transaction, failing if anything required for submission
    /// is missing.
    pub fn into_signed(self) -> ClientResult<SignedTransaction> {
        let payer = self
            .payer
            .ok_or_else(|| ClientError::InvalidInput("transaction payer is not set".into()))?;
        if self.sigs.is_empty() {
            return Err(ClientError::InvalidInput("transaction is not signed".into()));
        }
        if self.sigs.len() > MAX_SIGNATURES {
            return Err(ClientError::InvalidInput(format!(
                "transaction has {} signatures, at most {} allowed",
                self.sigs.len(),
                MAX_SIGNATURES
            )));
        }
        for (i, sig) in self.sigs.iter().enumerate() {
            sig.check(i)?;
        }

        Ok(SignedTransaction {
            version: self.version,
            tx_type: self.tx_type,
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            payer,
            payload: self.payload,
            sigs: self.sigs,
        })
    }
}

/// A finalized transaction, ready to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    version: u8,
    tx_type: u8,
    nonce: u32,
    gas_price: u64,
    gas_limit: u64,
    payer: Address,
    payload: Vec<u8>,
    sigs: Vec<TxSignature>,
}

impl SignedTransaction {
    pub fn payer(&self) -> Address {
        self.payer
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn signatures(&self) -> &[TxSignature] {
        &self.sigs
    }

    /// Wire encoding submitted to the node.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_u8(self.version);
        w.write_u8(self.tx_type);
        w.write_u32(self.nonce);
        w.write_u64(self.gas_price);
        w.write_u64(self.gas_limit);
        w.write_bytes(self.payer.as_slice());
        w.write_var_bytes(&self.payload);
        // attributes
        w.write_var_uint(0);
        w.write_var_uint(self.sigs.len() as u64);
        for sig in &self.sigs {
            w.write_var_uint(sig.sig_data.len() as u64);
            for data in &sig.sig_data {
                w.write_var_bytes(data);
            }
            w.write_var_uint(sig.pub_keys.len() as u64);
            for key in &sig.pub_keys {
                w.write_var_bytes(key);
            }
            w.write_var_uint(sig.m as u64);
        }
        w.into_bytes()
    }
}
