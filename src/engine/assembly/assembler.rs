use solana_sdk::hash::Hash;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;

use crate::txs::{AssemblyError, compile_unsigned};

use super::bundle::{ComputeBudgetPair, InstructionBundle};

/// 以同一 blockhash 与 ALT 将 bundle 编译为未签名 v0 交易。
#[derive(Debug, Clone, Copy)]
pub struct TransactionAssembler<'a> {
    payer: Pubkey,
    blockhash: Hash,
    lookup_table: Option<&'a AddressLookupTableAccount>,
}

impl<'a> TransactionAssembler<'a> {
    pub fn new(
        payer: Pubkey,
        blockhash: Hash,
        lookup_table: Option<&'a AddressLookupTableAccount>,
    ) -> Self {
        Self {
            payer,
            blockhash,
            lookup_table,
        }
    }

    pub fn payer(&self) -> &Pubkey {
        &self.payer
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    pub fn lookup_table(&self) -> Option<&'a AddressLookupTableAccount> {
        self.lookup_table
    }

    pub fn assemble(
        &self,
        bundle: &InstructionBundle,
        budget: &ComputeBudgetPair,
    ) -> Result<VersionedTransaction, AssemblyError> {
        let instructions = bundle.prefixed(&budget.instructions());
        compile_unsigned(&self.payer, &instructions, self.lookup_table, self.blockhash)
    }

    /// 任一 bundle 编译失败则整体失败。
    pub fn assemble_all<'b, I>(&self, items: I) -> Result<Vec<VersionedTransaction>, AssemblyError>
    where
        I: IntoIterator<Item = (&'b InstructionBundle, &'b ComputeBudgetPair)>,
    {
        items
            .into_iter()
            .map(|(bundle, budget)| self.assemble(bundle, budget))
            .collect()
    }
}
