use solana_sdk::instruction::Instruction;

use crate::instructions::compute_budget::{decode_compute_unit_limit, decode_compute_unit_price};

/// 一笔交易承载的有序指令。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionBundle {
    instructions: Vec<Instruction>,
}

impl InstructionBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn push(&mut self, ix: Instruction) {
        self.instructions.push(ix);
    }

    pub fn pop(&mut self) -> Option<Instruction> {
        self.instructions.pop()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// 在指令前加上给定前缀，返回新的完整序列。
    pub fn prefixed(&self, prefix: &[Instruction]) -> Vec<Instruction> {
        let mut combined = Vec::with_capacity(prefix.len() + self.instructions.len());
        combined.extend_from_slice(prefix);
        combined.extend(self.instructions.iter().cloned());
        combined
    }
}

/// 每个 bundle 附带的计算预算指令：可选的 CU 上限 + 单价。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeBudgetPair {
    pub limit: Option<Instruction>,
    pub price: Instruction,
}

impl ComputeBudgetPair {
    pub fn new(limit: Option<Instruction>, price: Instruction) -> Self {
        Self { limit, price }
    }

    pub fn price_only(price: Instruction) -> Self {
        Self { limit: None, price }
    }

    pub fn compute_unit_limit(&self) -> Option<u32> {
        self.limit.as_ref().and_then(decode_compute_unit_limit)
    }

    pub fn compute_unit_price(&self) -> Option<u64> {
        decode_compute_unit_price(&self.price)
    }

    /// 按 `[limit?, price]` 顺序输出。
    pub fn instructions(&self) -> Vec<Instruction> {
        let mut out = Vec::with_capacity(2);
        if let Some(limit) = &self.limit {
            out.push(limit.clone());
        }
        out.push(self.price.clone());
        out
    }
}
