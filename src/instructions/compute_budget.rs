use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

pub const COMPUTE_BUDGET_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ComputeBudget111111111111111111111111111111");

/// 单笔交易允许声明的最大计算单元。
pub const MAX_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

/// 费用服务不可用时使用的单价（micro-lamports / CU）。
pub const DEFAULT_COMPUTE_UNIT_PRICE: u64 = 3_000;

const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;
const SET_COMPUTE_UNIT_PRICE_TAG: u8 = 3;

pub fn compute_unit_limit_instruction(limit: u32) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_limit(limit)
}

pub fn compute_unit_price_instruction(price_micro_lamports: u64) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_price(price_micro_lamports)
}

/// 估算尺寸时使用的单价占位指令，长度与真实单价指令一致。
pub fn placeholder_price_instruction() -> Instruction {
    compute_unit_price_instruction(DEFAULT_COMPUTE_UNIT_PRICE)
}

/// 模拟时使用的上限指令，避免模拟被默认 CU 上限截断。
pub fn simulation_limit_instruction() -> Instruction {
    compute_unit_limit_instruction(MAX_COMPUTE_UNIT_LIMIT)
}

pub fn is_compute_budget(ix: &Instruction) -> bool {
    ix.program_id == COMPUTE_BUDGET_PROGRAM_ID
}

pub fn decode_compute_unit_limit(ix: &Instruction) -> Option<u32> {
    if !is_compute_budget(ix) {
        return None;
    }
    match ix.data.split_first() {
        Some((&SET_COMPUTE_UNIT_LIMIT_TAG, rest)) => {
            rest.try_into().ok().map(u32::from_le_bytes)
        }
        _ => None,
    }
}

pub fn decode_compute_unit_price(ix: &Instruction) -> Option<u64> {
    if !is_compute_budget(ix) {
        return None;
    }
    match ix.data.split_first() {
        Some((&SET_COMPUTE_UNIT_PRICE_TAG, rest)) => {
            rest.try_into().ok().map(u64::from_le_bytes)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_target_compute_budget_program() {
        let limit = compute_unit_limit_instruction(200_000);
        let price = compute_unit_price_instruction(1_245);
        assert!(is_compute_budget(&limit));
        assert!(is_compute_budget(&price));
        assert_eq!(decode_compute_unit_limit(&limit), Some(200_000));
        assert_eq!(decode_compute_unit_price(&price), Some(1_245));
        assert_eq!(decode_compute_unit_limit(&price), None);
        assert_eq!(decode_compute_unit_price(&limit), None);
    }

    #[test]
    fn placeholder_matches_real_price_size() {
        assert_eq!(
            placeholder_price_instruction().data.len(),
            compute_unit_price_instruction(u64::MAX).data.len()
        );
        assert_eq!(
            decode_compute_unit_limit(&simulation_limit_instruction()),
            Some(MAX_COMPUTE_UNIT_LIMIT)
        );
    }
}
