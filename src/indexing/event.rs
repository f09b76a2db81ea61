//! Raw event envelope delivered by the chain source.

use ethers::abi::LogParam;
use ethers::types::Bytes;

use crate::schema::Contract;

/// 이벤트가 포함된 블록 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    pub number: u64,
    /// 체인이 보고한 블록 시각 (unix seconds)
    pub timestamp: u64,
}

/// 디코딩 전 이벤트
///
/// `params`는 ABI 선언 순서 그대로의 `(name, token)` 목록.
/// 어느 스키마로 디코딩할지는 `(contract, event)`로 정해진다.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub contract: Contract,
    pub event: String,
    pub block: BlockContext,
    pub transaction_hash: Bytes,
    pub log_index: u64,
    pub params: Vec<LogParam>,
}

impl RawEvent {
    /// 체인 순서 키
    pub fn position(&self) -> (u64, u64) {
        (self.block.number, self.log_index)
    }
}
