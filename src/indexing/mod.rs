//! Indexing Module
//!
//! 이벤트 → 엔티티 변환 계층
//!
//! ```text
//! RawEvent ──▶ decoder::decode ──▶ DecodedEvent ──▶ mapping::map_event ──▶ Entity
//!              (스키마 검증)                         (필드 복사 + 봉투)
//! ```
//!
//! 모든 단계는 동기, 순수 함수. 저장은 `store` 계층 담당.

pub mod decoder;
pub mod entity;
pub mod event;
pub mod mapping;

pub use decoder::{decode, DecodedEvent};
pub use entity::{Entity, Field};
pub use event::{BlockContext, RawEvent};
pub use mapping::{handle_event, map_event};
