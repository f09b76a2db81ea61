//! Event Schemas
//!
//! 컨트랙트별 이벤트 레이아웃 정의. 매핑 함수는 이벤트마다 따로 작성하지 않고
//! 여기의 정적 디스크립터(필드 순서, ABI 타입, indexed 여부)를 따라 동작한다.
//!
//! ```text
//! EventSchema ──▶ signature()  "BidPlaced(uint256,address,uint256,bool)"
//!             ──▶ topic0()     keccak256(signature)
//!             ──▶ abi_event()  ethers::abi::Event (raw log 디코딩)
//!             ──▶ params       map_event 필드 복사 순서
//! ```

mod auction;
mod car_registry;
mod merkle_verifier;
mod profile;
mod proof_sync;
mod zero_nft;

use std::collections::BTreeSet;
use std::fmt;

use ethers::abi::{Event, EventParam, ParamType};
use ethers::types::H256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// 인덱싱 대상 컨트랙트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contract {
    Auction,
    CarRegistry,
    MerkleVerifier,
    Profile,
    ProofSync,
    ZeroNft,
}

impl Contract {
    pub const ALL: [Contract; 6] = [
        Contract::Auction,
        Contract::CarRegistry,
        Contract::MerkleVerifier,
        Contract::Profile,
        Contract::ProofSync,
        Contract::ZeroNft,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Contract::Auction => "Auction",
            Contract::CarRegistry => "CarRegistry",
            Contract::MerkleVerifier => "MerkleVerifier",
            Contract::Profile => "Profile",
            Contract::ProofSync => "ProofSync",
            Contract::ZeroNft => "ZeroNFT",
        }
    }

    /// 배포 주소 환경변수 이름
    pub fn env_key(&self) -> &'static str {
        match self {
            Contract::Auction => "AUCTION_ADDRESS",
            Contract::CarRegistry => "CAR_REGISTRY_ADDRESS",
            Contract::MerkleVerifier => "MERKLE_VERIFIER_ADDRESS",
            Contract::Profile => "PROFILE_ADDRESS",
            Contract::ProofSync => "PROOF_SYNC_ADDRESS",
            Contract::ZeroNft => "ZERO_NFT_ADDRESS",
        }
    }

    pub fn events(&self) -> &'static [EventSchema] {
        match self {
            Contract::Auction => auction::EVENTS,
            Contract::CarRegistry => car_registry::EVENTS,
            Contract::MerkleVerifier => merkle_verifier::EVENTS,
            Contract::Profile => profile::EVENTS,
            Contract::ProofSync => proof_sync::EVENTS,
            Contract::ZeroNft => zero_nft::EVENTS,
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ABI 파라미터 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Uint(usize),
    Address,
    FixedBytes(usize),
    String,
    Bool,
    Array(&'static ParamKind),
}

pub const UINT256: ParamKind = ParamKind::Uint(256);
pub const ADDRESS: ParamKind = ParamKind::Address;
pub const BYTES32: ParamKind = ParamKind::FixedBytes(32);
pub const STRING: ParamKind = ParamKind::String;
pub const BOOL: ParamKind = ParamKind::Bool;

impl ParamKind {
    /// 시그니처용 정규 타입 이름 (`uint256`, `bytes32[]`)
    pub fn canonical(&self) -> String {
        match self {
            ParamKind::Uint(bits) => format!("uint{}", bits),
            ParamKind::Address => "address".to_string(),
            ParamKind::FixedBytes(len) => format!("bytes{}", len),
            ParamKind::String => "string".to_string(),
            ParamKind::Bool => "bool".to_string(),
            ParamKind::Array(inner) => format!("{}[]", inner.canonical()),
        }
    }

    pub fn to_param_type(&self) -> ParamType {
        match self {
            ParamKind::Uint(bits) => ParamType::Uint(*bits),
            ParamKind::Address => ParamType::Address,
            ParamKind::FixedBytes(len) => ParamType::FixedBytes(*len),
            ParamKind::String => ParamType::String,
            ParamKind::Bool => ParamType::Bool,
            ParamKind::Array(inner) => ParamType::Array(Box::new(inner.to_param_type())),
        }
    }

    /// indexed로 선언되면 값 대신 keccak 해시만 topic에 남는 타입
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ParamKind::String | ParamKind::Array(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ParamKind::Uint(_))
    }
}

/// 필드 복사 시 적용할 변환
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTransform {
    Identity,
    /// `BrandNFTMinted.brandName` 전용
    ToString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub indexed: bool,
    pub transform: FieldTransform,
}

impl ParamSpec {
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            indexed: false,
            transform: FieldTransform::Identity,
        }
    }

    pub const fn indexed(self) -> Self {
        Self {
            indexed: true,
            ..self
        }
    }

    pub const fn coerced_to_string(self) -> Self {
        Self {
            transform: FieldTransform::ToString,
            ..self
        }
    }
}

/// OpenZeppelin Ownable (CarRegistry, ZeroNFT 공통)
const OWNERSHIP_TRANSFERRED: &[ParamSpec] = &[
    ParamSpec::new("previousOwner", ADDRESS).indexed(),
    ParamSpec::new("newOwner", ADDRESS).indexed(),
];

/// 이벤트 하나의 정적 디스크립터
#[derive(Debug, PartialEq, Eq)]
pub struct EventSchema {
    pub contract: Contract,
    /// ABI 이벤트 이름
    pub name: &'static str,
    /// 저장될 엔티티 타입 이름
    pub entity: &'static str,
    pub params: &'static [ParamSpec],
}

impl EventSchema {
    /// `Name(type1,type2,...)`
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.params.iter().map(|p| p.kind.canonical()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn topic0(&self) -> H256 {
        H256::from_slice(&Keccak256::digest(self.signature().as_bytes()))
    }

    pub fn abi_event(&self) -> Event {
        Event {
            name: self.name.to_string(),
            inputs: self
                .params
                .iter()
                .map(|p| EventParam {
                    name: p.name.to_string(),
                    kind: p.kind.to_param_type(),
                    indexed: p.indexed,
                })
                .collect(),
            anonymous: false,
        }
    }
}

/// 전체 스키마 (컨트랙트 순서, 컨트랙트 내 선언 순서)
pub fn all() -> impl Iterator<Item = &'static EventSchema> {
    Contract::ALL.into_iter().flat_map(|c| c.events().iter())
}

pub fn find(contract: Contract, event: &str) -> Option<&'static EventSchema> {
    contract.events().iter().find(|s| s.name == event)
}

/// 엔티티 타입 목록 (중복 제거)
pub fn entity_types() -> BTreeSet<&'static str> {
    all().map(|s| s.entity).collect()
}

/// 엔티티 타입의 필드 레이아웃
///
/// 같은 엔티티를 쓰는 이벤트(OwnershipTransferred)는 레이아웃이 같다.
pub fn entity_fields(entity: &str) -> Option<&'static [ParamSpec]> {
    all().find(|s| s.entity == entity).map(|s| s.params)
}

pub fn entity_field(entity: &str, field: &str) -> Option<&'static ParamSpec> {
    entity_fields(entity)?.iter().find(|p| p.name == field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_size() {
        assert_eq!(auction::EVENTS.len(), 8);
        assert_eq!(car_registry::EVENTS.len(), 10);
        assert_eq!(merkle_verifier::EVENTS.len(), 5);
        assert_eq!(profile::EVENTS.len(), 3);
        assert_eq!(proof_sync::EVENTS.len(), 6);
        assert_eq!(zero_nft::EVENTS.len(), 15);
        assert_eq!(all().count(), 47);
    }

    #[test]
    fn test_schemas_belong_to_their_contract() {
        for contract in Contract::ALL {
            for schema in contract.events() {
                assert_eq!(schema.contract, contract, "{}", schema.name);
            }
        }
    }

    #[test]
    fn test_topic0_matches_ethabi() {
        for schema in all() {
            assert_eq!(schema.topic0(), schema.abi_event().signature(), "{}", schema.name);
        }
    }

    #[test]
    fn test_known_signatures() {
        let bid = find(Contract::Auction, "BidPlaced").unwrap();
        assert_eq!(bid.signature(), "BidPlaced(uint256,address,uint256,bool)");

        let synced = find(Contract::ProofSync, "ProofSynced").unwrap();
        assert_eq!(synced.signature(), "ProofSynced(string,uint64[],bytes32[])");

        // ERC-721 Transfer
        let transfer = find(Contract::ZeroNft, "Transfer").unwrap();
        assert_eq!(
            format!("{:#x}", transfer.topic0()),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_topics_unique_per_contract() {
        for contract in Contract::ALL {
            let topics: HashSet<H256> = contract.events().iter().map(|s| s.topic0()).collect();
            assert_eq!(topics.len(), contract.events().len(), "{}", contract);
        }
    }

    #[test]
    fn test_shared_entity_layout() {
        let registry = find(Contract::CarRegistry, "OwnershipTransferred").unwrap();
        let nft = find(Contract::ZeroNft, "OwnershipTransferred").unwrap();
        assert_eq!(registry.entity, nft.entity);
        assert_eq!(registry.params, nft.params);

        assert_eq!(entity_types().len(), 46);
    }

    #[test]
    fn test_only_brand_nft_minted_coerces() {
        let coerced: Vec<(&str, &str)> = all()
            .flat_map(|s| {
                s.params
                    .iter()
                    .filter(|p| p.transform == FieldTransform::ToString)
                    .map(move |p| (s.name, p.name))
            })
            .collect();
        assert_eq!(coerced, vec![("BrandNFTMinted", "brandName")]);
    }

    #[test]
    fn test_entity_field_lookup() {
        let amount = entity_field("BidPlaced", "amount").unwrap();
        assert!(amount.kind.is_numeric());
        assert!(entity_field("BidPlaced", "missing").is_none());
        assert!(entity_field("Missing", "amount").is_none());
    }
}
