//! ZeroNFT 컨트랙트 이벤트 (ERC-721 + 브랜드 민팅/잠금/수수료)

use super::{Contract, EventSchema, ParamKind, ParamSpec, ADDRESS, BOOL, STRING, UINT256};

pub(super) const EVENTS: &[EventSchema] = &[
    EventSchema {
        contract: Contract::ZeroNft,
        name: "Approval",
        entity: "Approval",
        params: &[
            ParamSpec::new("owner", ADDRESS).indexed(),
            ParamSpec::new("approved", ADDRESS).indexed(),
            ParamSpec::new("tokenId", UINT256).indexed(),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "ApprovalForAll",
        entity: "ApprovalForAll",
        params: &[
            ParamSpec::new("owner", ADDRESS).indexed(),
            ParamSpec::new("operator", ADDRESS).indexed(),
            ParamSpec::new("approved", BOOL),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "BaseURIUpdated",
        entity: "BaseURIUpdated",
        params: &[ParamSpec::new("newBaseURI", STRING)],
    },
    // ERC-4906
    EventSchema {
        contract: Contract::ZeroNft,
        name: "BatchMetadataUpdate",
        entity: "BatchMetadataUpdate",
        params: &[
            ParamSpec::new("_fromTokenId", UINT256),
            ParamSpec::new("_toTokenId", UINT256),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "BatchTransfer",
        entity: "BatchTransfer",
        params: &[
            ParamSpec::new("from", ADDRESS).indexed(),
            ParamSpec::new("to", ADDRESS).indexed(),
            ParamSpec::new("tokenIds", ParamKind::Array(&UINT256)),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "BrandNFTMinted",
        entity: "BrandNFTMinted",
        params: &[
            // indexed string: topic에는 keccak 해시만 남는다
            ParamSpec::new("brandName", STRING)
                .indexed()
                .coerced_to_string(),
            ParamSpec::new("tokenId", UINT256).indexed(),
            ParamSpec::new("brandOwner", ADDRESS).indexed(),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "MetadataUpdate",
        entity: "MetadataUpdate",
        params: &[ParamSpec::new("_tokenId", UINT256)],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "NFTMinted",
        entity: "NFTMinted",
        params: &[
            ParamSpec::new("to", ADDRESS).indexed(),
            ParamSpec::new("tokenId", UINT256).indexed(),
            ParamSpec::new("brandName", STRING),
            ParamSpec::new("tokenURI", STRING),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "NFTVerified",
        entity: "NFTVerified",
        params: &[
            ParamSpec::new("tokenId", UINT256).indexed(),
            ParamSpec::new("verified", BOOL),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "OwnershipTransferred",
        entity: "OwnershipTransferred",
        params: super::OWNERSHIP_TRANSFERRED,
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "TokenLocked",
        entity: "TokenLocked",
        params: &[
            ParamSpec::new("tokenId", UINT256).indexed(),
            ParamSpec::new("locked", BOOL),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "Transfer",
        entity: "Transfer",
        params: &[
            ParamSpec::new("from", ADDRESS).indexed(),
            ParamSpec::new("to", ADDRESS).indexed(),
            ParamSpec::new("tokenId", UINT256).indexed(),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "TransferCooldownUpdated",
        entity: "TransferCooldownUpdated",
        params: &[ParamSpec::new("newCooldown", UINT256)],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "TransferFeeCollected",
        entity: "TransferFeeCollected",
        params: &[
            ParamSpec::new("tokenId", UINT256).indexed(),
            ParamSpec::new("feeAmount", UINT256),
        ],
    },
    EventSchema {
        contract: Contract::ZeroNft,
        name: "TransferFeeUpdated",
        entity: "TransferFeeUpdated",
        params: &[ParamSpec::new("newFee", UINT256)],
    },
];
