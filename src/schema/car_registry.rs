//! CarRegistry 컨트랙트 이벤트 (브랜드 등록/스테이킹, 연동 컨트랙트 변경)

use super::{Contract, EventSchema, ParamSpec, ADDRESS, BYTES32, STRING};

const NEWP: &[ParamSpec] = &[ParamSpec::new("newp", ADDRESS)];

pub(super) const EVENTS: &[EventSchema] = &[
    EventSchema {
        contract: Contract::CarRegistry,
        name: "BrandActivated",
        entity: "BrandActivated",
        params: &[
            ParamSpec::new("brand", STRING),
            ParamSpec::new("state", STRING),
        ],
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "BrandRegistryRequested",
        entity: "BrandRegistryRequested",
        params: &[
            ParamSpec::new("brand", STRING),
            ParamSpec::new("requestId", BYTES32),
        ],
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "BrandStaked",
        entity: "BrandStaked",
        params: &[
            ParamSpec::new("brand", STRING),
            ParamSpec::new("staker", ADDRESS),
        ],
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "ChangedCCIP",
        entity: "ChangedCCIP",
        params: NEWP,
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "ChangedChainFunction",
        entity: "ChangedChainFunction",
        params: NEWP,
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "ChangedInitFunction",
        entity: "ChangedInitFunction",
        params: NEWP,
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "ChangedProfile",
        entity: "ChangedProfile",
        params: NEWP,
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "ChangedReputation",
        entity: "ChangedReputation",
        params: NEWP,
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "ChangedState",
        entity: "ChangedState",
        params: NEWP,
    },
    EventSchema {
        contract: Contract::CarRegistry,
        name: "OwnershipTransferred",
        entity: "OwnershipTransferred",
        params: super::OWNERSHIP_TRANSFERRED,
    },
];
