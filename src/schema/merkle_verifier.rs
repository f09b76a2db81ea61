//! MerkleVerifier 컨트랙트 이벤트

use super::{Contract, EventSchema, ParamSpec, ADDRESS, BYTES32, STRING};

pub(super) const EVENTS: &[EventSchema] = &[
    EventSchema {
        contract: Contract::MerkleVerifier,
        name: "AddedLeaf",
        entity: "AddedLeaf",
        params: &[
            ParamSpec::new("lastProof", STRING),
            ParamSpec::new("newLeaf", STRING),
        ],
    },
    EventSchema {
        contract: Contract::MerkleVerifier,
        name: "ChangedSyncer",
        entity: "ChangedSyncer",
        params: &[ParamSpec::new("syncer", ADDRESS)],
    },
    EventSchema {
        contract: Contract::MerkleVerifier,
        name: "SetRoot",
        entity: "SetRoot",
        params: &[
            ParamSpec::new("_brand", STRING),
            ParamSpec::new("owner", ADDRESS),
        ],
    },
    EventSchema {
        contract: Contract::MerkleVerifier,
        name: "leafAdded",
        entity: "leafAdded",
        params: &[ParamSpec::new("leaf", BYTES32)],
    },
    EventSchema {
        contract: Contract::MerkleVerifier,
        name: "leafRemoved",
        entity: "leafRemoved",
        params: &[ParamSpec::new("leaf", BYTES32)],
    },
];
