//! ProofSync 컨트랙트 이벤트 (CCIP 크로스체인 proof 동기화)

use super::{Contract, EventSchema, ParamKind, ParamSpec, ADDRESS, BYTES32, STRING};

pub(super) const EVENTS: &[EventSchema] = &[
    EventSchema {
        contract: Contract::ProofSync,
        name: "ContractLockedEvent",
        entity: "ContractLockedEvent",
        params: &[ParamSpec::new("reason", STRING)],
    },
    EventSchema {
        contract: Contract::ProofSync,
        name: "ContractUnlocked",
        entity: "ContractUnlocked",
        params: &[],
    },
    EventSchema {
        contract: Contract::ProofSync,
        name: "ProofSubmitted",
        entity: "ProofSubmitted",
        params: &[
            ParamSpec::new("submitter", ADDRESS).indexed(),
            ParamSpec::new("ipfsHash", STRING),
            ParamSpec::new("method", BYTES32),
        ],
    },
    EventSchema {
        contract: Contract::ProofSync,
        name: "ProofSynced",
        entity: "ProofSynced",
        params: &[
            ParamSpec::new("ipfsHash", STRING),
            // CCIP chain selector
            ParamSpec::new("chains", ParamKind::Array(&ParamKind::Uint(64))),
            ParamSpec::new("messageIds", ParamKind::Array(&BYTES32)),
        ],
    },
    EventSchema {
        contract: Contract::ProofSync,
        name: "SyncPermissionGranted",
        entity: "SyncPermissionGranted",
        params: &[ParamSpec::new("syncer", ADDRESS).indexed()],
    },
    EventSchema {
        contract: Contract::ProofSync,
        name: "SyncPermissionRevoked",
        entity: "SyncPermissionRevoked",
        params: &[ParamSpec::new("syncer", ADDRESS).indexed()],
    },
];
