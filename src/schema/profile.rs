//! Profile 컨트랙트 이벤트

use super::{Contract, EventSchema, ParamSpec, ADDRESS, STRING};

pub(super) const EVENTS: &[EventSchema] = &[
    EventSchema {
        contract: Contract::Profile,
        name: "ChangedRegistry",
        entity: "ChangedRegistry",
        params: &[ParamSpec::new("newRegistry", ADDRESS)],
    },
    EventSchema {
        contract: Contract::Profile,
        name: "ProfileCreated",
        entity: "ProfileCreated",
        params: &[
            ParamSpec::new("_brand", STRING),
            ParamSpec::new("initiator", ADDRESS),
        ],
    },
    EventSchema {
        contract: Contract::Profile,
        name: "UpdatedState",
        entity: "UpdatedState",
        params: &[
            ParamSpec::new("_brand", STRING),
            ParamSpec::new("state", STRING),
        ],
    },
];
