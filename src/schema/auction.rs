//! Auction 컨트랙트 이벤트

use super::{Contract, EventSchema, ParamSpec, ADDRESS, BOOL, STRING, UINT256};

pub(super) const EVENTS: &[EventSchema] = &[
    EventSchema {
        contract: Contract::Auction,
        name: "AuctionCreated",
        entity: "AuctionCreated",
        params: &[
            ParamSpec::new("auctionId", UINT256).indexed(),
            ParamSpec::new("brandName", STRING),
            ParamSpec::new("startTime", UINT256),
            ParamSpec::new("endTime", UINT256),
            ParamSpec::new("initialBid", UINT256),
            ParamSpec::new("bidThreshold", UINT256),
        ],
    },
    EventSchema {
        contract: Contract::Auction,
        name: "AuctionEnded",
        entity: "AuctionEnded",
        params: &[
            ParamSpec::new("auctionId", UINT256).indexed(),
            ParamSpec::new("winner", ADDRESS).indexed(),
            ParamSpec::new("winningBid", UINT256),
        ],
    },
    EventSchema {
        contract: Contract::Auction,
        name: "AuctionInfoUpdated",
        entity: "AuctionInfoUpdated",
        params: &[
            ParamSpec::new("auctionId", UINT256).indexed(),
            ParamSpec::new("newStartTime", UINT256),
            ParamSpec::new("newEndTime", UINT256),
            ParamSpec::new("newInitialBid", UINT256),
            ParamSpec::new("newBidThreshold", UINT256),
            ParamSpec::new("newBidToken", ADDRESS),
            ParamSpec::new("newNftTokenId", UINT256),
        ],
    },
    EventSchema {
        contract: Contract::Auction,
        name: "BidPlaced",
        entity: "BidPlaced",
        params: &[
            ParamSpec::new("auctionId", UINT256).indexed(),
            ParamSpec::new("bidder", ADDRESS).indexed(),
            ParamSpec::new("amount", UINT256),
            ParamSpec::new("staked", BOOL),
        ],
    },
    EventSchema {
        contract: Contract::Auction,
        name: "CollateralForfeited",
        entity: "CollateralForfeited",
        params: &[
            ParamSpec::new("auctionId", UINT256).indexed(),
            ParamSpec::new("forfeitedBidder", ADDRESS).indexed(),
            ParamSpec::new("amount", UINT256),
        ],
    },
    EventSchema {
        contract: Contract::Auction,
        name: "CollateralReturned",
        entity: "CollateralReturned",
        params: &[
            ParamSpec::new("auctionId", UINT256).indexed(),
            ParamSpec::new("bidder", ADDRESS).indexed(),
            ParamSpec::new("amount", UINT256),
        ],
    },
    EventSchema {
        contract: Contract::Auction,
        name: "StakesReturned",
        entity: "StakesReturned",
        params: &[ParamSpec::new("auctionId", UINT256).indexed()],
    },
    EventSchema {
        contract: Contract::Auction,
        name: "ThresholdReached",
        entity: "ThresholdReached",
        params: &[ParamSpec::new("auctionId", UINT256).indexed()],
    },
];
