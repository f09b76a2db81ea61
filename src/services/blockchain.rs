//! Blockchain Service
//!
//! Chain access for the indexer.
//!
//! # Features
//! - `eth_getLogs` over a block range, filtered by configured contract addresses
//! - Log → `RawEvent` routing by `(contract address, topic0)`
//! - Block timestamp lookup with a per-block cache

use std::collections::{BTreeSet, HashMap};

use anyhow::Context;
use async_trait::async_trait;
use ethers::abi::{Event, RawLog};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, Filter, Log, H256, U256};
use tokio::sync::RwLock;

use crate::error::{DecodeError, IndexError};
use crate::indexing::{BlockContext, RawEvent};
use crate::schema::{Contract, EventSchema};

/// 블록체인 네트워크 설정
#[derive(Debug, Clone)]
pub struct BlockchainConfig {
    /// RPC URL
    pub rpc_url: String,
    /// 인덱싱 대상 컨트랙트 주소
    pub contracts: Vec<(Contract, Address)>,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            contracts: Vec::new(),
        }
    }
}

/// 인덱서가 읽는 체인 인터페이스
///
/// `fetch_events`는 `(block, log_index)` 오름차순으로 정렬된 이벤트를 돌려준다.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn latest_block(&self) -> Result<u64, IndexError>;

    async fn fetch_events(&self, from: u64, to: u64) -> Result<Vec<RawEvent>, IndexError>;
}

// ============ Log Routing ============

/// `(address, topic0)` → 스키마 라우팅 테이블
pub struct LogRouter {
    contracts: HashMap<Address, Contract>,
    routes: HashMap<(Contract, H256), (&'static EventSchema, Event)>,
}

impl LogRouter {
    pub fn new(contracts: &[(Contract, Address)]) -> Self {
        let routes = contracts
            .iter()
            .flat_map(|(contract, _)| contract.events().iter())
            .map(|schema| ((schema.contract, schema.topic0()), (schema, schema.abi_event())))
            .collect();

        Self {
            contracts: contracts.iter().map(|(c, a)| (*a, *c)).collect(),
            routes,
        }
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.contracts.keys().copied().collect()
    }

    /// 로그 한 건을 `RawEvent`로 변환
    ///
    /// 대상이 아닌 로그(모르는 주소/topic, reorg로 제거된 로그)는 `None`.
    pub fn decode(&self, log: &Log, timestamp: u64) -> Result<Option<RawEvent>, IndexError> {
        if log.removed == Some(true) {
            return Ok(None);
        }
        let Some(contract) = self.contracts.get(&log.address).copied() else {
            return Ok(None);
        };
        let Some(topic0) = log.topics.first() else {
            return Ok(None);
        };
        let Some((schema, event)) = self.routes.get(&(contract, *topic0)) else {
            tracing::debug!("Skipping unknown topic {:?} from {}", topic0, contract);
            return Ok(None);
        };

        let parsed = event
            .parse_log(RawLog {
                topics: log.topics.clone(),
                data: log.data.to_vec(),
            })
            .map_err(|e| DecodeError::Abi {
                event: schema.name,
                reason: e.to_string(),
            })?;

        let block = log
            .block_number
            .ok_or_else(|| IndexError::Source("log without block number".to_string()))?
            .as_u64();
        let transaction_hash = log
            .transaction_hash
            .ok_or_else(|| IndexError::Source("log without transaction hash".to_string()))?;
        let log_index = log
            .log_index
            .ok_or_else(|| IndexError::Source("log without log index".to_string()))
            .and_then(|i| {
                u64::try_from(i).map_err(|_| IndexError::Source(format!("log index {} out of range", i)))
            })?;

        Ok(Some(RawEvent {
            contract,
            event: schema.name.to_string(),
            block: BlockContext {
                number: block,
                timestamp,
            },
            transaction_hash: transaction_hash.as_bytes().to_vec().into(),
            log_index,
            params: parsed.params,
        }))
    }
}

// ============ Service ============

/// Blockchain Service
///
/// # Example
/// ```ignore
/// let service = BlockchainService::new(config)?;
/// let head = service.latest_block().await?;
/// let events = service.fetch_events(head - 10, head).await?;
/// ```
pub struct BlockchainService {
    provider: Provider<Http>,
    router: LogRouter,
    /// 블록 번호 → timestamp
    timestamps: RwLock<HashMap<u64, u64>>,
}

impl BlockchainService {
    /// 새 BlockchainService 생성
    pub fn new(config: BlockchainConfig) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .with_context(|| format!("Invalid ETH_RPC_URL {}", config.rpc_url))?;

        Ok(Self {
            provider,
            router: LogRouter::new(&config.contracts),
            timestamps: RwLock::new(HashMap::new()),
        })
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64, IndexError> {
        // 캐시 확인
        if let Some(ts) = self.timestamps.read().await.get(&number) {
            return Ok(*ts);
        }

        let block = self
            .provider
            .get_block(number)
            .await
            .map_err(|e| IndexError::Source(e.to_string()))?
            .ok_or_else(|| IndexError::Source(format!("block {} not found", number)))?;
        let ts = timestamp_secs(block.timestamp)?;

        self.timestamps.write().await.insert(number, ts);
        Ok(ts)
    }
}

fn timestamp_secs(ts: U256) -> Result<u64, IndexError> {
    u64::try_from(ts).map_err(|_| IndexError::Source(format!("block timestamp {} out of range", ts)))
}

#[async_trait]
impl ChainSource for BlockchainService {
    async fn latest_block(&self) -> Result<u64, IndexError> {
        self.provider
            .get_block_number()
            .await
            .map(|n| n.as_u64())
            .map_err(|e| IndexError::Source(e.to_string()))
    }

    async fn fetch_events(&self, from: u64, to: u64) -> Result<Vec<RawEvent>, IndexError> {
        let addresses = self.router.addresses();
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let filter = Filter::new().address(addresses).from_block(from).to_block(to);
        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| IndexError::Source(e.to_string()))?;

        // 지난 범위 캐시 정리
        self.timestamps.write().await.retain(|block, _| *block >= from);

        let blocks: BTreeSet<u64> = logs
            .iter()
            .filter_map(|log| log.block_number.map(|n| n.as_u64()))
            .collect();
        let mut timestamps = HashMap::with_capacity(blocks.len());
        for block in blocks {
            timestamps.insert(block, self.block_timestamp(block).await?);
        }

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            let block = log.block_number.map(|n| n.as_u64()).unwrap_or_default();
            let ts = timestamps.get(&block).copied().unwrap_or_default();
            if let Some(event) = self.router.decode(log, ts)? {
                events.push(event);
            }
        }
        events.sort_by_key(RawEvent::position);

        tracing::debug!("Fetched {} events from blocks {}..={}", events.len(), from, to);
        Ok(events)
    }
}
