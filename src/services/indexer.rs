//! Indexer Service
//!
//! Drives events from a `ChainSource` through the mapping layer into the
//! entity store.
//!
//! ```text
//!   checkpoint+1            head - confirmations
//!        │                          │
//!        ▼                          ▼
//!   ─────[ from ......... to ]──────┤
//!         └─ block_range ─┘
//!
//!   per block: map every event → save_batch(entities, checkpoint = block)
//!   end of range: save_batch([], checkpoint = to)
//! ```
//!
//! Blocks are processed in ascending order and events inside a block in
//! ascending log index; anything else is refused. One block is one store
//! transaction, so a failure leaves the checkpoint on the previous block and
//! the range is retried on the next tick.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::config::IndexerConfig;
use crate::error::IndexError;
use crate::indexing::{handle_event, Entity, RawEvent};
use crate::services::ChainSource;
use crate::store::{BatchOutcome, EntityStore};

/// 한 번의 sync 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    pub from: u64,
    pub to: u64,
    /// 처리 가능한 최신 블록 (head - confirmations)
    pub target: u64,
    pub events: usize,
    pub inserted: usize,
}

impl SyncProgress {
    pub fn caught_up(&self) -> bool {
        self.to >= self.target
    }
}

/// 인덱서 태스크 생존 여부
///
/// `run`이 도는 동안만 `true`. 패닉으로 끝나도 `false`로 돌아간다.
#[derive(Debug, Default)]
pub struct IndexerLiveness {
    running: AtomicBool,
}

impl IndexerLiveness {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

struct RunningGuard(Arc<IndexerLiveness>);

impl RunningGuard {
    fn new(liveness: Arc<IndexerLiveness>) -> Self {
        liveness.running.store(true, Ordering::Release);
        Self(liveness)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
        if std::thread::panicking() {
            tracing::error!("Indexer task panicked; entities are no longer being indexed");
        }
    }
}

pub struct Indexer {
    store: Arc<dyn EntityStore>,
    config: IndexerConfig,
    liveness: Arc<IndexerLiveness>,
}

impl Indexer {
    pub fn new(store: Arc<dyn EntityStore>, config: IndexerConfig) -> Self {
        Self {
            store,
            config,
            liveness: Arc::new(IndexerLiveness::default()),
        }
    }

    /// health 응답에서 공유할 생존 상태 핸들
    pub fn liveness(&self) -> Arc<IndexerLiveness> {
        self.liveness.clone()
    }

    /// 한 블록의 이벤트를 엔티티로 변환 (저장 없음)
    ///
    /// 다른 블록의 이벤트나 log index 역순이 섞여 있으면 실패한다.
    pub fn map_block(block: u64, events: &[RawEvent]) -> Result<Vec<Entity>, IndexError> {
        let mut prev: Option<u64> = None;
        events
            .iter()
            .map(|event| {
                if event.block.number != block {
                    return Err(IndexError::BlockMismatch {
                        expected: block,
                        actual: event.block.number,
                    });
                }
                if let Some(prev_index) = prev {
                    if event.log_index <= prev_index {
                        return Err(IndexError::OutOfOrder {
                            block,
                            log_index: event.log_index,
                            prev_block: block,
                            prev_log_index: prev_index,
                        });
                    }
                }
                prev = Some(event.log_index);
                Ok(handle_event(event)?)
            })
            .collect()
    }

    /// 한 블록을 원자적으로 저장하고 체크포인트를 그 블록으로 옮긴다.
    pub async fn process_block(
        &self,
        block: u64,
        events: &[RawEvent],
    ) -> Result<BatchOutcome, IndexError> {
        let entities = Self::map_block(block, events)?;
        let outcome = self.store.save_batch(&entities, Some(block)).await?;

        if outcome.unchanged > 0 {
            tracing::debug!(
                "Block {}: {} entities already stored (reprocessed)",
                block,
                outcome.unchanged
            );
        }
        Ok(outcome)
    }

    /// 다음 블록 범위 하나를 처리
    ///
    /// 처리할 블록이 없으면 `None`.
    pub async fn sync_once(
        &self,
        source: &dyn ChainSource,
    ) -> Result<Option<SyncProgress>, IndexError> {
        let head = source.latest_block().await?;
        let target = head.saturating_sub(self.config.confirmations);

        let from = match self.store.checkpoint().await? {
            Some(checkpoint) => checkpoint.saturating_add(1).max(self.config.start_block),
            None => self.config.start_block,
        };
        if from > target {
            return Ok(None);
        }
        let to = target.min(from.saturating_add(self.config.block_range.saturating_sub(1)));

        let events = source.fetch_events(from, to).await?;
        verify_order(&events)?;

        let mut by_block: BTreeMap<u64, Vec<RawEvent>> = BTreeMap::new();
        for event in events {
            if event.block.number < from || event.block.number > to {
                return Err(IndexError::Source(format!(
                    "event from block {} outside requested range {}..={}",
                    event.block.number, from, to
                )));
            }
            by_block.entry(event.block.number).or_default().push(event);
        }

        let mut progress = SyncProgress {
            from,
            to,
            target,
            events: 0,
            inserted: 0,
        };
        for (block, events) in &by_block {
            let outcome = self.process_block(*block, events).await?;
            progress.events += events.len();
            progress.inserted += outcome.inserted;
        }

        // 이벤트 없는 블록까지 포함해 범위 끝으로 전진
        self.store.save_batch(&[], Some(to)).await?;

        tracing::info!(
            "Indexed blocks {}..={} ({} events, {} new entities)",
            from,
            to,
            progress.events,
            progress.inserted
        );
        Ok(Some(progress))
    }

    /// 폴링 루프
    ///
    /// tick마다 head를 따라잡을 때까지 `sync_once`를 반복한다. 에러는 로그만
    /// 남기고 다음 tick에 같은 범위를 재시도한다. 종료 신호는 범위 사이마다
    /// 확인하며, 진행 중인 범위는 버려지고 마지막으로 커밋된 블록부터 재개된다.
    pub async fn run(self, source: Arc<dyn ChainSource>, mut shutdown: watch::Receiver<bool>) {
        let _running = RunningGuard::new(self.liveness.clone());
        tracing::info!(
            "Indexer started (start block {}, range {}, confirmations {})",
            self.config.start_block,
            self.config.block_range,
            self.config.confirmations
        );

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        'poll: loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => break,
            }

            loop {
                if *shutdown.borrow() {
                    break 'poll;
                }
                let result = tokio::select! {
                    result = self.sync_once(source.as_ref()) => result,
                    _ = shutdown.changed() => break 'poll,
                };
                match result {
                    Ok(Some(progress)) if !progress.caught_up() => continue,
                    Ok(_) => break,
                    Err(e) => {
                        tracing::error!("Indexing failed, retrying next tick: {}", e);
                        break;
                    }
                }
            }
        }

        tracing::info!("Indexer stopped");
    }
}

fn verify_order(events: &[RawEvent]) -> Result<(), IndexError> {
    for pair in events.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.position() <= prev.position() {
            return Err(IndexError::OutOfOrder {
                block: next.block.number,
                log_index: next.log_index,
                prev_block: prev.block.number,
                prev_log_index: prev.log_index,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::indexing::fixtures::*;
    use crate::schema::Contract;
    use crate::store::{EntityQuery, MemoryStore, OrderDirection, OrderKey};
    use async_trait::async_trait;
    use ethers::abi::Token;
    use std::time::Duration;

    const ALICE: &str = "0x90cba2bbb19ecc291a12066fd8329d65fa1f1947";
    const BOB: &str = "0x89205a3a3b2a69de6dbf7f01ed13b2108b2c43e7";

    struct MockChain {
        head: u64,
        events: Vec<RawEvent>,
    }

    #[async_trait]
    impl ChainSource for MockChain {
        async fn latest_block(&self) -> Result<u64, IndexError> {
            Ok(self.head)
        }

        async fn fetch_events(&self, from: u64, to: u64) -> Result<Vec<RawEvent>, IndexError> {
            Ok(self
                .events
                .iter()
                .filter(|e| (from..=to).contains(&e.block.number))
                .cloned()
                .collect())
        }
    }

    /// head가 아주 멀고 범위 조회마다 지연이 있는 체인
    struct SlowChain {
        head: u64,
        delay: Duration,
    }

    #[async_trait]
    impl ChainSource for SlowChain {
        async fn latest_block(&self) -> Result<u64, IndexError> {
            Ok(self.head)
        }

        async fn fetch_events(&self, _from: u64, _to: u64) -> Result<Vec<RawEvent>, IndexError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![])
        }
    }

    struct PanickingChain;

    #[async_trait]
    impl ChainSource for PanickingChain {
        async fn latest_block(&self) -> Result<u64, IndexError> {
            panic!("rpc client poisoned");
        }

        async fn fetch_events(&self, _from: u64, _to: u64) -> Result<Vec<RawEvent>, IndexError> {
            Ok(vec![])
        }
    }

    fn config() -> IndexerConfig {
        IndexerConfig {
            enabled: true,
            start_block: 1,
            block_range: 10,
            confirmations: 0,
            poll_interval: Duration::from_millis(10),
        }
    }

    fn at_block(mut event: RawEvent, block: u64) -> RawEvent {
        event.block.number = block;
        event
    }

    fn token_locked(token_id: u64, locked: bool, block: u64, log_index: u64) -> RawEvent {
        let mut event = mock_event(
            Contract::ZeroNft,
            "TokenLocked",
            vec![("tokenId", uint(token_id)), ("locked", Token::Bool(locked))],
        );
        event.block.number = block;
        event.transaction_hash = vec![block as u8; 32].into();
        event.log_index = log_index;
        event
    }

    #[tokio::test]
    async fn test_two_bids_same_transaction() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(store.clone(), config());

        let events = vec![bid_placed(1, ALICE, 100, 0), bid_placed(1, BOB, 250, 1)];
        let outcome = indexer.process_block(1, &events).await.unwrap();
        assert_eq!(outcome.inserted, 2);

        let query = EntityQuery::new("BidPlaced").order_by(
            OrderKey::parse("BidPlaced", "amount").unwrap(),
            OrderDirection::Desc,
        );
        let leaderboard = store.query(&query).await.unwrap();
        assert_eq!(leaderboard.len(), 2);
        assert_eq!(leaderboard[0].id, format!("{}-2", MOCK_TX_HASH));
        assert_eq!(leaderboard[0].field_text("bidder").as_deref(), Some(BOB));
        assert_eq!(leaderboard[1].id, format!("{}-1", MOCK_TX_HASH));
        assert_eq!(store.checkpoint().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_out_of_order_refused() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(store.clone(), config());

        let events = vec![bid_placed(1, ALICE, 100, 1), bid_placed(1, BOB, 250, 0)];
        let err = indexer.process_block(1, &events).await.unwrap_err();
        assert!(matches!(err, IndexError::OutOfOrder { log_index: 0, prev_log_index: 1, .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_wrong_block_refused() {
        let indexer = Indexer::new(Arc::new(MemoryStore::new()), config());
        let events = vec![at_block(bid_placed(1, ALICE, 100, 0), 2)];
        assert!(matches!(
            indexer.process_block(1, &events).await,
            Err(IndexError::BlockMismatch { expected: 1, actual: 2 })
        ));
    }

    #[tokio::test]
    async fn test_decode_failure_rejects_whole_block() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(store.clone(), config());

        let mut bad = mock_event(
            Contract::Auction,
            "ThresholdReached",
            vec![("auctionId", string("not a number"))],
        );
        bad.log_index = 1;
        let events = vec![bid_placed(1, ALICE, 100, 0), bad];

        let err = indexer.process_block(1, &events).await.unwrap_err();
        assert!(matches!(err, IndexError::Decode(DecodeError::ParamType { .. })));
        assert!(store.is_empty().await);
        assert_eq!(store.checkpoint().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_locked_latest_state() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(store.clone(), config());

        indexer.process_block(3, &[token_locked(5, true, 3, 0)]).await.unwrap();
        indexer
            .process_block(8, &[token_locked(9, true, 8, 0), token_locked(5, false, 8, 4)])
            .await
            .unwrap();

        // 현재 상태 = 같은 tokenId 중 체인 순서상 마지막
        let query = EntityQuery::new("TokenLocked")
            .filter(crate::store::FieldFilter::parse("TokenLocked", "tokenId", "5").unwrap())
            .order_by(OrderKey::Chain, OrderDirection::Desc)
            .first(1);
        let latest = store.query(&query).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].field_text("locked").as_deref(), Some("false"));
        assert_eq!(latest[0].block_number, 8);
    }

    #[tokio::test]
    async fn test_sync_once_advances_checkpoint() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(store.clone(), config());
        let chain = MockChain {
            head: 25,
            events: vec![
                at_block(bid_placed(1, ALICE, 100, 0), 3),
                at_block(bid_placed(1, BOB, 250, 1), 3),
                token_locked(5, true, 14, 0),
            ],
        };

        let first = indexer.sync_once(&chain).await.unwrap().unwrap();
        assert_eq!((first.from, first.to), (1, 10));
        assert_eq!(first.events, 2);
        assert!(!first.caught_up());
        assert_eq!(store.checkpoint().await.unwrap(), Some(10));

        let second = indexer.sync_once(&chain).await.unwrap().unwrap();
        assert_eq!((second.from, second.to), (11, 20));
        assert_eq!(second.inserted, 1);

        let third = indexer.sync_once(&chain).await.unwrap().unwrap();
        assert_eq!((third.from, third.to), (21, 25));
        assert!(third.caught_up());

        assert!(indexer.sync_once(&chain).await.unwrap().is_none());
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_sync_respects_confirmations() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(
            store.clone(),
            IndexerConfig {
                confirmations: 5,
                ..config()
            },
        );
        let chain = MockChain {
            head: 8,
            events: vec![],
        };

        let progress = indexer.sync_once(&chain).await.unwrap().unwrap();
        assert_eq!(progress.to, 3);
        assert_eq!(store.checkpoint().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_reprocessing_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(store.clone(), config());
        let events = vec![bid_placed(1, ALICE, 100, 0)];

        indexer.process_block(1, &events).await.unwrap();
        let again = indexer.process_block(1, &events).await.unwrap();
        assert_eq!(again, BatchOutcome { inserted: 0, unchanged: 1 });
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(store.clone(), config());
        let chain: Arc<dyn ChainSource> = Arc::new(MockChain {
            head: 3,
            events: vec![at_block(bid_placed(1, ALICE, 100, 0), 2)],
        });

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(indexer.run(chain, rx));

        for _ in 0..100 {
            if store.checkpoint().await.unwrap() == Some(3) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.checkpoint().await.unwrap(), Some(3));

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_with_unbounded_range() {
        let store = Arc::new(MemoryStore::new());
        store.save_batch(&[], Some(5)).await.unwrap();
        let indexer = Indexer::new(
            store.clone(),
            IndexerConfig {
                block_range: u64::MAX,
                ..config()
            },
        );
        let chain = MockChain {
            head: 100,
            events: vec![token_locked(5, true, 42, 0)],
        };

        let progress = indexer.sync_once(&chain).await.unwrap().unwrap();
        assert_eq!((progress.from, progress.to), (6, 100));
        assert!(progress.caught_up());
        assert_eq!(progress.inserted, 1);
        assert_eq!(store.checkpoint().await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn test_shutdown_during_catch_up() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(
            store.clone(),
            IndexerConfig {
                block_range: 1,
                ..config()
            },
        );
        let chain: Arc<dyn ChainSource> = Arc::new(SlowChain {
            head: 10_000_000,
            delay: Duration::from_millis(5),
        });

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(indexer.run(chain, rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let stopped = tokio::time::timeout(Duration::from_secs(3), handle).await;
        assert!(stopped.is_ok(), "indexer kept catching up after shutdown");

        let checkpoint = store.checkpoint().await.unwrap().unwrap_or(0);
        assert!(checkpoint < 10_000_000);
    }

    #[tokio::test]
    async fn test_liveness_follows_run() {
        let indexer = Indexer::new(Arc::new(MemoryStore::new()), config());
        let liveness = indexer.liveness();
        assert!(!liveness.is_running());

        let chain: Arc<dyn ChainSource> = Arc::new(MockChain {
            head: 3,
            events: vec![],
        });
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(indexer.run(chain, rx));

        for _ in 0..100 {
            if liveness.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(liveness.is_running());

        tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(!liveness.is_running());
    }

    #[tokio::test]
    async fn test_liveness_cleared_on_panic() {
        let indexer = Indexer::new(Arc::new(MemoryStore::new()), config());
        let liveness = indexer.liveness();

        let (_tx, rx) = watch::channel(false);
        let err = tokio::spawn(indexer.run(Arc::new(PanickingChain), rx))
            .await
            .unwrap_err();
        assert!(err.is_panic());
        assert!(!liveness.is_running());
    }
}
