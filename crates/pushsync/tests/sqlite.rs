//! Syncer over a SQLite chunk store.

use std::sync::Arc;
use std::time::Duration;

use pushsync::core::{CustodyProver, Keypair};
use pushsync::protocol::loopback::LoopbackPubSub;
use pushsync::store::SqliteStore;
use pushsync::{
    Chunk, ChunkStore, MemorySyncQueue, NodeAddress, PutResult, Syncer, SyncerConfig,
};

#[tokio::test]
async fn test_syncer_with_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chunks.db");
    let chunks: Vec<Chunk> = (0..10u8)
        .map(|i| Chunk::new(vec![i; 100 + i as usize]))
        .collect();

    {
        let prover = Arc::new(CustodyProver::new(Keypair::generate()));
        let pubsub = Arc::new(LoopbackPubSub::with_peer(prover.peer_id()));
        let queue = Arc::new(MemorySyncQueue::new());
        let syncer = Syncer::new(
            SyncerConfig::default(),
            NodeAddress::random(),
            Arc::new(SqliteStore::open(&path).unwrap()),
            prover,
            pubsub,
            queue.clone(),
        )
        .await
        .unwrap();

        for chunk in &chunks {
            assert_eq!(syncer.put(chunk).await.unwrap(), PutResult::Stored);
        }

        tokio::time::timeout(Duration::from_secs(10), async {
            while queue.synced_count().unwrap() < chunks.len() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("all chunks should be synced");

        syncer.shutdown().await;
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.count().await.unwrap(), chunks.len());
    for chunk in &chunks {
        assert_eq!(store.get(chunk.address()).await.unwrap().as_ref(), Some(chunk));
    }
}
