#![cfg(feature = "redis")]

//! Smoke test against a live Redis. Run with:
//! `PJUU_STORE__URL=redis://127.0.0.1:6379/15 cargo test -p storage-adapters --features redis -- --ignored`

use configs::Settings;
use domains::ports::{KvStore, StoreWrite};
use storage_adapters::RedisKvStore;

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn port_primitives_round_trip() {
    let settings = Settings::load().expect("settings load");
    let store = RedisKvStore::connect(&settings.store).expect("pool");

    let key = format!("smoke:{}", std::process::id());
    store.remove(&key).await.unwrap();

    // Counter
    let first = store.incr(&key).await.unwrap();
    assert_eq!(store.incr(&key).await.unwrap(), first + 1);
    store.remove(&key).await.unwrap();

    // Sorted set add-if-absent keeps the first score.
    let zkey = format!("{key}:z");
    assert!(store.sorted_add_nx(&zkey, "7", 1).await.unwrap());
    assert!(!store.sorted_add_nx(&zkey, "7", 3).await.unwrap());
    assert_eq!(store.sorted_score(&zkey, "7").await.unwrap(), Some(1));
    store.remove(&zkey).await.unwrap();

    // Pipelined batch
    let lkey = format!("{key}:l");
    store
        .run_batch(vec![
            StoreWrite::ListPrepend {
                key: lkey.clone(),
                value: "b".into(),
            },
            StoreWrite::ListPrepend {
                key: lkey.clone(),
                value: "a".into(),
            },
            StoreWrite::ListTrim {
                key: lkey.clone(),
                start: 0,
                stop: 0,
            },
        ])
        .await
        .unwrap();
    assert_eq!(store.list_range(&lkey, 0, -1).await.unwrap(), vec!["a"]);
    store.remove(&lkey).await.unwrap();
}
