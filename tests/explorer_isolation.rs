//! Explorer reads regenerate their records and leave the wallet alone

use cosmos_demo::mock::MockChainApi;
use cosmos_demo::storage::{ACCOUNTS, LAST_CONNECTED_ADDRESS, WALLET_CONNECTED};
use cosmos_demo::{Explorer, KeyValueStore, MemoryStore, MockExplorer, WalletController};
use std::sync::Arc;

fn snapshot(store: &MemoryStore) -> Vec<Option<String>> {
    [ACCOUNTS, LAST_CONNECTED_ADDRESS, WALLET_CONNECTED]
        .iter()
        .map(|key| store.get(key).unwrap())
        .collect()
}

#[tokio::test]
async fn test_regenerated_blocks_leave_wallet_state_untouched() {
    let api = MockChainApi::default();
    let store = Arc::new(MemoryStore::new());
    let mut wallet = WalletController::new(api.clone(), Arc::clone(&store)).unwrap();
    wallet.create_account("alice").await.unwrap();
    wallet.connect_wallet(None).await.unwrap();
    wallet
        .send_transaction("cosmos1bob", "25", None, None)
        .await
        .unwrap();

    let stored_before = snapshot(&store);
    let wallet_before = wallet.wallet().cloned().unwrap();
    let accounts_before = wallet.accounts().list();
    let height_before = api.ledger().height();

    let explorer = MockExplorer::with_seed(7);
    let first = explorer.block(42).await.unwrap();
    let second = explorer.block(42).await.unwrap();
    assert_eq!(first.block.height, 42);
    assert_eq!(second.block.height, 42);
    assert_ne!(first.block.hash, second.block.hash);

    explorer.latest_blocks(10).await.unwrap();
    explorer.recent_transactions(10).await.unwrap();
    explorer.chain_status().await.unwrap();

    assert_eq!(snapshot(&store), stored_before);
    assert_eq!(wallet.wallet().cloned().unwrap(), wallet_before);
    assert_eq!(wallet.accounts().list(), accounts_before);
    assert_eq!(api.ledger().height(), height_before);
    assert!(wallet.is_connected());
}
