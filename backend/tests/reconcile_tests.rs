//! Stock reconciliation tests

mod common;

use common::Harness;
use shared::{MovementContext, MovementType};
use stock_ledger_backend::store::{DocumentStore, WriteBatch, WriteOp};

#[tokio::test]
async fn test_consistent_ledger_has_no_discrepancies() {
    let h = Harness::new();
    let a = h.product("Onde-onde", 12).await;
    let b = h.material("Wijen", 30).await;
    h.ledger
        .apply_stock_delta(a.item_ref(), -5, MovementType::Sale, None, MovementContext::default())
        .await
        .unwrap();
    h.ledger
        .apply_stock_delta(b.item_ref(), 8, MovementType::In, None, MovementContext::default())
        .await
        .unwrap();

    let report = h.ledger.reconcile(false).await.unwrap();
    assert_eq!(report.items_checked, 2);
    assert!(report.discrepancies.is_empty());
    assert!(!report.repaired);
}

#[tokio::test]
async fn test_drifted_stock_is_reported_and_repaired() {
    let h = Harness::new();
    let a = h.product("Klepon", 10).await;
    h.ledger
        .apply_stock_delta(a.item_ref(), -4, MovementType::Sale, None, MovementContext::default())
        .await
        .unwrap();

    // Simulate a lost update overwriting the cached stock
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::SetStock {
        item: a.item_ref(),
        stock: 9,
    });
    h.store.commit(&batch).await.unwrap();

    let report = h.ledger.reconcile(false).await.unwrap();
    assert_eq!(report.discrepancies.len(), 1);
    assert_eq!(report.discrepancies[0].item, a.item_ref());
    assert_eq!(report.discrepancies[0].recorded, 9);
    assert_eq!(report.discrepancies[0].expected, 6);
    assert_eq!(h.stock(a.item_ref()).await, 9);

    let repaired = h.ledger.reconcile(true).await.unwrap();
    assert!(repaired.repaired);
    assert_eq!(h.stock(a.item_ref()).await, 6);
    h.assert_conserved().await;
}
