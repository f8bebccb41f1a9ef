//! Purchase, return and finance tests

mod common;

use common::{day, Harness};
use rust_decimal::Decimal;
use shared::{DateRange, ItemKind, MovementType, PURCHASE_EXPENSE_CATEGORY};
use stock_ledger_backend::{
    services::finance::CashEntryInput,
    services::purchase::CreatePurchaseInput,
    services::stock_return::CreateReturnInput,
    services::{FinanceService, PurchaseService, ReturnService},
    AppError,
};

fn purchase_input(kind: ItemKind, item_id: uuid::Uuid, quantity: i64, price: i64) -> CreatePurchaseInput {
    CreatePurchaseInput {
        item_kind: kind,
        item_id,
        quantity,
        purchase_price: Decimal::from(price),
        supplier_id: Some("SUP-01".to_string()),
        supplier_name: Some("CV Sumber Rejeki".to_string()),
        note: None,
        date: day(5),
    }
}

#[tokio::test]
async fn test_purchase_adds_stock_and_one_expense() {
    let h = Harness::new();
    let material = h.material("Tepung Terigu", 4).await;
    let service = PurchaseService::new(h.ledger.clone());

    let purchase = service
        .create_purchase(purchase_input(ItemKind::RawMaterial, material.id, 25, 12_000))
        .await
        .unwrap()
        .value;

    assert_eq!(purchase.total_price, Decimal::from(300_000));
    assert_eq!(purchase.item_name, "Tepung Terigu");
    assert_eq!(h.stock(material.item_ref()).await, 29);

    let expenses = FinanceService::new(h.ledger.clone())
        .list_expenses()
        .await
        .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].amount, Decimal::from(300_000));
    assert_eq!(expenses[0].category, PURCHASE_EXPENSE_CATEGORY);
    assert_eq!(expenses[0].related_id, Some(purchase.id));

    let entries = h.movements(material.item_ref()).await;
    assert_eq!(entries[0].movement_type, MovementType::PurchaseIn);
    assert_eq!(entries[0].context.purchase_id, Some(purchase.id));
    assert_eq!(
        entries[0].context.supplier_name.as_deref(),
        Some("CV Sumber Rejeki")
    );
}

#[tokio::test]
async fn test_purchase_delete_is_symmetric() {
    let h = Harness::new();
    let product = h.product("Kecap Manis", 2).await;
    let service = PurchaseService::new(h.ledger.clone());

    let purchase = service
        .create_purchase(purchase_input(ItemKind::Product, product.id, 10, 9_000))
        .await
        .unwrap()
        .value;
    service.delete_purchase(purchase.id).await.unwrap();

    assert_eq!(h.stock(product.item_ref()).await, 2);
    assert!(FinanceService::new(h.ledger.clone())
        .list_expenses()
        .await
        .unwrap()
        .is_empty());
    assert!(matches!(
        service.get(purchase.id).await,
        Err(AppError::NotFound(_))
    ));

    let entries = h.movements(product.item_ref()).await;
    assert_eq!(entries[0].movement_type, MovementType::PurchaseRevert);
    assert_eq!(entries.iter().map(|m| m.quantity_change).sum::<i64>(), 0);
    h.assert_conserved().await;
}

#[tokio::test]
async fn test_purchase_delete_after_consumption_is_rejected() {
    let h = Harness::new();
    let product = h.product("Saus Tomat", 0).await;
    let service = PurchaseService::new(h.ledger.clone());

    let purchase = service
        .create_purchase(purchase_input(ItemKind::Product, product.id, 5, 7_000))
        .await
        .unwrap()
        .value;
    h.ledger
        .apply_stock_delta(
            product.item_ref(),
            -4,
            MovementType::Sale,
            None,
            Default::default(),
        )
        .await
        .unwrap();

    let err = service.delete_purchase(purchase.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientStock {
            available: 1,
            requested: 5,
            ..
        }
    ));
    assert!(service.get(purchase.id).await.is_ok());
    assert_eq!(
        FinanceService::new(h.ledger.clone())
            .list_expenses()
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_purchase_of_missing_item_fails() {
    let h = Harness::new();
    let service = PurchaseService::new(h.ledger.clone());

    let err = service
        .create_purchase(purchase_input(ItemKind::Product, uuid::Uuid::new_v4(), 1, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ItemNotFound(_)));
    assert!(h.ledger.list_movements().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purchase_with_log_down_is_degraded_but_committed() {
    let h = Harness::new();
    let material = h.material("Tepung Terigu", 4).await;
    let service = PurchaseService::new(h.ledger.clone());

    h.store.fail_movement_appends(true).await;
    let recorded = service
        .create_purchase(purchase_input(ItemKind::RawMaterial, material.id, 25, 12_000))
        .await
        .unwrap();

    assert!(recorded.is_degraded());
    assert_eq!(h.stock(material.item_ref()).await, 29);
    assert!(service.get(recorded.value.id).await.is_ok());
    assert_eq!(
        FinanceService::new(h.ledger.clone())
            .list_expenses()
            .await
            .unwrap()
            .len(),
        1
    );

    let gap = recorded.audit_gap.clone().unwrap();
    assert_eq!(gap.missing_movements.len(), 1);
    assert_eq!(gap.missing_movements[0].item_id, material.id);
    assert_eq!(gap.missing_movements[0].quantity_change, 25);
    assert_eq!(gap.missing_movements[0].movement_type, MovementType::PurchaseIn);
    assert_eq!(
        gap.missing_movements[0].context.purchase_id,
        Some(recorded.value.id)
    );

    // Repair must not roll the committed purchase back
    h.store.fail_movement_appends(false).await;
    let report = h.ledger.reconcile(true).await.unwrap();
    assert_eq!(report.backfilled, 1);
    assert!(report.discrepancies.is_empty());
    assert_eq!(h.stock(material.item_ref()).await, 29);
    h.assert_conserved().await;
}

#[tokio::test]
async fn test_oversized_purchase_is_rejected() {
    let h = Harness::new();
    let material = h.material("Gula Merah", 4).await;
    let service = PurchaseService::new(h.ledger.clone());

    let mut huge = purchase_input(ItemKind::RawMaterial, material.id, 1, 0);
    huge.quantity = i64::MAX;
    huge.purchase_price = Decimal::from(100_000_000_000i64);
    assert!(matches!(
        service.create_purchase(huge).await,
        Err(AppError::ValidationError(_))
    ));

    let mut overpriced = purchase_input(ItemKind::RawMaterial, material.id, 1, 0);
    overpriced.purchase_price = Decimal::MAX;
    assert!(matches!(
        service.create_purchase(overpriced).await,
        Err(AppError::Validation { .. })
    ));

    assert_eq!(h.stock(material.item_ref()).await, 4);
    assert!(h.ledger.list_movements().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_return_with_log_down_is_degraded_but_committed() {
    let h = Harness::new();
    let product = h.product("Kue Bawang", 3).await;
    let service = ReturnService::new(h.ledger.clone());

    h.store.fail_movement_appends(true).await;
    let recorded = service
        .create_return(CreateReturnInput {
            item_kind: ItemKind::Product,
            item_id: product.id,
            quantity: 2,
            date: day(12),
            note: None,
        })
        .await
        .unwrap();

    assert!(recorded.is_degraded());
    assert_eq!(h.stock(product.item_ref()).await, 5);
    let gap = recorded.audit_gap.unwrap();
    assert_eq!(gap.missing_movements.len(), 1);
    assert_eq!(gap.missing_movements[0].item_id, product.id);
    assert_eq!(gap.missing_movements[0].quantity_change, 2);
    assert_eq!(gap.missing_movements[0].movement_type, MovementType::ReturnIn);
    assert_eq!(
        gap.missing_movements[0].context.return_id,
        Some(recorded.value.id)
    );
    h.assert_conserved().await;
}

#[tokio::test]
async fn test_return_increments_stock() {
    let h = Harness::new();
    let product = h.product("Kue Bawang", 3).await;
    let service = ReturnService::new(h.ledger.clone());

    let ret = service
        .create_return(CreateReturnInput {
            item_kind: ItemKind::Product,
            item_id: product.id,
            quantity: 2,
            date: day(12),
            note: Some("Kemasan rusak".to_string()),
        })
        .await
        .unwrap()
        .value;

    assert_eq!(h.stock(product.item_ref()).await, 5);
    let entries = h.movements(product.item_ref()).await;
    assert_eq!(entries[0].movement_type, MovementType::ReturnIn);
    assert_eq!(entries[0].context.return_id, Some(ret.id));
    assert_eq!(entries[0].note.as_deref(), Some("Kemasan rusak"));
}

#[tokio::test]
async fn test_finance_summary_over_range() {
    let h = Harness::new();
    let service = FinanceService::new(h.ledger.clone());

    let entry = |d: u32, amount: i64| CashEntryInput {
        date: day(d),
        category: "Lainnya".to_string(),
        description: "Manual".to_string(),
        amount: Decimal::from(amount),
        related_id: None,
    };

    service.record_revenue(entry(1, 500_000)).await.unwrap();
    service.record_revenue(entry(20, 200_000)).await.unwrap();
    service.record_expense(entry(2, 150_000)).await.unwrap();
    service.record_expense(entry(25, 100_000)).await.unwrap();

    let all = service.summary(None).await.unwrap();
    assert_eq!(all.total_revenue, Decimal::from(700_000));
    assert_eq!(all.total_expense, Decimal::from(250_000));
    assert_eq!(all.net, Decimal::from(450_000));

    let early = service
        .summary(Some(DateRange::new(day(1), day(10))))
        .await
        .unwrap();
    assert_eq!(early.net, Decimal::from(350_000));

    let revenues = service.list_revenues().await.unwrap();
    assert_eq!(revenues[0].date, day(20));

    assert!(matches!(
        service.record_expense(entry(3, 0)).await,
        Err(AppError::Validation { .. })
    ));
    assert!(service
        .summary(Some(DateRange::new(day(10), day(1))))
        .await
        .is_err());
}
