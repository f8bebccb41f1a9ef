//! Production converter tests
//!
//! Tests for productions including:
//! - Materials consumed and result produced together
//! - All-or-nothing batches under injected failures
//! - Exact reversal on delete
//! - Edits moving stock by the difference only

mod common;

use common::{day, Harness};
use proptest::prelude::*;
use shared::{ComponentInput, Item, MovementType, ProductionStatus};
use stock_ledger_backend::{
    services::production::{ProductionInput, ProductionService},
    AppError,
};

fn input(materials: &[(&Item, i64)], product: &Item, quantity: i64) -> ProductionInput {
    ProductionInput {
        name: "Batch Keripik".to_string(),
        description: Some("Produksi harian".to_string()),
        date: day(3),
        status: ProductionStatus::Pending,
        materials: materials
            .iter()
            .map(|(item, q)| ComponentInput {
                item_id: item.id,
                quantity: *q,
            })
            .collect(),
        product_result: ComponentInput {
            item_id: product.id,
            quantity,
        },
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[tokio::test]
async fn test_production_consumes_materials_and_yields_product() {
    let h = Harness::new();
    let material = h.material("Singkong", 20).await;
    let product = h.product("Keripik Singkong", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let recorded = service
        .create(input(&[(&material, 5)], &product, 2))
        .await
        .unwrap();

    assert!(!recorded.is_degraded());
    assert_eq!(h.stock(material.item_ref()).await, 15);
    assert_eq!(h.stock(product.item_ref()).await, 2);

    let out = h.movements(material.item_ref()).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].movement_type, MovementType::ProductionOut);
    assert_eq!(out[0].quantity_change, -5);
    assert_eq!(out[0].context.production_id, Some(recorded.value.id));

    let produced = h.movements(product.item_ref()).await;
    assert_eq!(produced.len(), 1);
    assert_eq!(produced[0].movement_type, MovementType::ProductionIn);
    assert_eq!(produced[0].quantity_change, 2);

    let stored = service.get(recorded.value.id).await.unwrap();
    assert_eq!(stored.materials[0].name, "Singkong");
    assert_eq!(stored.product_result.name, "Keripik Singkong");
}

#[tokio::test]
async fn test_insufficient_material_rejects_whole_production() {
    let h = Harness::new();
    let enough = h.material("Minyak Goreng", 10).await;
    let short = h.material("Bumbu Balado", 1).await;
    let product = h.product("Keripik Balado", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let err = service
        .create(input(&[(&enough, 4), (&short, 2)], &product, 3))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { item_id, .. } if item_id == short.id));
    assert_eq!(h.stock(enough.item_ref()).await, 10);
    assert_eq!(h.stock(short.item_ref()).await, 1);
    assert_eq!(h.stock(product.item_ref()).await, 0);
    assert!(h.ledger.list_movements().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_injected_failure_mid_create_leaves_no_trace() {
    let h = Harness::new();
    let a = h.material("Tepung Beras", 30).await;
    let b = h.material("Garam", 30).await;
    let product = h.product("Rempeyek Kacang", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    // Fail after the document insert and the first material decrement
    h.store.fail_next_commit_at(2).await;
    let result = service
        .create(input(&[(&a, 3), (&b, 1)], &product, 5))
        .await;

    assert!(result.is_err());
    assert_eq!(h.stock(a.item_ref()).await, 30);
    assert_eq!(h.stock(b.item_ref()).await, 30);
    assert_eq!(h.stock(product.item_ref()).await, 0);
    assert!(h.ledger.list_movements().await.unwrap().is_empty());
    h.assert_conserved().await;
}

#[tokio::test]
async fn test_injected_failure_mid_edit_and_delete_leaves_stock() {
    let h = Harness::new();
    let material = h.material("Kacang Tanah", 50).await;
    let product = h.product("Peyek", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let created = service
        .create(input(&[(&material, 10)], &product, 4))
        .await
        .unwrap()
        .value;

    h.store.fail_next_commit_at(2).await;
    assert!(service
        .edit(created.id, input(&[(&material, 20)], &product, 8))
        .await
        .is_err());
    assert_eq!(h.stock(material.item_ref()).await, 40);
    assert_eq!(h.stock(product.item_ref()).await, 4);

    h.store.fail_next_commit_at(1).await;
    assert!(service.delete(created.id).await.is_err());
    assert_eq!(h.stock(material.item_ref()).await, 40);
    assert_eq!(h.stock(product.item_ref()).await, 4);
    assert_eq!(service.get(created.id).await.unwrap(), created);
    h.assert_conserved().await;
}

#[tokio::test]
async fn test_edit_moves_stock_by_difference() {
    let h = Harness::new();
    let old_material = h.material("Gula Pasir", 20).await;
    let new_material = h.material("Gula Aren", 20).await;
    let product = h.product("Dodol", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let created = service
        .create(input(&[(&old_material, 6)], &product, 3))
        .await
        .unwrap()
        .value;

    let edited = service
        .edit(
            created.id,
            input(&[(&old_material, 2), (&new_material, 4)], &product, 5),
        )
        .await
        .unwrap()
        .value;

    assert_eq!(edited.id, created.id);
    assert_eq!(edited.created_at, created.created_at);
    assert_eq!(h.stock(old_material.item_ref()).await, 18);
    assert_eq!(h.stock(new_material.item_ref()).await, 16);
    assert_eq!(h.stock(product.item_ref()).await, 5);

    // Reversal and reapplication are both logged
    let types: Vec<MovementType> = h
        .movements(old_material.item_ref())
        .await
        .iter()
        .map(|m| m.movement_type)
        .collect();
    assert_eq!(types.len(), 3);
    assert!(types.contains(&MovementType::ProductionOutRevert));
    h.assert_conserved().await;
}

#[tokio::test]
async fn test_edit_at_exact_stock_does_not_dip_below_zero() {
    let h = Harness::new();
    let material = h.material("Ikan Tenggiri", 10).await;
    let product = h.product("Kerupuk Ikan", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let created = service
        .create(input(&[(&material, 10)], &product, 6))
        .await
        .unwrap()
        .value;
    h.ledger
        .apply_stock_delta(
            product.item_ref(),
            -6,
            MovementType::Sale,
            None,
            Default::default(),
        )
        .await
        .unwrap();

    // Product stock is 0; reversing 6 then reapplying 6 nets to zero
    service
        .edit(created.id, input(&[(&material, 10)], &product, 6))
        .await
        .unwrap();

    assert_eq!(h.stock(material.item_ref()).await, 0);
    assert_eq!(h.stock(product.item_ref()).await, 0);
}

#[tokio::test]
async fn test_delete_after_result_was_sold_is_rejected() {
    let h = Harness::new();
    let material = h.material("Udang", 10).await;
    let product = h.product("Terasi", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let created = service
        .create(input(&[(&material, 4)], &product, 2))
        .await
        .unwrap()
        .value;
    h.ledger
        .apply_stock_delta(
            product.item_ref(),
            -2,
            MovementType::Sale,
            None,
            Default::default(),
        )
        .await
        .unwrap();

    let err = service.delete(created.id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert!(service.get(created.id).await.is_ok());
    assert_eq!(h.stock(material.item_ref()).await, 6);
}

#[tokio::test]
async fn test_set_status_does_not_touch_stock() {
    let h = Harness::new();
    let material = h.material("Jahe", 8).await;
    let product = h.product("Wedang Jahe", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let created = service
        .create(input(&[(&material, 3)], &product, 3))
        .await
        .unwrap()
        .value;

    let completed = service
        .set_status(created.id, ProductionStatus::Completed)
        .await
        .unwrap();

    assert_eq!(completed.status, ProductionStatus::Completed);
    assert_eq!(h.stock(material.item_ref()).await, 5);
    assert_eq!(h.stock(product.item_ref()).await, 3);
    assert_eq!(h.ledger.list_movements().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_production_input_is_rejected() {
    let h = Harness::new();
    let material = h.material("Kelapa", 8).await;
    let product = h.product("Santan", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let no_materials = input(&[], &product, 1);
    assert!(matches!(
        service.create(no_materials).await,
        Err(AppError::ValidationError(_))
    ));

    let zero_result = input(&[(&material, 1)], &product, 0);
    assert!(matches!(
        service.create(zero_result).await,
        Err(AppError::ValidationError(_))
    ));

    // A product id passed as a material does not resolve
    let wrong_kind = input(&[(&product, 1)], &product, 1);
    assert!(matches!(
        service.create(wrong_kind).await,
        Err(AppError::ItemNotFound(_))
    ));
}

#[tokio::test]
async fn test_create_with_log_down_is_degraded_but_committed() {
    let h = Harness::new();
    let a = h.material("Tepung Beras", 30).await;
    let b = h.material("Garam", 30).await;
    let product = h.product("Rempeyek Kacang", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    h.store.fail_movement_appends(true).await;
    let recorded = service
        .create(input(&[(&a, 3), (&b, 1)], &product, 5))
        .await
        .unwrap();

    assert!(recorded.is_degraded());
    assert_eq!(h.stock(a.item_ref()).await, 27);
    assert_eq!(h.stock(b.item_ref()).await, 29);
    assert_eq!(h.stock(product.item_ref()).await, 5);
    assert_eq!(service.get(recorded.value.id).await.unwrap(), recorded.value);

    let gap = recorded.audit_gap.clone().unwrap();
    let missing: Vec<(uuid::Uuid, i64, MovementType)> = gap
        .missing_movements
        .iter()
        .map(|m| (m.item_id, m.quantity_change, m.movement_type))
        .collect();
    assert_eq!(
        missing,
        vec![
            (a.id, -3, MovementType::ProductionOut),
            (b.id, -1, MovementType::ProductionOut),
            (product.id, 5, MovementType::ProductionIn),
        ]
    );
    assert!(gap
        .missing_movements
        .iter()
        .all(|m| m.context.production_id == Some(recorded.value.id)));
    assert!(h.ledger.list_movements().await.unwrap().is_empty());
    h.assert_conserved().await;

    h.store.fail_movement_appends(false).await;
    h.ledger.backfill(&gap).await.unwrap();
    assert_eq!(h.ledger.list_movements().await.unwrap().len(), 3);
    assert_eq!(h.ledger.reconcile(false).await.unwrap().unlogged_movements, 0);
}

#[tokio::test]
async fn test_edit_and_delete_with_log_down_are_degraded_but_committed() {
    let h = Harness::new();
    let material = h.material("Kacang Tanah", 50).await;
    let product = h.product("Peyek", 0).await;
    let service = ProductionService::new(h.ledger.clone());

    let created = service
        .create(input(&[(&material, 10)], &product, 4))
        .await
        .unwrap()
        .value;

    h.store.fail_movement_appends(true).await;
    let edited = service
        .edit(created.id, input(&[(&material, 20)], &product, 8))
        .await
        .unwrap();
    assert!(edited.is_degraded());
    assert_eq!(h.stock(material.item_ref()).await, 30);
    assert_eq!(h.stock(product.item_ref()).await, 8);

    let missing: Vec<(uuid::Uuid, i64, MovementType)> = edited
        .audit_gap
        .as_ref()
        .unwrap()
        .missing_movements
        .iter()
        .map(|m| (m.item_id, m.quantity_change, m.movement_type))
        .collect();
    assert_eq!(
        missing,
        vec![
            (material.id, 10, MovementType::ProductionOutRevert),
            (product.id, -4, MovementType::ProductionInRevert),
            (material.id, -20, MovementType::ProductionOut),
            (product.id, 8, MovementType::ProductionIn),
        ]
    );

    let deleted = service.delete(created.id).await.unwrap();
    assert!(deleted.is_degraded());
    assert_eq!(h.stock(material.item_ref()).await, 50);
    assert_eq!(h.stock(product.item_ref()).await, 0);
    assert!(matches!(
        service.get(created.id).await,
        Err(AppError::NotFound(_))
    ));

    let missing: Vec<(uuid::Uuid, i64, MovementType)> = deleted
        .audit_gap
        .as_ref()
        .unwrap()
        .missing_movements
        .iter()
        .map(|m| (m.item_id, m.quantity_change, m.movement_type))
        .collect();
    assert_eq!(
        missing,
        vec![
            (material.id, 20, MovementType::ProductionOutRevert),
            (product.id, -8, MovementType::ProductionInRevert),
        ]
    );
    h.assert_conserved().await;

    // Repair moves both gaps into the log without touching stock
    h.store.fail_movement_appends(false).await;
    let report = h.ledger.reconcile(true).await.unwrap();
    assert_eq!(report.backfilled, 6);
    assert!(!report.repaired);
    assert_eq!(h.stock(material.item_ref()).await, 50);
    assert_eq!(h.movements(material.item_ref()).await.len(), 4);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Deleting a production restores every touched item and leaves a
    /// balanced set of movements per item
    #[test]
    fn prop_delete_reverses_create(
        quantities in prop::collection::vec(1i64..20, 1..5),
        produced in 1i64..20,
    ) {
        tokio_test::block_on(async {
            let h = Harness::new();
            let product = h.product("Hasil", 0).await;
            let mut materials = Vec::new();
            for (i, _) in quantities.iter().enumerate() {
                materials.push(h.material(&format!("Bahan {}", i), 40).await);
            }
            let service = ProductionService::new(h.ledger.clone());

            let components: Vec<(&Item, i64)> =
                materials.iter().zip(quantities.iter().copied()).collect();
            let created = service
                .create(input(&components, &product, produced))
                .await
                .unwrap()
                .value;
            service.delete(created.id).await.unwrap();

            for material in &materials {
                assert_eq!(h.stock(material.item_ref()).await, 40);
                let net: i64 = h
                    .movements(material.item_ref())
                    .await
                    .iter()
                    .map(|m| m.quantity_change)
                    .sum();
                assert_eq!(net, 0);
            }
            assert_eq!(h.stock(product.item_ref()).await, 0);
            assert!(matches!(
                service.get(created.id).await,
                Err(AppError::NotFound(_))
            ));
            h.assert_conserved().await;
        });
    }
}
