use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{
    Account, BottleCmd, BottledOutput, ChangeAccountCmd, ContainerKind, ContainerStatus,
    EditContainerCmd, Engine, EngineError, ErrorKind, FillCmd, FillSpec, NewContainerCmd,
    Operation, ProofDownCmd, Quantity, ReverseCmd, TankAdjustCmd, TransactionRecord, TransactionType,
    TransferCmd,
    conversion::approx_eq,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn barrel_kind(engine: &Engine) -> ContainerKind {
    engine
        .new_container_kind("Barrel 53", 53.0, 100.0)
        .await
        .unwrap()
}

async fn tote_kind(engine: &Engine) -> ContainerKind {
    engine
        .new_container_kind("Tote 275", 275.0, 150.0)
        .await
        .unwrap()
}

async fn empty_container(engine: &Engine, kind: &ContainerKind, name: &str) -> Uuid {
    let outcome = engine
        .new_container(NewContainerCmd::new(kind.id, name, "barrel"))
        .await
        .unwrap();
    outcome.containers[0].container.id
}

async fn filled_container(
    engine: &Engine,
    kind: &ContainerKind,
    name: &str,
    product: &str,
    proof: f64,
    quantity: Quantity,
) -> Uuid {
    let outcome = engine
        .new_container(
            NewContainerCmd::new(kind.id, name, "barrel").fill(FillSpec::new(product, proof, quantity)),
        )
        .await
        .unwrap();
    outcome.containers[0].container.id
}

#[tokio::test]
async fn duplicate_kind_names_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    barrel_kind(&engine).await;

    let err = engine
        .new_container_kind("barrel 53", 60.0, 90.0)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("barrel 53".to_string()));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(engine.container_kinds().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_without_fill_emits_zero_delta_record() {
    let (engine, _db) = engine_with_db().await;
    let kind = barrel_kind(&engine).await;

    let outcome = engine
        .new_container(NewContainerCmd::new(kind.id, "B-001", "barrel").notes("new cooperage"))
        .await
        .unwrap();
    let view = &outcome.containers[0];
    assert_eq!(view.container.status, ContainerStatus::Empty);
    assert_eq!(view.container.tare_weight, 100.0);
    assert_eq!(view.gauge.gross_weight, 100.0);

    assert_eq!(outcome.transactions.len(), 1);
    let record = &outcome.transactions[0];
    assert_eq!(record.transaction_type, TransactionType::Create);
    assert_eq!(record.volume_gallons_delta, 0.0);
    assert_eq!(record.proof_gallons_delta, 0.0);
    assert_eq!(record.notes.as_deref(), Some("new cooperage"));
}

#[tokio::test]
async fn example_scenario_create_then_transfer() {
    let (engine, _db) = engine_with_db().await;
    let barrel = barrel_kind(&engine).await;
    let wide = engine
        .new_container_kind("Barrel 60", 60.0, 110.0)
        .await
        .unwrap();

    let a = filled_container(&engine, &barrel, "A", "bourbon", 110.0, Quantity::NetWeight(400.0))
        .await;
    let b = empty_container(&engine, &wide, "B").await;

    let density = engine.density().density_factor(110.0).unwrap();
    let view = engine.container(a).await.unwrap();
    assert_eq!(view.container.status, ContainerStatus::Filled);
    assert!(approx_eq(view.gauge.wine_gallons, 400.0 / density));
    assert!(approx_eq(view.gauge.proof_gallons, 400.0 / density * 1.1));

    let outcome = engine
        .transfer(TransferCmd::new(a, b).amount(Quantity::WineGallons(20.0)))
        .await
        .unwrap();

    let source = outcome.container(a).unwrap();
    assert!(approx_eq(source.container.net_weight, 400.0 - 20.0 * density));
    assert!(approx_eq(source.gauge.wine_gallons, 400.0 / density - 20.0));

    let destination = outcome.container(b).unwrap();
    assert_eq!(destination.container.status, ContainerStatus::Filled);
    assert_eq!(destination.container.product_id.as_deref(), Some("bourbon"));
    assert!(approx_eq(destination.gauge.true_proof, 110.0));
    assert!(approx_eq(destination.gauge.wine_gallons, 20.0));

    let types: Vec<_> = outcome
        .transactions
        .iter()
        .map(|record| record.transaction_type)
        .collect();
    assert_eq!(
        types,
        vec![TransactionType::TransferOut, TransactionType::TransferIn]
    );
    assert!(outcome
        .transactions
        .iter()
        .all(|record| record.operation_id == outcome.operation_id));
}

#[tokio::test]
async fn fill_then_bottle_everything_empties_the_container() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = empty_container(&engine, &tote, "T-1").await;

    let filled = engine
        .fill_container(FillCmd::new(
            id,
            FillSpec::new("vodka", 120.0, Quantity::NetWeight(500.0)),
        ))
        .await
        .unwrap();
    assert_eq!(filled.containers[0].container.status, ContainerStatus::Filled);
    assert_eq!(filled.transactions[0].transaction_type, TransactionType::Create);

    let bottled = engine.bottle(BottleCmd::new(id)).await.unwrap();
    let view = &bottled.containers[0];
    assert_eq!(view.container.status, ContainerStatus::Empty);
    assert_eq!(view.container.net_weight, 0.0);
    assert_eq!(view.container.product_id, None);
    assert!(view.container.emptied_date.is_some());
    assert_eq!(bottled.transactions.len(), 1);
    assert_eq!(
        bottled.transactions[0].transaction_type,
        TransactionType::BottleEmpty
    );
}

#[tokio::test]
async fn fill_requires_an_empty_container_and_positive_proof() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = filled_container(&engine, &tote, "T-1", "gin", 90.0, Quantity::WineGallons(10.0)).await;

    let err = engine
        .fill_container(FillCmd::new(
            id,
            FillSpec::new("gin", 90.0, Quantity::WineGallons(10.0)),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let empty = empty_container(&engine, &tote, "T-2").await;
    let err = engine
        .fill_container(FillCmd::new(
            empty,
            FillSpec::new("water", 0.0, Quantity::NetWeight(100.0)),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        engine.container(empty).await.unwrap().container.status,
        ContainerStatus::Empty
    );
}

#[tokio::test]
async fn fill_by_gross_weight_corrects_temperature() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = empty_container(&engine, &tote, "T-1").await;

    let outcome = engine
        .fill_container(FillCmd::new(
            id,
            FillSpec::new("rum", 120.0, Quantity::GrossWeight(550.0)).temperature_f(70.0),
        ))
        .await
        .unwrap();
    let view = &outcome.containers[0];
    assert_eq!(view.container.net_weight, 400.0);
    assert_eq!(view.container.proof, 120.0);
    assert_eq!(view.container.temperature_f, 70.0);
    assert!(approx_eq(view.gauge.true_proof, 117.5));
    assert!(approx_eq(outcome.transactions[0].proof, 117.5));
}

#[tokio::test]
async fn capacity_is_enforced_at_the_boundary() {
    let (engine, _db) = engine_with_db().await;
    let barrel = barrel_kind(&engine).await;

    let full = filled_container(&engine, &barrel, "Full", "bourbon", 100.0, Quantity::WineGallons(53.0))
        .await;
    assert!(approx_eq(
        engine.container(full).await.unwrap().gauge.wine_gallons,
        53.0
    ));

    let err = engine
        .new_container(
            NewContainerCmd::new(barrel.id, "Over", "barrel")
                .fill(FillSpec::new("bourbon", 100.0, Quantity::WineGallons(53.01))),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(engine.containers().await.unwrap().len(), 1);

    let source = filled_container(&engine, &barrel, "Source", "bourbon", 100.0, Quantity::WineGallons(30.0))
        .await;
    let partial = filled_container(&engine, &barrel, "Partial", "bourbon", 100.0, Quantity::WineGallons(30.0))
        .await;
    let err = engine
        .transfer(TransferCmd::new(source, partial).amount(Quantity::WineGallons(23.5)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    engine
        .transfer(TransferCmd::new(source, partial).amount(Quantity::WineGallons(23.0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn transfer_conserves_proof_gallons_and_records_loss() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let a = filled_container(&engine, &tote, "A", "bourbon", 125.0, Quantity::NetWeight(800.0)).await;
    let b = empty_container(&engine, &tote, "B").await;

    let before = engine.container(a).await.unwrap().gauge;
    let err = engine
        .transfer(
            TransferCmd::new(a, b)
                .amount(Quantity::ProofGallons(40.0))
                .loss_proof_gallons(0.5),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let outcome = engine
        .transfer(
            TransferCmd::new(a, b)
                .amount(Quantity::ProofGallons(40.0))
                .loss_proof_gallons(0.5)
                .destination_account(Account::Production)
                .notes("hose spill"),
        )
        .await
        .unwrap();
    let out = &outcome.transactions[0];
    let into = &outcome.transactions[1];
    assert!(approx_eq(out.proof_gallons_delta, -40.0));
    assert!(approx_eq(into.proof_gallons_delta, 39.5));
    assert!(approx_eq(-out.proof_gallons_delta, into.proof_gallons_delta + 0.5));
    assert!(into.notes.as_deref().unwrap().contains("hose spill"));

    let source = outcome.container(a).unwrap();
    assert!(approx_eq(
        source.gauge.proof_gallons,
        before.proof_gallons - 40.0
    ));
    let destination = outcome.container(b).unwrap();
    assert_eq!(destination.container.account, Account::Production);
    assert!(approx_eq(destination.gauge.proof_gallons, 39.5));
}

#[tokio::test]
async fn transfer_blends_same_product_only() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let a = filled_container(&engine, &tote, "A", "bourbon", 120.0, Quantity::WineGallons(10.0)).await;
    let b = filled_container(&engine, &tote, "B", "bourbon", 100.0, Quantity::WineGallons(10.0)).await;
    let rye = filled_container(&engine, &tote, "R", "rye", 100.0, Quantity::WineGallons(10.0)).await;

    let err = engine
        .transfer(TransferCmd::new(a, rye))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    let untouched = engine.container(rye).await.unwrap();
    assert!(approx_eq(untouched.gauge.wine_gallons, 10.0));

    let outcome = engine.transfer(TransferCmd::new(a, b)).await.unwrap();
    let source = outcome.container(a).unwrap();
    assert_eq!(source.container.status, ContainerStatus::Empty);
    let blended = outcome.container(b).unwrap();
    assert!(approx_eq(blended.gauge.wine_gallons, 20.0));
    assert!(approx_eq(blended.gauge.proof_gallons, 22.0));
    assert!(approx_eq(blended.gauge.true_proof, 110.0));
}

#[tokio::test]
async fn transfer_validation_and_preconditions() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let a = filled_container(&engine, &tote, "A", "gin", 90.0, Quantity::WineGallons(10.0)).await;
    let empty = empty_container(&engine, &tote, "E").await;

    let err = engine.transfer(TransferCmd::new(a, a)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = engine
        .transfer(TransferCmd::new(a, empty).amount(Quantity::WineGallons(-1.0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = engine
        .transfer(TransferCmd::new(a, empty).amount(Quantity::WineGallons(10.5)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let err = engine
        .transfer(TransferCmd::new(empty, a))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let err = engine
        .transfer(TransferCmd::new(a, Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("container not exists".to_string()));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[tokio::test]
async fn proof_down_conserves_proof_gallons() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = filled_container(&engine, &tote, "T-1", "vodka", 120.0, Quantity::NetWeight(400.0)).await;
    let before = engine.container(id).await.unwrap().gauge;

    let outcome = engine
        .proof_down(ProofDownCmd::new(id, 80.0).notes("cut for bottling"))
        .await
        .unwrap();
    let after = outcome.containers[0].gauge;
    assert!(approx_eq(after.proof_gallons, before.proof_gallons));
    assert!(approx_eq(after.wine_gallons, before.proof_gallons * 100.0 / 80.0));
    assert!(approx_eq(after.true_proof, 80.0));
    assert!(after.net_weight > before.net_weight);

    let record = &outcome.transactions[0];
    assert_eq!(record.transaction_type, TransactionType::ProofDown);
    assert_eq!(record.proof_gallons_delta, 0.0);
    assert_eq!(
        record.notes.as_deref(),
        Some("120.00 -> 80.00; cut for bottling")
    );

    let err = engine
        .proof_down(ProofDownCmd::new(id, 80.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    let err = engine
        .proof_down(ProofDownCmd::new(id, 90.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    let err = engine
        .proof_down(ProofDownCmd::new(id, 0.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn proof_down_respects_capacity() {
    let (engine, _db) = engine_with_db().await;
    let barrel = barrel_kind(&engine).await;
    let id = filled_container(&engine, &barrel, "B-1", "vodka", 120.0, Quantity::WineGallons(50.0)).await;

    let err = engine
        .proof_down(ProofDownCmd::new(id, 100.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(approx_eq(
        engine.container(id).await.unwrap().gauge.true_proof,
        120.0
    ));
}

#[tokio::test]
async fn bottling_records_declared_loss() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = filled_container(&engine, &tote, "T-1", "gin", 100.0, Quantity::WineGallons(50.0)).await;

    let declared = BottledOutput {
        bottle_count: 250,
        bottle_size_ml: 750.0,
        proof: 100.0,
    };
    let outcome = engine
        .bottle(BottleCmd::new(id).declared(declared))
        .await
        .unwrap();
    assert_eq!(outcome.transactions.len(), 2);
    let bottle = &outcome.transactions[0];
    let loss = &outcome.transactions[1];
    assert_eq!(bottle.transaction_type, TransactionType::BottleEmpty);
    assert!(approx_eq(bottle.proof_gallons_delta, -50.0));
    assert_eq!(loss.transaction_type, TransactionType::BottlingLoss);
    assert_eq!(loss.volume_gallons_delta, 0.0);
    assert!(approx_eq(loss.proof_gallons_delta, declared.proof_gallons() - 50.0));
    assert!(loss.proof_gallons_delta < 0.0);
    assert_eq!(bottle.sequence, 0);
    assert_eq!(loss.sequence, 1);
}

#[tokio::test]
async fn reversing_a_bottling_compensates_the_declared_loss() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = filled_container(&engine, &tote, "T-1", "gin", 100.0, Quantity::WineGallons(50.0)).await;

    let bottling = engine
        .bottle(BottleCmd::new(id).declared(BottledOutput {
            bottle_count: 250,
            bottle_size_ml: 750.0,
            proof: 100.0,
        }))
        .await
        .unwrap();
    let reversal = engine
        .reverse_operation(ReverseCmd::new(bottling.transactions[0].id))
        .await
        .unwrap();

    assert_eq!(reversal.transactions.len(), 2);
    for record in &reversal.transactions {
        assert_eq!(record.transaction_type, TransactionType::Reversal);
        assert_eq!(record.reverses_operation_id, Some(bottling.operation_id));
    }
    let sum = |records: &[TransactionRecord]| -> (f64, f64) {
        records.iter().fold((0.0, 0.0), |(wg, pg), record| {
            (wg + record.volume_gallons_delta, pg + record.proof_gallons_delta)
        })
    };
    let (original_wg, original_pg) = sum(&bottling.transactions);
    let (reversed_wg, reversed_pg) = sum(&reversal.transactions);
    assert!(approx_eq(reversed_wg, -original_wg));
    assert!(approx_eq(reversed_pg, -original_pg));
    assert!(approx_eq(
        reversal.transactions[1].proof_gallons_delta,
        -bottling.transactions[1].proof_gallons_delta
    ));
    assert_eq!(
        reversal.transactions[1].notes.as_deref(),
        Some("reverses BOTTLING_LOSS")
    );

    let restored = engine.container(id).await.unwrap();
    assert_eq!(restored.container.status, ContainerStatus::Filled);
    assert!(approx_eq(restored.gauge.proof_gallons, 50.0));
}

#[tokio::test]
async fn partial_bottling_with_gain() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = filled_container(&engine, &tote, "T-1", "gin", 80.0, Quantity::WineGallons(100.0)).await;

    let declared = BottledOutput {
        bottle_count: 100,
        bottle_size_ml: 750.0,
        proof: 80.0,
    };
    let outcome = engine
        .bottle(
            BottleCmd::new(id)
                .amount(Quantity::WineGallons(19.0))
                .declared(declared),
        )
        .await
        .unwrap();
    let view = &outcome.containers[0];
    assert_eq!(view.container.status, ContainerStatus::Filled);
    assert!(approx_eq(view.gauge.wine_gallons, 81.0));
    assert_eq!(
        outcome.transactions[0].transaction_type,
        TransactionType::BottlePartial
    );
    assert_eq!(
        outcome.transactions[1].transaction_type,
        TransactionType::BottlingGain
    );
    assert!(outcome.transactions[1].proof_gallons_delta > 0.0);

    let err = engine
        .bottle(BottleCmd::new(id).amount(Quantity::WineGallons(90.0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[tokio::test]
async fn tank_adjust_corrects_and_can_empty() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = filled_container(&engine, &tote, "T-1", "bourbon", 110.0, Quantity::NetWeight(400.0)).await;

    let err = engine
        .tank_adjust(TankAdjustCmd::new(id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let outcome = engine
        .tank_adjust(
            TankAdjustCmd::new(id)
                .weight(Quantity::GrossWeight(540.0))
                .notes("angel's share"),
        )
        .await
        .unwrap();
    let view = &outcome.containers[0];
    assert_eq!(view.container.net_weight, 390.0);
    let record = &outcome.transactions[0];
    assert_eq!(record.transaction_type, TransactionType::TankAdjust);
    assert!(record.volume_gallons_delta < 0.0);
    assert!(record.proof_gallons_delta < 0.0);

    let outcome = engine
        .tank_adjust(TankAdjustCmd::new(id).proof(108.0).temperature_f(60.0))
        .await
        .unwrap();
    assert!(approx_eq(outcome.containers[0].gauge.true_proof, 108.0));

    let outcome = engine
        .tank_adjust(TankAdjustCmd::new(id).weight(Quantity::NetWeight(0.0)))
        .await
        .unwrap();
    assert_eq!(outcome.containers[0].container.status, ContainerStatus::Empty);
    assert_eq!(outcome.containers[0].container.product_id, None);
}

#[tokio::test]
async fn change_account_rejects_no_op() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = filled_container(&engine, &tote, "T-1", "gin", 90.0, Quantity::WineGallons(10.0)).await;

    let outcome = engine
        .execute(Operation::ChangeAccount(ChangeAccountCmd::new(
            id,
            Account::Bottling,
        )))
        .await
        .unwrap();
    let record = &outcome.transactions[0];
    assert_eq!(record.transaction_type, TransactionType::ChangeAccount);
    assert_eq!(record.notes.as_deref(), Some("storage -> bottling"));
    assert_eq!(record.volume_gallons_delta, 0.0);
    assert_eq!(outcome.containers[0].container.account, Account::Bottling);

    let err = engine
        .change_account(ChangeAccountCmd::new(id, Account::Bottling))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[tokio::test]
async fn edit_renames_without_touching_contents() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let id = filled_container(&engine, &tote, "T-1", "gin", 90.0, Quantity::WineGallons(10.0)).await;

    let err = engine
        .edit_container(EditContainerCmd::new(id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = engine
        .edit_container(EditContainerCmd::new(id).tare_weight(-5.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let outcome = engine
        .edit_container(EditContainerCmd::new(id).name("Tote 7").notes("rack 3"))
        .await
        .unwrap();
    let view = &outcome.containers[0];
    assert_eq!(view.container.name, "Tote 7");
    assert_eq!(view.container.notes.as_deref(), Some("rack 3"));
    assert!(approx_eq(view.gauge.wine_gallons, 10.0));
    assert_eq!(outcome.transactions[0].transaction_type, TransactionType::Edit);
    assert_eq!(outcome.transactions[0].proof_gallons_delta, 0.0);
}

#[tokio::test]
async fn reversal_restores_prior_state() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let a = filled_container(&engine, &tote, "A", "bourbon", 110.0, Quantity::NetWeight(400.0)).await;
    let b = empty_container(&engine, &tote, "B").await;
    let a_before = engine.container(a).await.unwrap();

    let transfer = engine
        .transfer(TransferCmd::new(a, b).amount(Quantity::WineGallons(20.0)))
        .await
        .unwrap();
    let in_record = transfer.transactions[1].clone();

    let reversal = engine
        .reverse_operation(ReverseCmd::new(in_record.id).notes("wrong tote"))
        .await
        .unwrap();
    assert_eq!(reversal.transactions.len(), 2);
    for record in &reversal.transactions {
        assert_eq!(record.transaction_type, TransactionType::Reversal);
        assert_eq!(record.reverses_operation_id, Some(transfer.operation_id));
    }
    assert!(approx_eq(
        reversal.transactions[0].proof_gallons_delta,
        -transfer.transactions[0].proof_gallons_delta
    ));
    assert!(approx_eq(
        reversal.transactions[1].volume_gallons_delta,
        -in_record.volume_gallons_delta
    ));

    let a_after = engine.container(a).await.unwrap();
    assert_eq!(a_after.container.net_weight, a_before.container.net_weight);
    assert_eq!(a_after.container.version, a_before.container.version + 2);
    let b_after = engine.container(b).await.unwrap();
    assert_eq!(b_after.container.status, ContainerStatus::Empty);
    assert_eq!(b_after.container.product_id, None);

    let err = engine
        .reverse_operation(ReverseCmd::new(in_record.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    let err = engine
        .reverse_operation(ReverseCmd::new(reversal.transactions[0].id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    let err = engine
        .reverse_operation(ReverseCmd::operation(reversal.operation_id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Precondition("a reversal cannot be reversed".to_string())
    );
    let err = engine
        .reverse_operation(ReverseCmd::operation(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("operation not exists".to_string()));
}

#[tokio::test]
async fn reversal_is_blocked_by_later_activity() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let a = filled_container(&engine, &tote, "A", "bourbon", 110.0, Quantity::NetWeight(400.0)).await;
    let b = empty_container(&engine, &tote, "B").await;

    let transfer = engine
        .transfer(TransferCmd::new(a, b).amount(Quantity::WineGallons(20.0)))
        .await
        .unwrap();
    engine
        .change_account(ChangeAccountCmd::new(b, Account::Production))
        .await
        .unwrap();

    let err = engine
        .reverse_operation(ReverseCmd::new(transfer.transactions[0].id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    let a_now = engine.container(a).await.unwrap();
    assert!(approx_eq(
        a_now.gauge.wine_gallons,
        transfer.container(a).unwrap().gauge.wine_gallons
    ));
}

#[tokio::test]
async fn history_lists_records_in_order() {
    let (engine, _db) = engine_with_db().await;
    let tote = tote_kind(&engine).await;
    let a = filled_container(&engine, &tote, "A", "rum", 100.0, Quantity::WineGallons(40.0)).await;
    let b = empty_container(&engine, &tote, "B").await;

    let transfer = engine
        .transfer(TransferCmd::new(a, b).amount(Quantity::WineGallons(10.0)))
        .await
        .unwrap();
    engine.proof_down(ProofDownCmd::new(a, 80.0)).await.unwrap();

    let history: Vec<_> = engine
        .transactions_for_container(a)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.transaction_type)
        .collect();
    assert_eq!(
        history,
        vec![
            TransactionType::Create,
            TransactionType::TransferOut,
            TransactionType::ProofDown,
        ]
    );

    let records = engine
        .transactions_for_operation(transfer.operation_id)
        .await
        .unwrap();
    let ids: Vec<_> = records.iter().map(|record| record.id).collect();
    let expected: Vec<_> = transfer.transactions.iter().map(|record| record.id).collect();
    assert_eq!(ids, expected);
    assert!(records[0].prior_state.is_some());

    let err = engine
        .transactions_for_operation(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}
