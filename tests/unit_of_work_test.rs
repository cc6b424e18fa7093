mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use storefront_orders::models::NewProduct;
use storefront_orders::repositories::ProductRepository;
use storefront_orders::{
    settle, Error, PostgresUnitOfWork, TransactionAware, TransactionError, TransactionResult, UnitOfWork,
    UnitOfWorkSession,
};

use common::{create_product, money, setup_database, stock_of};

/// Observer that remembers which lifecycle callback fired.
#[derive(Default)]
struct Recorder {
    committed: AtomicBool,
    rolled_back: AtomicBool,
}

impl Recorder {
    fn is_committed(&self) -> bool {
        self.committed.load(Ordering::SeqCst)
    }

    fn is_rolled_back(&self) -> bool {
        self.rolled_back.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionAware for Recorder {
    async fn on_commit(&self) -> TransactionResult<()> {
        self.committed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn on_rollback(&self) -> TransactionResult<()> {
        self.rolled_back.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn lamp() -> NewProduct {
    NewProduct {
        name: "Desk lamp".to_string(),
        description: "Brass".to_string(),
        price: money("24.50"),
        stock: 7,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_commit_functionality() {
    let pool = setup_database().await;
    let uow = PostgresUnitOfWork::new(pool.clone());

    let session = uow.begin().await.expect("Failed to begin transaction");
    let recorder = Arc::new(Recorder::default());
    session.register_transaction_aware(recorder.clone());

    let products = ProductRepository::new(session.executor().clone());
    let product = products.create(&lamp()).await.expect("Failed to create product");
    let remaining = products
        .decrement_stock(product.id, 2)
        .await
        .expect("Failed to decrement stock");
    assert_eq!(remaining, Some(5));

    session.commit().await.expect("Failed to commit transaction");
    assert!(recorder.is_committed(), "Observer should see the commit");
    assert!(!recorder.is_rolled_back(), "Observer should not see a rollback");

    let verify = uow.begin().await.expect("Failed to begin verify transaction");
    let persisted = ProductRepository::new(verify.executor().clone())
        .find_by_id(product.id)
        .await
        .expect("Failed to find product")
        .expect("Product should persist after commit");
    assert_eq!(persisted.name, "Desk lamp");
    assert_eq!(persisted.stock, 5);
    verify.commit().await.expect("Failed to commit verify transaction");

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_rollback_functionality() {
    let pool = setup_database().await;
    let uow = PostgresUnitOfWork::new(pool.clone());
    let existing = create_product(&pool, "Kettle", "30.00", 4).await;

    let session = uow.begin().await.expect("Failed to begin transaction");
    let recorder = Arc::new(Recorder::default());
    session.register_transaction_aware(recorder.clone());

    let products = ProductRepository::new(session.executor().clone());
    let created = products.create(&lamp()).await.expect("Failed to create product");
    products
        .decrement_stock(existing.id, 4)
        .await
        .expect("Failed to decrement stock");
    assert!(products.find_by_id(created.id).await.unwrap().is_some());

    session.rollback().await.expect("Failed to rollback transaction");
    assert!(!recorder.is_committed());
    assert!(recorder.is_rolled_back());

    let verify = uow.begin().await.expect("Failed to begin verify transaction");
    let products = ProductRepository::new(verify.executor().clone());
    assert!(products.find_by_id(created.id).await.unwrap().is_none());
    assert_eq!(products.count(None).await.unwrap(), 1);
    verify.commit().await.expect("Failed to commit verify transaction");
    assert_eq!(stock_of(&pool, existing.id).await, 4);

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_multiple_transactions_isolation() {
    let pool = setup_database().await;
    let uow = PostgresUnitOfWork::new(pool.clone());

    let first = uow.begin().await.expect("Failed to begin transaction 1");
    let kept = ProductRepository::new(first.executor().clone())
        .create(&lamp())
        .await
        .expect("Failed to create first product");
    first.commit().await.expect("Failed to commit transaction 1");

    let second = uow.begin().await.expect("Failed to begin transaction 2");
    let discarded = ProductRepository::new(second.executor().clone())
        .create(&NewProduct {
            name: "Stool".to_string(),
            ..lamp()
        })
        .await
        .expect("Failed to create second product");

    // Uncommitted rows are invisible to other transactions.
    let outside = uow.begin().await.expect("Failed to begin observer transaction");
    let seen = ProductRepository::new(outside.executor().clone())
        .find_by_id(discarded.id)
        .await
        .expect("Failed to query product");
    assert!(seen.is_none());
    outside.commit().await.unwrap();

    second.rollback().await.expect("Failed to rollback transaction 2");

    let verify = uow.begin().await.expect("Failed to begin verify transaction");
    let products = ProductRepository::new(verify.executor().clone());
    assert!(products.find_by_id(kept.id).await.unwrap().is_some());
    assert!(products.find_by_id(discarded.id).await.unwrap().is_none());
    verify.commit().await.unwrap();

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_settle_rolls_back_and_keeps_the_original_error() {
    let pool = setup_database().await;
    let uow = PostgresUnitOfWork::new(pool.clone());
    let product = create_product(&pool, "Mug", "8.00", 3).await;

    let session = uow.begin().await.unwrap();
    let recorder = Arc::new(Recorder::default());
    session.register_transaction_aware(recorder.clone());

    let products = ProductRepository::new(session.executor().clone());
    products.decrement_stock(product.id, 3).await.unwrap();
    let outcome: Result<(), Error> = Err(Error::EmptyCart);
    let err = settle(session, outcome).await.unwrap_err();

    assert!(matches!(err, Error::EmptyCart));
    assert!(recorder.is_rolled_back());
    assert_eq!(stock_of(&pool, product.id).await, 3);

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_closed_session_rejects_work() {
    let pool = setup_database().await;
    let uow = PostgresUnitOfWork::new(pool.clone());

    let session = uow.begin().await.unwrap();
    let products = ProductRepository::new(session.executor().clone());
    session.commit().await.unwrap();

    let err = products.count(None).await.unwrap_err();
    assert!(matches!(err, TransactionError::SessionClosed));

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial_test::serial]
async fn test_session_work_runs_on_spawned_tasks() {
    let pool = setup_database().await;
    let uow = PostgresUnitOfWork::new(pool.clone());
    let existing = create_product(&pool, "Teapot", "19.00", 6).await;

    // Repository futures hold the transaction lock across awaits and must stay `Send`.
    let task = tokio::spawn({
        let uow = uow.clone();
        async move {
            let session = uow.begin().await?;
            let products = ProductRepository::new(session.executor().clone());
            let locked = products.lock_by_id(existing.id).await?;
            let remaining = products.decrement_stock(existing.id, 2).await?;
            let created = products.create(&lamp()).await?;
            session.commit().await?;
            Ok::<_, TransactionError>((locked.map(|p| p.stock), remaining, created.id))
        }
    });

    let (locked, remaining, created) = task.await.expect("Task panicked").expect("Spawned work failed");
    assert_eq!(locked, Some(6));
    assert_eq!(remaining, Some(4));
    assert_eq!(stock_of(&pool, existing.id).await, 4);

    let verify = uow.begin().await.unwrap();
    let found = ProductRepository::new(verify.executor().clone())
        .find_by_id(created)
        .await
        .unwrap();
    assert!(found.is_some());
    verify.commit().await.unwrap();

    pool.close().await;
}
