//! Wallet ledger and auto-refund scheduler integration tests
//!
//! All tests here need a real Postgres database (TEST_DATABASE_URL) and are
//! gated behind `--ignored`.

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use rentora_server::scheduler::AutoRefundJob;
    use rentora_server::wallet::{LedgerError, WalletLedger, WalletTxType};

    /// Helper to create a test database pool with migrations applied
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/rentora_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    /// Insert a user with an open wallet and return their ID
    async fn seed_user(pool: &PgPool, balance: i64) -> Uuid {
        let id = Uuid::new_v4();
        let phone = format!("09{:08}", id.as_u128() % 100_000_000);

        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, email, phone, password_hash, role, kyc_status)
            VALUES ($1, $2, $3, $4, 'test-hash', 'user', 'approved')
            "#,
        )
        .bind(id)
        .bind(format!("Ledger User {}", &id.to_string()[..13]))
        .bind(format!("{}@test.dev", id))
        .bind(phone)
        .execute(pool)
        .await
        .expect("Failed to seed user");

        sqlx::query("INSERT INTO wallets (user_id, balance) VALUES ($1, $2)")
            .bind(id)
            .bind(balance)
            .execute(pool)
            .await
            .expect("Failed to seed wallet");

        id
    }

    async fn balance_of(pool: &PgPool, user_id: Uuid) -> i64 {
        let (balance,): (i64,) = sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("Wallet should exist");
        balance
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_credit_and_debit_write_signed_ledger_rows() {
        let pool = setup_test_db().await;
        let user_id = seed_user(&pool, 0).await;

        let mut tx = pool.begin().await.unwrap();
        let row = WalletLedger::credit(
            &mut *tx,
            user_id,
            None,
            1_000,
            WalletTxType::Income,
            "test credit",
        )
        .await
        .expect("Credit should succeed");
        assert_eq!(row.amount, 1_000);

        let row = WalletLedger::debit(
            &mut *tx,
            user_id,
            None,
            400,
            WalletTxType::Payment,
            "test debit",
        )
        .await
        .expect("Debit should succeed");
        assert_eq!(row.amount, -400);
        tx.commit().await.unwrap();

        assert_eq!(balance_of(&pool, user_id).await, 600);

        // The signed ledger sums to the balance
        let (sum,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM wallet_transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(sum, 600);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_debit_fails_on_insufficient_funds() {
        let pool = setup_test_db().await;
        let user_id = seed_user(&pool, 100).await;

        let mut tx = pool.begin().await.unwrap();
        let result = WalletLedger::debit(
            &mut *tx,
            user_id,
            None,
            500,
            WalletTxType::Payment,
            "overdraft attempt",
        )
        .await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                available: 100,
                requested: 500
            })
        ));
        tx.rollback().await.unwrap();

        // Balance untouched, no ledger row written
        assert_eq!(balance_of(&pool, user_id).await, 100);
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM wallet_transactions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_non_positive_amounts_are_rejected() {
        let pool = setup_test_db().await;
        let user_id = seed_user(&pool, 100).await;

        let mut tx = pool.begin().await.unwrap();
        let result =
            WalletLedger::credit(&mut *tx, user_id, None, 0, WalletTxType::Refund, "zero").await;
        assert!(matches!(result, Err(LedgerError::NonPositiveAmount(0))));

        let result =
            WalletLedger::debit(&mut *tx, user_id, None, -5, WalletTxType::Payment, "negative")
                .await;
        assert!(matches!(result, Err(LedgerError::NonPositiveAmount(-5))));
        tx.rollback().await.unwrap();
    }

    /// Seed a booking directly in `returning`, returned `hours_ago` hours ago
    async fn seed_returning_booking(
        pool: &PgPool,
        renter_id: Uuid,
        owner_id: Uuid,
        deposit_fee: i64,
        penalty_fee: i64,
        hours_ago: i64,
    ) -> (Uuid, Uuid) {
        let shop_id = Uuid::new_v4();
        sqlx::query("INSERT INTO shops (id, name, owner_id) VALUES ($1, $2, $3)")
            .bind(shop_id)
            .bind(format!("Shop {}", shop_id))
            .bind(owner_id)
            .execute(pool)
            .await
            .unwrap();

        let product_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO products (id, shop_id, name, price_per_day, quantity) VALUES ($1, $2, 'Tent', 100, 0)",
        )
        .bind(product_id)
        .bind(shop_id)
        .execute(pool)
        .await
        .unwrap();

        let booking_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, renter_id, owner_id, product_id, quantity,
                start_date, end_date, days, price_per_day,
                rent_fee, shipping_fee, deposit_fee, total_price,
                penalty_fee, status, returned_at
            )
            VALUES (
                $1, $2, $3, $4, 1,
                CURRENT_DATE - 5, CURRENT_DATE - 2, 3, 100,
                300, 0, $5, $6,
                $7, 'returning', NOW() - make_interval(hours => $8)
            )
            "#,
        )
        .bind(booking_id)
        .bind(renter_id)
        .bind(owner_id)
        .bind(product_id)
        .bind(deposit_fee)
        .bind(300 + deposit_fee)
        .bind(penalty_fee)
        .bind(hours_ago as i32)
        .execute(pool)
        .await
        .unwrap();

        (booking_id, product_id)
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_auto_refund_settles_stuck_booking() {
        let pool = setup_test_db().await;
        let renter_id = seed_user(&pool, 0).await;
        let owner_id = seed_user(&pool, 0).await;

        // Returned 48h ago with a 100 penalty; grace is 24h
        let (booking_id, product_id) =
            seed_returning_booking(&pool, renter_id, owner_id, 500, 100, 48).await;

        let job = AutoRefundJob::new(pool.clone(), 24);
        let outcome = job.run_once().await.expect("Batch should succeed");
        assert!(outcome.processed >= 1);
        assert!(outcome.refunded >= 1);

        // deposit 500 - penalty 100 => 400 back to the renter
        assert_eq!(balance_of(&pool, renter_id).await, 400);

        let (status,): (String,) =
            sqlx::query_as("SELECT status::text FROM bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "completed");

        // Stock restored
        let (quantity,): (i32,) = sqlx::query_as("SELECT quantity FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(quantity, 1);

        // The refund is recorded as a refund-type ledger row
        let (tx_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM wallet_transactions WHERE booking_id = $1 AND tx_type = 'refund' AND amount = 400",
        )
        .bind(booking_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tx_count, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_auto_refund_skips_bookings_inside_grace_period() {
        let pool = setup_test_db().await;
        let renter_id = seed_user(&pool, 0).await;
        let owner_id = seed_user(&pool, 0).await;

        // Returned only 2h ago; grace is 24h
        let (booking_id, _) =
            seed_returning_booking(&pool, renter_id, owner_id, 500, 0, 2).await;

        let job = AutoRefundJob::new(pool.clone(), 24);
        job.run_once().await.expect("Batch should succeed");

        let (status,): (String,) =
            sqlx::query_as("SELECT status::text FROM bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "returning");
        assert_eq!(balance_of(&pool, renter_id).await, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_auto_refund_failure_is_isolated_to_its_booking() {
        let pool = setup_test_db().await;
        let healthy_renter = seed_user(&pool, 0).await;
        let healthy_owner = seed_user(&pool, 0).await;
        let broken_renter = seed_user(&pool, 0).await;
        let broken_owner = seed_user(&pool, 0).await;

        let (healthy_id, _) =
            seed_returning_booking(&pool, healthy_renter, healthy_owner, 500, 0, 48).await;
        let (broken_id, _) =
            seed_returning_booking(&pool, broken_renter, broken_owner, 500, 0, 48).await;

        // Break the second booking's refund path: its renter has no wallet
        sqlx::query("DELETE FROM wallets WHERE user_id = $1")
            .bind(broken_renter)
            .execute(&pool)
            .await
            .unwrap();

        let job = AutoRefundJob::new(pool.clone(), 24);
        let outcome = job.run_once().await.expect("Batch should succeed");
        assert!(outcome.refunded >= 1);
        assert!(outcome.failed >= 1);

        // The healthy booking settled and its renter got the deposit back
        assert_eq!(balance_of(&pool, healthy_renter).await, 500);
        let (status,): (String,) =
            sqlx::query_as("SELECT status::text FROM bookings WHERE id = $1")
                .bind(healthy_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "completed");

        // The broken booking rolled back untouched, ready for a later retry
        let (status,): (String,) =
            sqlx::query_as("SELECT status::text FROM bookings WHERE id = $1")
                .bind(broken_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "returning");
        let (tx_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM wallet_transactions WHERE booking_id = $1")
                .bind(broken_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(tx_count, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_auto_refund_with_penalty_exceeding_deposit_refunds_nothing() {
        let pool = setup_test_db().await;
        let renter_id = seed_user(&pool, 0).await;
        let owner_id = seed_user(&pool, 0).await;

        let (booking_id, _) =
            seed_returning_booking(&pool, renter_id, owner_id, 200, 450, 48).await;

        let job = AutoRefundJob::new(pool.clone(), 24);
        job.run_once().await.expect("Batch should succeed");

        // Refund floors at zero; the booking still completes
        assert_eq!(balance_of(&pool, renter_id).await, 0);
        let (status,): (String,) =
            sqlx::query_as("SELECT status::text FROM bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "completed");
    }
}
