//! Booking lifecycle integration tests
//!
//! The `#[ignore]` tests run against a real Postgres database pointed at by
//! TEST_DATABASE_URL (migrations are applied on connect). Run them with
//! `cargo test -- --ignored`.

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, Utc};
    use sqlx::PgPool;
    use uuid::Uuid;
    use validator::Validate;

    use rentora_server::models::UserRole;
    use rentora_server::rental::{
        Actor, BookingStatus, CreateRentalRequest, RentalError, RentalService, TransitionCommand,
    };

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
        let phone = format!("08{:08}", id.as_u128() % 100_000_000);

        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, email, phone, password_hash, role, kyc_status)
            VALUES ($1, $2, $3, $4, 'test-hash', 'user', 'approved')
            "#,
        )
        .bind(id)
        .bind(format!("Test User {}", &id.to_string()[..13]))
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

    /// Insert a shop and a product for the owner; returns the product ID
    async fn seed_product(pool: &PgPool, owner_id: Uuid, price_per_day: i64, quantity: i32) -> Uuid {
        let shop_id = Uuid::new_v4();
        sqlx::query("INSERT INTO shops (id, name, owner_id) VALUES ($1, $2, $3)")
            .bind(shop_id)
            .bind(format!("Shop {}", shop_id))
            .bind(owner_id)
            .execute(pool)
            .await
            .expect("Failed to seed shop");

        let product_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO products (id, shop_id, name, price_per_day, quantity) VALUES ($1, $2, 'Camera', $3, $4)",
        )
        .bind(product_id)
        .bind(shop_id)
        .bind(price_per_day)
        .bind(quantity)
        .execute(pool)
        .await
        .expect("Failed to seed product");

        product_id
    }

    async fn wallet_balance(pool: &PgPool, user_id: Uuid) -> i64 {
        let (balance,): (i64,) = sqlx::query_as("SELECT balance FROM wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("Wallet should exist");
        balance
    }

    async fn product_stock(pool: &PgPool, product_id: Uuid) -> i32 {
        let (quantity,): (i32,) = sqlx::query_as("SELECT quantity FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(pool)
            .await
            .expect("Product should exist");
        quantity
    }

    fn user(id: Uuid) -> Actor {
        Actor {
            id,
            role: UserRole::User,
        }
    }

    fn admin() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: UserRole::Admin,
        }
    }

    fn booking_request(product_id: Uuid, days: i64) -> CreateRentalRequest {
        let start_date = Utc::now().date_naive() + Duration::days(1);
        CreateRentalRequest {
            product_id,
            start_date,
            end_date: start_date + Duration::days(days),
            quantity: 1,
            shipping_fee: 50,
            deposit_fee: 500,
        }
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreateRentalRequest {
            product_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            quantity: 0,
            shipping_fee: -10,
            deposit_fee: 0,
        };
        assert!(req.validate().is_err());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_full_happy_path_lifecycle() {
        let pool = setup_test_db().await;
        let service = RentalService::new(pool.clone(), 24);

        let owner_id = seed_user(&pool, 0).await;
        let renter_id = seed_user(&pool, 10_000).await;
        let product_id = seed_product(&pool, owner_id, 100, 5).await;

        // 3 days x 100 + 50 shipping + 500 deposit = 850 total
        let booking = service
            .create(renter_id, booking_request(product_id, 3))
            .await
            .expect("Booking creation should succeed");
        assert_eq!(booking.status, BookingStatus::PendingOwner);
        assert_eq!(booking.days, 3);
        assert_eq!(booking.rent_fee, 300);
        assert_eq!(booking.total_price, 850);

        // Owner approves; stock is reserved
        let booking = service
            .owner_approve(booking.id, user(owner_id))
            .await
            .expect("Approve should succeed");
        assert_eq!(booking.status, BookingStatus::WaitingPayment);
        assert_eq!(product_stock(&pool, product_id).await, 4);

        // Renter submits the slip
        let booking = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Pay {
                    proof_url: "https://img.test/slip.jpg".to_string(),
                },
            )
            .await
            .expect("Pay should succeed");
        assert_eq!(booking.status, BookingStatus::WaitingAdminVerify);

        // Admin verifies; the renter's wallet is debited the full total
        let booking = service
            .apply(booking.id, admin(), TransitionCommand::AdminVerify)
            .await
            .expect("Admin verify should succeed");
        assert_eq!(booking.status, BookingStatus::Paid);
        assert_eq!(wallet_balance(&pool, renter_id).await, 10_000 - 850);

        // Owner ships
        let booking = service
            .apply(
                booking.id,
                user(owner_id),
                TransitionCommand::Ship {
                    proof_url: "https://img.test/box.jpg".to_string(),
                    shipping_company: "Kerry".to_string(),
                    tracking_number: "TH0001".to_string(),
                },
            )
            .await
            .expect("Ship should succeed");
        assert_eq!(booking.status, BookingStatus::Shipped);

        // Renter receives; owner is paid rent + shipping
        let booking = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Receive {
                    proof_url: "https://img.test/received.jpg".to_string(),
                },
            )
            .await
            .expect("Receive should succeed");
        assert_eq!(booking.status, BookingStatus::Received);
        assert_eq!(wallet_balance(&pool, owner_id).await, 350);

        // Renter returns on time; no penalty
        let booking = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Return {
                    proof_url: "https://img.test/return.jpg".to_string(),
                    shipping_company: "Kerry".to_string(),
                    tracking_number: "TH0002".to_string(),
                },
            )
            .await
            .expect("Return should succeed");
        assert_eq!(booking.status, BookingStatus::Returning);
        assert_eq!(booking.penalty_fee, 0);

        // Owner verifies with 100 damage; deposit splits 400/100
        let booking = service
            .apply(
                booking.id,
                user(owner_id),
                TransitionCommand::Verify {
                    damage_fee: Some(100),
                },
            )
            .await
            .expect("Verify should succeed");
        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(booking.damage_fee, 100);
        assert_eq!(wallet_balance(&pool, renter_id).await, 10_000 - 850 + 400);
        assert_eq!(wallet_balance(&pool, owner_id).await, 350 + 100);

        // Stock is back after the item returns
        assert_eq!(product_stock(&pool, product_id).await, 5);

        // Ledger rows sum to each wallet's balance delta
        let (renter_sum,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM wallet_transactions WHERE user_id = $1",
        )
        .bind(renter_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(renter_sum, -850 + 400);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_owner_reject_is_terminal() {
        let pool = setup_test_db().await;
        let service = RentalService::new(pool.clone(), 24);

        let owner_id = seed_user(&pool, 0).await;
        let renter_id = seed_user(&pool, 1_000).await;
        let product_id = seed_product(&pool, owner_id, 100, 2).await;

        let booking = service
            .create(renter_id, booking_request(product_id, 2))
            .await
            .unwrap();

        let booking = service
            .apply(booking.id, user(owner_id), TransitionCommand::Reject)
            .await
            .expect("Reject should succeed");
        assert_eq!(booking.status, BookingStatus::Rejected);

        // Stock was never reserved
        assert_eq!(product_stock(&pool, product_id).await, 2);

        // No further transitions are accepted
        let result = service.owner_approve(booking.id, user(owner_id)).await;
        assert!(matches!(result, Err(RentalError::InvalidState { .. })));

        let result = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Pay {
                    proof_url: "https://img.test/slip.jpg".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(RentalError::Terminal(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_approvals_reserve_last_unit_once() {
        let pool = setup_test_db().await;
        let service = RentalService::new(pool.clone(), 24);

        let owner_id = seed_user(&pool, 0).await;
        let renter_a = seed_user(&pool, 1_000).await;
        let renter_b = seed_user(&pool, 1_000).await;
        let product_id = seed_product(&pool, owner_id, 100, 1).await;

        // Two pending bookings competing for the single unit in stock
        let booking_a = service
            .create(renter_a, booking_request(product_id, 2))
            .await
            .unwrap();
        let booking_b = service
            .create(renter_b, booking_request(product_id, 2))
            .await
            .unwrap();

        let (result_a, result_b) = tokio::join!(
            service.owner_approve(booking_a.id, user(owner_id)),
            service.owner_approve(booking_b.id, user(owner_id)),
        );

        // Exactly one approval wins; the loser sees the stock gone under the
        // product row lock
        assert_eq!(
            result_a.is_ok() as u8 + result_b.is_ok() as u8,
            1,
            "exactly one of the two approvals should succeed"
        );
        let loser = if result_a.is_ok() { result_b } else { result_a };
        assert!(matches!(loser, Err(RentalError::OutOfStock)));

        // Stock was decremented exactly once
        assert_eq!(product_stock(&pool, product_id).await, 0);

        // One booking reserved, the other still awaiting the owner
        let (approved,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE product_id = $1 AND status = 'waiting_payment'",
        )
        .bind(product_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(approved, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_role_gates_reject_wrong_actor() {
        let pool = setup_test_db().await;
        let service = RentalService::new(pool.clone(), 24);

        let owner_id = seed_user(&pool, 0).await;
        let renter_id = seed_user(&pool, 10_000).await;
        let stranger_id = seed_user(&pool, 0).await;
        let product_id = seed_product(&pool, owner_id, 100, 2).await;

        let booking = service
            .create(renter_id, booking_request(product_id, 2))
            .await
            .unwrap();

        // Renter cannot approve their own request
        let result = service.owner_approve(booking.id, user(renter_id)).await;
        assert!(matches!(result, Err(RentalError::Forbidden(_))));

        let booking = service
            .owner_approve(booking.id, user(owner_id))
            .await
            .unwrap();

        // A third party cannot pay
        let result = service
            .apply(
                booking.id,
                user(stranger_id),
                TransitionCommand::Pay {
                    proof_url: "https://img.test/slip.jpg".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(RentalError::Forbidden(_))));

        // A non-admin cannot verify payment
        let booking = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Pay {
                    proof_url: "https://img.test/slip.jpg".to_string(),
                },
            )
            .await
            .unwrap();
        let result = service
            .apply(booking.id, user(owner_id), TransitionCommand::AdminVerify)
            .await;
        assert!(matches!(result, Err(RentalError::Forbidden(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_create_rejects_self_rental_and_out_of_stock() {
        let pool = setup_test_db().await;
        let service = RentalService::new(pool.clone(), 24);

        let owner_id = seed_user(&pool, 0).await;
        let renter_id = seed_user(&pool, 1_000).await;
        let product_id = seed_product(&pool, owner_id, 100, 1).await;

        // Owner renting their own product
        let result = service
            .create(owner_id, booking_request(product_id, 2))
            .await;
        assert!(matches!(result, Err(RentalError::Validation(_))));

        // Quantity above stock
        let mut req = booking_request(product_id, 2);
        req.quantity = 3;
        let result = service.create(renter_id, req).await;
        assert!(matches!(result, Err(RentalError::OutOfStock)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_insufficient_funds_keeps_booking_unpaid() {
        let pool = setup_test_db().await;
        let service = RentalService::new(pool.clone(), 24);

        let owner_id = seed_user(&pool, 0).await;
        let renter_id = seed_user(&pool, 100).await; // well below the total
        let product_id = seed_product(&pool, owner_id, 100, 1).await;

        let booking = service
            .create(renter_id, booking_request(product_id, 3))
            .await
            .unwrap();
        let booking = service
            .owner_approve(booking.id, user(owner_id))
            .await
            .unwrap();
        let booking = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Pay {
                    proof_url: "https://img.test/slip.jpg".to_string(),
                },
            )
            .await
            .unwrap();

        let result = service
            .apply(booking.id, admin(), TransitionCommand::AdminVerify)
            .await;
        assert!(matches!(result, Err(RentalError::Ledger(_))));

        // Everything rolled back: status unchanged, wallet untouched
        let booking = service.get(booking.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::WaitingAdminVerify);
        assert_eq!(wallet_balance(&pool, renter_id).await, 100);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_missed_payment_window_expires_booking_and_restores_stock() {
        let pool = setup_test_db().await;
        let service = RentalService::new(pool.clone(), 24);

        let owner_id = seed_user(&pool, 0).await;
        let renter_id = seed_user(&pool, 10_000).await;
        let product_id = seed_product(&pool, owner_id, 100, 3).await;

        let booking = service
            .create(renter_id, booking_request(product_id, 2))
            .await
            .unwrap();
        let booking = service
            .owner_approve(booking.id, user(owner_id))
            .await
            .unwrap();
        assert_eq!(product_stock(&pool, product_id).await, 2);

        // Backdate the approval past the window
        sqlx::query("UPDATE bookings SET approved_at = NOW() - INTERVAL '25 hours' WHERE id = $1")
            .bind(booking.id)
            .execute(&pool)
            .await
            .unwrap();

        let result = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Pay {
                    proof_url: "https://img.test/slip.jpg".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(RentalError::PaymentWindowExpired)));

        // The expiry committed even though the caller got an error
        let booking = service.get(booking.id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Expired);
        assert_eq!(product_stock(&pool, product_id).await, 3);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_late_return_assesses_penalty_and_settles_deposit() {
        let pool = setup_test_db().await;
        let service = RentalService::new(pool.clone(), 24);

        let owner_id = seed_user(&pool, 0).await;
        let renter_id = seed_user(&pool, 10_000).await;
        let product_id = seed_product(&pool, owner_id, 100, 1).await;

        let booking = service
            .create(renter_id, booking_request(product_id, 2))
            .await
            .unwrap();
        let booking = service
            .owner_approve(booking.id, user(owner_id))
            .await
            .unwrap();
        let booking = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Pay {
                    proof_url: "https://img.test/slip.jpg".to_string(),
                },
            )
            .await
            .unwrap();
        let booking = service
            .apply(booking.id, admin(), TransitionCommand::AdminVerify)
            .await
            .unwrap();
        let booking = service
            .apply(
                booking.id,
                user(owner_id),
                TransitionCommand::Ship {
                    proof_url: "https://img.test/box.jpg".to_string(),
                    shipping_company: "Kerry".to_string(),
                    tracking_number: "TH0001".to_string(),
                },
            )
            .await
            .unwrap();
        let booking = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Receive {
                    proof_url: "https://img.test/received.jpg".to_string(),
                },
            )
            .await
            .unwrap();

        // Backdate the rental window so the return is one full day plus a
        // fraction late, which rounds up to 2 late days: 2 x 100 x 1.5 = 300
        sqlx::query(
            r#"
            UPDATE bookings
            SET start_date = CURRENT_DATE - 3, end_date = CURRENT_DATE - 1
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .execute(&pool)
        .await
        .unwrap();

        let booking = service
            .apply(
                booking.id,
                user(renter_id),
                TransitionCommand::Return {
                    proof_url: "https://img.test/return.jpg".to_string(),
                    shipping_company: "Kerry".to_string(),
                    tracking_number: "TH0002".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Returning);
        assert_eq!(booking.penalty_fee, 300);

        // Deposit 500 - penalty 300 - damage 0 => 200 back to the renter
        let balance_before = wallet_balance(&pool, renter_id).await;
        let booking = service
            .apply(
                booking.id,
                user(owner_id),
                TransitionCommand::Verify { damage_fee: None },
            )
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(
            wallet_balance(&pool, renter_id).await,
            balance_before + 200
        );
    }
}
