/// CRUD operations tests for all models
pub mod crud_tests;

/// Integration tests combining multiple components
pub mod integration_tests {
    use crate::db::connect;
    use crate::{action_log, cart, cart_item, category, product, role, user, user_role};
    use anyhow::Result;
    use migration::MigratorTrait;
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};
    use uuid::Uuid;

    /// Test complete workflow: user -> role -> category -> product -> cart
    #[tokio::test]
    async fn test_complete_workflow() -> Result<()> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match connect().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };
        if let Err(e) = migration::Migrator::up(&db, None).await {
            eprintln!("skip: migrate up failed: {}", e);
            return Ok(());
        }

        // Create user
        let email = format!("workflow_{}@example.com", Uuid::new_v4());
        let test_user = user::create(&db, "Workflow User", &email).await?;

        // Create role and assign it
        let role_name = format!("workflow_role_{}", Uuid::new_v4());
        let test_role = role::create(&db, &role_name, Some("workflow role")).await?;
        let link = user_role::ActiveModel {
            user_id: Set(test_user.id),
            role_id: Set(test_role.id),
        };
        link.insert(&db).await?;

        // Create category and product
        let cat_name = format!("workflow_cat_{}", Uuid::new_v4());
        let test_cat = category::create(&db, &cat_name, None).await?;
        let test_product = product::create(&db, product::NewProduct {
            name: "Workflow Widget",
            description: Some("integration test widget"),
            price: Decimal::new(1999, 2),
            image_url: None,
            stock: 5,
            active: true,
            category_id: Some(test_cat.id),
        }).await?;
        assert_eq!(test_product.category_id, Some(test_cat.id));

        // Create cart with one line
        let test_cart = cart::create_for_user(&db, test_user.id).await?;
        let line = cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(test_cart.id),
            product_id: Set(test_product.id),
            quantity: Set(2),
            unit_price: Set(test_product.price),
            subtotal: Set(test_product.price * Decimal::from(2)),
        };
        let test_line = line.insert(&db).await?;

        // Record an audit entry
        let entry = action_log::create(&db, test_user.id, "workflow test entry").await?;
        assert_eq!(entry.user_id, test_user.id);

        // Verify linkage
        let found_cart = cart::find_by_user(&db, test_user.id).await?;
        assert!(found_cart.is_some());
        let found_line = cart_item::Entity::find_by_id(test_line.id).one(&db).await?;
        assert_eq!(found_line.unwrap().cart_id, test_cart.id);

        // Cleanup: user delete cascades to cart, items, links and log entries
        user::hard_delete(&db, test_user.id).await?;
        let gone = cart::find_by_user(&db, test_user.id).await?;
        assert!(gone.is_none());
        role::Entity::delete_by_id(test_role.id).exec(&db).await?;
        product::Entity::delete_by_id(test_product.id).exec(&db).await?;
        category::Entity::delete_by_id(test_cat.id).exec(&db).await?;
        Ok(())
    }
}
