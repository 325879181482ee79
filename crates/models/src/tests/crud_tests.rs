use crate::db::connect;
use crate::{category, permission, product, role, user};
use anyhow::Result;
use migration::MigratorTrait;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

/// Setup test database with migrations, or `None` when no database is
/// reachable (CI without postgres).
async fn setup_test_db() -> Result<Option<DatabaseConnection>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(None);
    }
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return Ok(None);
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return Ok(None);
    }
    Ok(Some(db))
}

#[tokio::test]
async fn test_user_crud() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let email = format!("test_{}@example.com", Uuid::new_v4());
    let created = user::create(&db, "Test User", &email).await?;
    assert_eq!(created.email, email);
    assert!(created.active);

    let found = user::Entity::find_by_id(created.id).one(&db).await?;
    assert!(found.is_some());
    assert_eq!(found.unwrap().email, email);

    let by_email = user::find_by_email(&db, &email).await?;
    assert_eq!(by_email.unwrap().id, created.id);

    user::hard_delete(&db, created.id).await?;
    let gone = user::Entity::find_by_id(created.id).one(&db).await?;
    assert!(gone.is_none());
    Ok(())
}

#[tokio::test]
async fn test_user_create_rejects_bad_input() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    assert!(user::create(&db, "No At Sign", "not-an-email").await.is_err());
    assert!(user::create(&db, "   ", "a@b.com").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_role_permission_crud() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let role_name = format!("test_role_{}", Uuid::new_v4());
    let created_role = role::create(&db, &role_name, Some("test role")).await?;
    assert_eq!(created_role.name, role_name);

    let found = role::find_by_name(&db, &role_name).await?;
    assert_eq!(found.unwrap().id, created_role.id);

    let perm_name = format!("TEST_PERM_{}", Uuid::new_v4());
    let created_perm = permission::create(&db, &perm_name, None).await?;
    let found_perm = permission::find_by_name(&db, &perm_name).await?;
    assert_eq!(found_perm.unwrap().id, created_perm.id);

    permission::Entity::delete_by_id(created_perm.id).exec(&db).await?;
    role::Entity::delete_by_id(created_role.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_product_crud() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let cat_name = format!("test_cat_{}", Uuid::new_v4());
    let cat = category::create(&db, &cat_name, Some("test category")).await?;

    let created = product::create(&db, product::NewProduct {
        name: "Test Widget",
        description: None,
        price: Decimal::new(4999, 2),
        image_url: Some("https://example.com/widget.png"),
        stock: 42,
        active: true,
        category_id: Some(cat.id),
    }).await?;
    assert_eq!(created.stock, 42);
    assert_eq!(created.price, Decimal::new(4999, 2));

    // Products of a category
    let in_cat = product::Entity::find()
        .filter(product::Column::CategoryId.eq(cat.id))
        .all(&db)
        .await?;
    assert!(in_cat.iter().any(|p| p.id == created.id));

    let updated = product::set_stock(&db, created.id, 40).await?;
    assert_eq!(updated.stock, 40);
    assert!(product::set_stock(&db, created.id, -1).await.is_err());

    product::Entity::delete_by_id(created.id).exec(&db).await?;
    category::Entity::delete_by_id(cat.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_product_create_rejects_negative_price() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let res = product::create(&db, product::NewProduct {
        name: "Bad Widget",
        description: None,
        price: Decimal::new(-100, 2),
        image_url: None,
        stock: 1,
        active: true,
        category_id: None,
    }).await;
    assert!(res.is_err());
    Ok(())
}
