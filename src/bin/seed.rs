use restaurant_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        food_items::{ActiveModel as FoodActive, Column as FoodCol, Entity as FoodItems},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    models::Extra,
    services::auth_service::hash_password,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    ActiveValue::NotSet,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,restaurant_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Admin", "admin@example.com", "admin123", true).await?;
    let user_id = ensure_user(&orm, "Thandi", "user@example.com", "user123", false).await?;
    seed_menu(&orm).await?;

    tracing::info!(%admin_id, %user_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        let id = existing.id;
        if existing.is_admin != is_admin {
            let mut active: UserActive = existing.into();
            active.is_admin = Set(is_admin);
            active.update(orm).await?;
        }
        tracing::info!(email, is_admin, "user already present");
        return Ok(id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        surname: Set(None),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        contact_number: Set(None),
        address: Set(Some("12 Long Street, Cape Town".to_string())),
        card_details: Set(None),
        is_admin: Set(is_admin),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(orm)
    .await?;

    tracing::info!(email, is_admin, "user created");
    Ok(user.id)
}

fn extra(id: &str, name: &str, price: i64) -> Extra {
    Extra {
        id: id.to_string(),
        name: name.to_string(),
        price,
    }
}

async fn seed_menu(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let menu = vec![
        (
            "Burger",
            "Flame-grilled beef patty on a toasted bun",
            9000,
            "burgers",
            vec![
                extra("cheese", "Extra Cheese", 1000),
                extra("bacon", "Bacon", 1500),
            ],
        ),
        (
            "Chicken Burger",
            "Crumbed chicken breast with mayo",
            8500,
            "burgers",
            vec![extra("cheese", "Extra Cheese", 1000)],
        ),
        ("Fries", "Hand-cut and salted", 4000, "sides", vec![
            extra("large", "Large Portion", 1500),
        ]),
        ("Onion Rings", "Beer-battered onion rings", 4500, "sides", vec![]),
        ("Milkshake", "Vanilla, chocolate or strawberry", 5500, "drinks", vec![]),
        ("Cola", "330ml can", 2000, "drinks", vec![]),
    ];

    for (name, description, price, food_type, extras) in menu {
        let exists = FoodItems::find()
            .filter(FoodCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        FoodActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            image: Set(None),
            food_type: Set(food_type.to_string()),
            extras: Set(serde_json::to_value(&extras)?),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(orm)
        .await?;
        tracing::info!(name, price, "menu item created");
    }

    Ok(())
}
