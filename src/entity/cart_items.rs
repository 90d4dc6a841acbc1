use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub selected_extras: Json,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::food_items::Entity",
        from = "Column::FoodId",
        to = "super::food_items::Column::Id",
        on_delete = "Cascade"
    )]
    FoodItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::food_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
