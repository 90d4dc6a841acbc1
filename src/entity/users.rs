use sea_orm::entity::prelude::*;

use crate::middleware::auth::{ROLE_ADMIN, ROLE_USER};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub surname: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub card_details: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Model {
    pub fn role(&self) -> &'static str {
        if self.is_admin { ROLE_ADMIN } else { ROLE_USER }
    }
}

impl ActiveModelBehavior for ActiveModel {}
