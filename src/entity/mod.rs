pub mod cart_items;
pub mod food_items;
pub mod orders;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use food_items::Entity as FoodItems;
pub use orders::Entity as Orders;
pub use users::Entity as Users;
