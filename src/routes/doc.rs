use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{Dashboard, DashboardStats, DayCount, DayRevenue, RecentOrder},
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        cart::{AddToCartRequest, CartLine, CartView, ClearCartResponse, UpdateCartItemRequest},
        foods::{FoodList, UpdateFoodRequest},
        orders::{
            AdminOrder, AdminOrderList, CreateOrderRequest, OrderCustomer, OrderList,
            UpdateOrderStatusRequest,
        },
        payment::{CreatePaymentIntentRequest, PaymentIntentResponse, WebhookAck},
        users::UpdateProfileRequest,
    },
    models::{CartItem, Extra, FoodItem, Order, OrderLine, OrderStatus, PaymentStatus, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, foods, health, orders, params, payment, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        foods::list_foods,
        foods::get_food,
        foods::create_food,
        foods::update_food,
        foods::replace_image,
        foods::delete_food,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::place_order,
        orders::list_orders,
        orders::my_orders,
        orders::get_order,
        orders::update_order_status,
        payment::create_payment_intent,
        payment::webhook,
        users::get_profile,
        users::update_profile,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::dashboard
    ),
    components(
        schemas(
            User,
            Extra,
            FoodItem,
            CartItem,
            Order,
            OrderLine,
            OrderStatus,
            PaymentStatus,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            foods::CreateFoodForm,
            foods::ImageForm,
            UpdateFoodRequest,
            FoodList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartView,
            ClearCartResponse,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderCustomer,
            AdminOrder,
            AdminOrderList,
            CreatePaymentIntentRequest,
            PaymentIntentResponse,
            WebhookAck,
            UpdateProfileRequest,
            Dashboard,
            DashboardStats,
            RecentOrder,
            DayCount,
            DayRevenue,
            health::HealthData,
            params::Pagination,
            params::FoodQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<FoodItem>,
            ApiResponse<FoodList>,
            ApiResponse<CartView>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<AdminOrderList>,
            ApiResponse<Dashboard>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Foods", description = "Menu catalog"),
        (name = "Cart", description = "Cart of the current user"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Payment", description = "Payment intents and provider webhooks"),
        (name = "Users", description = "Profile of the current user"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/foods",
            "/api/cart",
            "/api/orders",
            "/api/orders/my-orders",
            "/api/payment/create-payment-intent",
            "/api/payment/webhook",
            "/api/users/profile",
            "/api/admin/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
