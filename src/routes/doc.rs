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
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddLineRequest, CartLineDto, CartList, CartSummary, SetQuantityRequest},
        chat::{MessageList, SendMessageRequest},
        products,
        roles::{AccessDecision, RoleProfile},
    },
    models::{CartLine, Category, ChatMessage, MarketRole, Product, User, Vendor},
    response::{ApiResponse, Meta},
    routes::{auth, cart, chat, health, params, products as product_routes, roles},
    tier::Tier,
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
        health::db_health,
        auth::login,
        auth::register,
        cart::cart_list,
        cart::add_line,
        cart::set_quantity,
        cart::remove_line,
        cart::clear_cart,
        cart::cart_summary,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        roles::me,
        roles::access,
        chat::list_messages,
        chat::send_message,
        chat::room_events
    ),
    components(
        schemas(
            User,
            Product,
            Category,
            Vendor,
            CartLine,
            ChatMessage,
            MarketRole,
            Tier,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddLineRequest,
            SetQuantityRequest,
            CartList,
            CartLineDto,
            CartSummary,
            SendMessageRequest,
            MessageList,
            RoleProfile,
            AccessDecision,
            roles::AccessQuery,
            params::Pagination,
            params::ProductQuery,
            products::ProductList,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            health::HealthData,
            health::DbHealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<CartList>,
            ApiResponse<CartSummary>,
            ApiResponse<RoleProfile>,
            ApiResponse<AccessDecision>,
            ApiResponse<MessageList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Products", description = "Catalog browse and search"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Roles", description = "Role and tier gating"),
        (name = "Chat", description = "Room messages and change feed"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
