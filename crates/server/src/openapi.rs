use rust_decimal::Decimal;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct SignupRequest { pub name: String, pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
    pub active: bool,
}

#[derive(ToSchema)]
pub struct ShippingAddressRequest {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub extra: Option<String>,
}

#[derive(ToSchema)]
pub struct PaymentInfoRequest {
    /// CARD, PAYPAL, BANK_TRANSFER or CASH_ON_DELIVERY
    pub method: String,
    pub reference: Option<String>,
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct CheckoutRequest {
    pub shipping: ShippingAddressRequest,
    pub payment: PaymentInfoRequest,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::auth::login,
        crate::auth::signup,
        crate::auth::me,
        crate::routes::products::list,
        crate::routes::products::create,
        crate::routes::cart::get,
        crate::routes::cart::add_product,
        crate::routes::orders::create,
        crate::routes::orders::update_status,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            SignupRequest,
            ProductRequest,
            ShippingAddressRequest,
            PaymentInfoRequest,
            CheckoutRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "catalog"),
        (name = "cart"),
        (name = "orders")
    )
)]
pub struct ApiDoc;
