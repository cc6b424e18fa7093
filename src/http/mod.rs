//! JSON REST surface.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Database readiness
//!
//! POST   /register                  - Create account
//! POST   /login                     - Exchange credentials for a token
//! GET    /products                  - Catalog listing (page, limit, search)
//! GET    /products/{id}             - Product detail
//!
//! # Authenticated (Bearer token)
//! GET    /api/profile
//! GET    /api/cart                  - Cart with lines and total
//! POST   /api/cart                  - Add product to cart
//! DELETE /api/cart                  - Empty the cart
//! PUT    /api/cart/{item_id}        - Change line quantity
//! DELETE /api/cart/{item_id}        - Remove line
//! POST   /api/orders                - Place order from cart
//! GET    /api/orders                - Own orders (page, limit, status)
//! GET    /api/orders/{id}           - Own order with items
//! PUT    /api/orders/{id}/cancel    - Cancel own order
//!
//! # Admin
//! POST   /admin/products
//! PUT    /admin/products/{id}
//! DELETE /admin/products/{id}
//! GET    /admin/orders              - All orders (page, limit, status)
//! PUT    /admin/orders/{id}/status  - Status transition
//! ```

mod cart;
mod error;
mod extract;
mod orders;
mod products;
mod state;
mod users;

pub use extract::{AdminUser, CurrentUser};
pub use state::AppState;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::get))
        .nest("/api", api_routes())
        .nest("/admin", admin_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(users::profile))
        .route("/cart", get(cart::view).post(cart::add).delete(cart::clear))
        .route("/cart/{item_id}", put(cart::update).delete(cart::remove))
        .route("/orders", get(orders::list).post(orders::place))
        .route("/orders/{id}", get(orders::detail))
        .route("/orders/{id}/cancel", put(orders::cancel))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(products::create))
        .route("/products/{id}", put(products::update).delete(products::delete))
        .route("/orders", get(orders::list_all))
        .route("/orders/{id}/status", put(orders::update_status))
}

async fn health() -> &'static str {
    "ok"
}

/// 503 until the database answers.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
