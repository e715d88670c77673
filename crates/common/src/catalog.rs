//! Typed shapes of the store API
//!
//! Only the fields the suites assert on are modeled; everything else the
//! API returns is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// One product as returned by the catalog endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub is_rental: bool,
    #[serde(default)]
    pub is_location_offer: bool,
}

/// Paginated response of `GET /products`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub data: Vec<Product>,
    pub total: u64,
    #[serde(default)]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

/// Response of `GET /products/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    pub data: Vec<Product>,
}

/// Body of `POST /users/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of a successful `POST /users/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}
