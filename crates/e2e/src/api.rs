//! Typed client for the store API
//!
//! Responses are asserted on explicitly: a non-2xx status or a body that
//! does not match the expected shape is a check failure, never something to
//! recover from.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use toolshop_common::{
    Credentials, Error, LoginRequest, Product, ProductPage, RunConfig, SearchPage, TokenResponse,
};

use crate::error::{E2eError, E2eResult};

/// Client for the store API
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(message.into()))
    }
}

impl ApiClient {
    /// Build a client with the configured default headers
    pub fn new(config: &RunConfig) -> E2eResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.api_headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::InvalidConfig(format!("header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidConfig(format!("header value: {}", e)))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    async fn expect_ok(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> E2eResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(E2eError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// `GET /products` - first page of the catalog
    pub async fn products(&self) -> E2eResult<ProductPage> {
        let url = format!("{}/products", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = self.expect_ok("GET /products", response).await?;
        Ok(response.json().await?)
    }

    /// `GET /products/search?q=...`
    pub async fn search(&self, query: &str) -> E2eResult<SearchPage> {
        let url = format!("{}/products/search", self.base_url);
        let response = self.client.get(&url).query(&[("q", query)]).send().await?;
        let response = self.expect_ok("GET /products/search", response).await?;
        Ok(response.json().await?)
    }

    /// `GET /products/{id}`
    pub async fn product(&self, id: &str) -> E2eResult<Product> {
        let url = format!("{}/products/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;
        let response = self.expect_ok("GET /products/{id}", response).await?;
        Ok(response.json().await?)
    }

    /// `POST /users/login`
    pub async fn login(&self, credentials: &Credentials) -> E2eResult<TokenResponse> {
        let url = format!("{}/users/login", self.base_url);
        let body = LoginRequest {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
        };
        let response = self.client.post(&url).json(&body).send().await?;
        let response = self.expect_ok("POST /users/login", response).await?;
        Ok(response.json().await?)
    }

    // Named checks the api project executes

    /// First catalog page is the seeded dataset: 9 items of 50
    pub async fn check_products_first_page(&self) -> E2eResult<()> {
        let page = self.products().await?;
        ensure(
            page.data.len() == 9,
            format!("expected 9 products on the first page, got {}", page.data.len()),
        )?;
        ensure(
            page.total == 50,
            format!("expected a total of 50 products, got {}", page.total),
        )?;
        Ok(())
    }

    /// Valid credentials yield a non-empty bearer token expiring in 300s
    pub async fn check_login_token(&self, credentials: &Credentials) -> E2eResult<()> {
        let token = self.login(credentials).await?;
        ensure(!token.access_token.is_empty(), "access_token is empty")?;
        ensure(
            token.expires_in == 300,
            format!("expected expires_in 300, got {}", token.expires_in),
        )?;
        Ok(())
    }

    /// Search resolves "Thor Hammer" and its detail fields hold
    pub async fn check_thor_hammer_detail(&self) -> E2eResult<()> {
        let results = self.search("thor hammer").await?;
        let first = results
            .data
            .first()
            .ok_or_else(|| E2eError::AssertionFailed("no search results for thor hammer".into()))?;

        debug!(id = %first.id, "resolved product id from search");
        let detail = self.product(&first.id).await?;

        ensure(
            detail.name == "Thor Hammer",
            format!("expected name Thor Hammer, got {}", detail.name),
        )?;
        ensure(detail.in_stock, "expected Thor Hammer to be in stock")?;
        ensure(!detail.is_rental, "expected Thor Hammer not to be a rental")?;
        ensure(
            !detail.is_location_offer,
            "expected Thor Hammer not to be a location offer",
        )?;
        ensure(
            (detail.price - 11.14).abs() < f64::EPSILON * 100.0,
            format!("expected price 11.14, got {}", detail.price),
        )?;
        Ok(())
    }
}
