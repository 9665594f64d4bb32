//! Store REST client for product listings.
//!
//! All calls are blocking request/response with basic auth. Any non-2xx
//! status is an error naming the endpoint and status; there are no retries.
use crate::config::StoreConfig;
use anyhow::{anyhow, Context, Result};
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Upper bound the store API accepts for `per_page`.
pub const MAX_PAGE_SIZE: u32 = 10;

const PRODUCTS_PATH: &str = "wp-json/wc/v3/products";
const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";

/// A store product with the fields the optimizer reads and rewrites.
///
/// Both text fields are required: a record missing either one fails to
/// decode rather than feeding an empty value into the rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: String,
}

/// Identity of a product returned by listing, duplicating, or updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProductRef {
    pub id: u64,
}

/// Partial product update; `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }
}

/// Product catalog operations the workflow depends on.
pub trait Catalog {
    fn list_products(&self, page: u32, page_size: u32) -> Result<Vec<ProductRef>>;
    fn count_pages(&self, page_size: u32) -> Result<u32>;
    fn get_product(&self, id: u64) -> Result<Product>;
    fn duplicate_product(&self, id: u64) -> Result<ProductRef>;
    fn update_product(&self, id: u64, patch: &ProductPatch) -> Result<ProductRef>;
    /// Link to the product's edit screen in the store admin.
    fn edit_link(&self, id: u64) -> String;
}

/// HTTP implementation of [`Catalog`] against the store REST API.
pub struct StoreClient {
    agent: ureq::Agent,
    base_url: String,
    auth_header: String,
}

impl StoreClient {
    pub fn new(config: &StoreConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header: basic_auth_header(&config.consumer_key, &config.consumer_secret),
        }
    }

    fn products_url(&self) -> String {
        format!("{}/{PRODUCTS_PATH}", self.base_url)
    }

    fn product_url(&self, id: u64) -> String {
        format!("{}/{id}", self.products_url())
    }
}

impl Catalog for StoreClient {
    fn list_products(&self, page: u32, page_size: u32) -> Result<Vec<ProductRef>> {
        let url = self.products_url();
        let start = Instant::now();
        let response = self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .query("per_page", clamp_page_size(page_size).to_string())
            .query("page", page.to_string())
            .query("status", "publish")
            .call()
            .with_context(|| format!("GET {url} page {page}"))?;
        tracing::info!(
            page,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "store list products"
        );
        read_success_json(response, "GET", &url)
    }

    fn count_pages(&self, page_size: u32) -> Result<u32> {
        let url = self.products_url();
        let response = self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .query("per_page", clamp_page_size(page_size).to_string())
            .query("status", "publish")
            .call()
            .with_context(|| format!("GET {url}"))?;
        let status = response.status();
        tracing::info!(status = status.as_u16(), "store count pages");
        if !status.is_success() {
            return Err(anyhow!("GET {url} returned HTTP {}", status.as_u16()));
        }
        let header = response
            .headers()
            .get(TOTAL_PAGES_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(parse_total_pages(header))
    }

    fn get_product(&self, id: u64) -> Result<Product> {
        let url = self.product_url(id);
        let response = self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .call()
            .with_context(|| format!("GET {url}"))?;
        tracing::info!(
            product_id = id,
            status = response.status().as_u16(),
            "store get product"
        );
        read_success_json(response, "GET", &url)
    }

    fn duplicate_product(&self, id: u64) -> Result<ProductRef> {
        let url = format!("{}/duplicate", self.product_url(id));
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header)
            .send_empty()
            .with_context(|| format!("POST {url}"))?;
        tracing::info!(
            product_id = id,
            status = response.status().as_u16(),
            "store duplicate product"
        );
        read_success_json(response, "POST", &url)
    }

    fn update_product(&self, id: u64, patch: &ProductPatch) -> Result<ProductRef> {
        let url = self.product_url(id);
        let response = self
            .agent
            .put(&url)
            .header("Authorization", &self.auth_header)
            .send_json(patch)
            .with_context(|| format!("PUT {url}"))?;
        tracing::info!(
            product_id = id,
            status = response.status().as_u16(),
            "store update product"
        );
        read_success_json(response, "PUT", &url)
    }

    fn edit_link(&self, id: u64) -> String {
        admin_edit_link(&self.base_url, id)
    }
}

fn read_success_json<T: DeserializeOwned>(
    mut response: ureq::http::Response<ureq::Body>,
    method: &str,
    url: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("{method} {url} returned HTTP {}", status.as_u16()));
    }
    response
        .body_mut()
        .read_json::<T>()
        .with_context(|| format!("decode {method} {url} response"))
}

/// `Basic base64(key:secret)` header value.
pub fn basic_auth_header(key: &str, secret: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{key}:{secret}"));
    format!("Basic {encoded}")
}

pub fn admin_edit_link(base_url: &str, id: u64) -> String {
    format!(
        "{}/wp-admin/post.php?post={id}&action=edit",
        base_url.trim_end_matches('/')
    )
}

pub fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

fn parse_total_pages(header: Option<&str>) -> u32 {
    header
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
