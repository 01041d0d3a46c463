//! One [`ApiRequest`] per marketplace operation.
//!
//! These functions perform no I/O. Pass their result to [`crate::client::Client::execute`], or
//! use the typed methods on [`crate::client::Client`] which do both steps.
//!
//! | Function | Method | Path | Expected key |
//! |----------|--------|------|--------------|
//! | [`metaproduct`] | GET | `/metaproduct/{id}` | `metaproduct` |
//! | [`product`] | GET | `/products/{id}` | `product` |
//! | [`find_products`] | GET | `/products/find` | `product` |
//! | [`articles`] | GET | `/articles/{id}` | `article` |
//! | [`product_list`] | GET | `/productlist` | `productsfile` |
//! | [`expansions`] | GET | `/games/{id}/expansions` | `expansion` |
//! | [`wantslists`] | GET | `/wantslist` | `wantslist` |
//! | [`wants`] | GET | `/wantslist/{id}` | `want` |
//! | [`create_wantslist`] | POST | `/wantslist` | `wantslist` |
//! | [`delete_wantslist`] | DELETE | `/wantslist/{id}` | |
//! | [`shopping_cart`] | GET | `/shoppingcart` | |
//! | [`change_cart`] | PUT | `/shoppingcart` | |
//! | [`empty_cart`] | DELETE | `/shoppingcart` | |

use reqwest::Method;
use serde_json::{Value, json};

use crate::Result;
use crate::types::CartAction;
use crate::types::request::{ApiRequest, CartItem, FindProductsRequest};
use crate::xml::construct_xml;

#[must_use]
pub fn metaproduct(metaproduct_id: u64) -> ApiRequest {
    ApiRequest::builder()
        .path(format!("/metaproduct/{metaproduct_id}"))
        .expected_key("metaproduct")
        .build()
}

#[must_use]
pub fn product(product_id: u64) -> ApiRequest {
    ApiRequest::builder()
        .path(format!("/products/{product_id}"))
        .expected_key("product")
        .build()
}

#[must_use]
pub fn find_products(request: &FindProductsRequest) -> ApiRequest {
    ApiRequest::builder()
        .path("/products/find")
        .params(request.params())
        .expected_key("product")
        .build()
}

/// Articles for sale for one product.
#[must_use]
pub fn articles(product_id: u64) -> ApiRequest {
    ApiRequest::builder()
        .path(format!("/articles/{product_id}"))
        .expected_key("article")
        .build()
}

/// The whole product catalog, as base64 of a gzipped CSV file.
#[must_use]
pub fn product_list() -> ApiRequest {
    ApiRequest::builder()
        .path("/productlist")
        .expected_key("productsfile")
        .build()
}

#[must_use]
pub fn expansions(game_id: u32) -> ApiRequest {
    ApiRequest::builder()
        .path(format!("/games/{game_id}/expansions"))
        .expected_key("expansion")
        .build()
}

#[must_use]
pub fn wantslists() -> ApiRequest {
    ApiRequest::builder()
        .path("/wantslist")
        .expected_key("wantslist")
        .build()
}

/// The entries of one want-list.
#[must_use]
pub fn wants(wantslist_id: u64) -> ApiRequest {
    ApiRequest::builder()
        .path(format!("/wantslist/{wantslist_id}"))
        .expected_key("want")
        .build()
}

pub fn create_wantslist(name: &str, game_id: u32) -> Result<ApiRequest> {
    let body = construct_xml(&[json!({
        "wantslist": { "idGame": game_id, "name": name }
    })])?;

    Ok(ApiRequest::builder()
        .path("/wantslist")
        .method(Method::POST)
        .expected_key("wantslist")
        .body(body)
        .build())
}

#[must_use]
pub fn delete_wantslist(wantslist_id: u64) -> ApiRequest {
    ApiRequest::builder()
        .path(format!("/wantslist/{wantslist_id}"))
        .method(Method::DELETE)
        .build()
}

/// The shopping cart, with its shipping address and the account. Returned as a whole document.
#[must_use]
pub fn shopping_cart() -> ApiRequest {
    ApiRequest::builder().path("/shoppingcart").build()
}

/// Adds articles to, or removes them from, the shopping cart.
pub fn change_cart(action: CartAction, items: &[CartItem]) -> Result<ApiRequest> {
    let articles: Vec<Value> = items
        .iter()
        .map(|item| json!({ "idArticle": item.article_id, "amount": item.amount }))
        .collect();
    let body = construct_xml(&[json!({ "action": action.to_string(), "article": articles })])?;

    Ok(ApiRequest::builder()
        .path("/shoppingcart")
        .method(Method::PUT)
        .body(body)
        .build())
}

#[must_use]
pub fn empty_cart() -> ApiRequest {
    ApiRequest::builder()
        .path("/shoppingcart")
        .method(Method::DELETE)
        .build()
}
