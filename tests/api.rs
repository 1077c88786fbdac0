use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use opensase_storefront::domain::value_objects::Money;
use opensase_storefront::{db, publisher::EventPublisher, router, AppState};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;
use uuid::Uuid;

async fn app() -> Router {
    let db = db::connect("sqlite::memory:", 1).await.unwrap();
    router(AppState { db, events: EventPublisher::disabled(), shipping_flat_rate: Money::ZERO })
}

struct Caller { id: Uuid, admin: bool }

impl Caller {
    fn customer() -> Self { Self { id: Uuid::new_v4(), admin: false } }
    fn admin() -> Self { Self { id: Uuid::new_v4(), admin: true } }
}

async fn send(app: &Router, method: &str, uri: &str, caller: Option<&Caller>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(c) = caller {
        req = req.header("x-user-id", c.id.to_string());
        if c.admin { req = req.header("x-user-role", "admin"); }
    }
    let body = match body {
        Some(v) => { req = req.header(header::CONTENT_TYPE, "application/json"); Body::from(v.to_string()) }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn amount(v: &Value) -> Decimal {
    Decimal::from_str(v.as_str().expect("amounts are serialized as strings")).unwrap()
}

async fn create_product(app: &Router, name: &str, price: &str, tax: &str) -> Value {
    let (status, body) = send(app, "POST", "/api/v1/products", Some(&Caller::admin()),
        Some(json!({"name": name, "price": price, "tax": tax, "stock": 50}))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn checkout_body() -> Value {
    json!({
        "paymentMethod": "card",
        "shippingAddress": {
            "fullName": "Ada Lovelace", "line1": "12 St James's Square", "city": "London",
            "postalCode": "SW1Y 4JH", "country": "GB"
        }
    })
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_principal_is_unauthorized() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/v1/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_customer_cannot_manage_catalog() {
    let app = app().await;
    let (status, _) = send(&app, "POST", "/api/v1/products", Some(&Caller::customer()),
        Some(json!({"name": "Mug", "price": "5.00"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_slug_collisions_probe_linearly() {
    let app = app().await;
    let a = create_product(&app, "Blue Mug", "5.00", "0").await;
    let b = create_product(&app, "Blue Mug", "6.00", "0").await;
    let c = create_product(&app, "Blue Mug", "7.00", "0").await;
    assert_eq!(a["slug"], "blue-mug");
    assert_eq!(b["slug"], "blue-mug-2");
    assert_eq!(c["slug"], "blue-mug-3");

    let (status, body) = send(&app, "GET", "/api/v1/products/blue-mug-2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], b["id"]);
}

#[tokio::test]
async fn test_checkout_prices_cart_and_clears_it() {
    let app = app().await;
    let product = create_product(&app, "Notebook", "12.50", "1.00").await;
    let user = Caller::customer();

    let (status, _) = send(&app, "POST", "/api/v1/cart", Some(&user),
        Some(json!({"productId": product["id"], "quantity": 2}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, order) = send(&app, "POST", "/api/v1/orders", Some(&user), Some(checkout_body())).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(amount(&order["subtotal"]), Decimal::from(25));
    assert_eq!(amount(&order["tax"]), Decimal::from(2));
    assert_eq!(amount(&order["shipping"]), Decimal::ZERO);
    assert_eq!(amount(&order["total"]), Decimal::from(27));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentStatus"], "pending");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["items"][0]["quantity"], 2);

    let (_, cart) = send(&app, "GET", "/api/v1/cart", Some(&user), None).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 0);
    assert!(cart["totals"].is_null());
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_bad_request() {
    let app = app().await;
    let user = Caller::customer();
    let (status, body) = send(&app, "POST", "/api/v1/orders", Some(&user), Some(checkout_body())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");

    let (_, orders) = send(&app, "GET", "/api/v1/orders", Some(&user), None).await;
    assert_eq!(orders["total"], 0);
}

#[tokio::test]
async fn test_idempotency_key_replays_order() {
    let app = app().await;
    let product = create_product(&app, "Pen", "2.00", "0").await;
    let user = Caller::customer();
    send(&app, "POST", "/api/v1/cart", Some(&user), Some(json!({"productId": product["id"], "quantity": 1}))).await;

    let submit = || {
        Request::builder().method("POST").uri("/api/v1/orders")
            .header("x-user-id", user.id.to_string())
            .header("idempotency-key", "checkout-1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(checkout_body().to_string())).unwrap()
    };
    let first = app.clone().oneshot(submit()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first: Value = serde_json::from_slice(&to_bytes(first.into_body(), usize::MAX).await.unwrap()).unwrap();

    let second = app.clone().oneshot(submit()).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second: Value = serde_json::from_slice(&to_bytes(second.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(first["id"], second["id"]);

    let (_, orders) = send(&app, "GET", "/api/v1/orders", Some(&user), None).await;
    assert_eq!(orders["total"], 1);
}

#[tokio::test]
async fn test_customers_only_see_their_own_orders() {
    let app = app().await;
    let product = create_product(&app, "Lamp", "30.00", "0").await;
    let owner = Caller::customer();
    send(&app, "POST", "/api/v1/cart", Some(&owner), Some(json!({"productId": product["id"], "quantity": 1}))).await;
    let (_, order) = send(&app, "POST", "/api/v1/orders", Some(&owner), Some(checkout_body())).await;
    let uri = format!("/api/v1/orders/{}", order["id"].as_str().unwrap());

    let stranger = Caller::customer();
    let (status, _) = send(&app, "GET", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listed) = send(&app, "GET", "/api/v1/orders", Some(&stranger), None).await;
    assert_eq!(listed["total"], 0);

    let (status, _) = send(&app, "GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, listed) = send(&app, "GET", "/api/v1/orders", Some(&Caller::admin()), None).await;
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = app().await;
    let product = create_product(&app, "Chair", "80.00", "0").await;
    let user = Caller::customer();
    let admin = Caller::admin();
    send(&app, "POST", "/api/v1/cart", Some(&user), Some(json!({"productId": product["id"], "quantity": 1}))).await;
    let (_, order) = send(&app, "POST", "/api/v1/orders", Some(&user), Some(checkout_body())).await;
    let id = order["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", &format!("/api/v1/orders/{id}/pay"), Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, paid) = send(&app, "POST", &format!("/api/v1/orders/{id}/pay"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "processing");
    assert_eq!(paid["paymentStatus"], "paid");

    let (status, cancelled) = send(&app, "POST", &format!("/api/v1/orders/{id}/cancel"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["paymentStatus"], "refunded");
    assert_eq!(cancelled["total"], order["total"]);

    let (status, body) = send(&app, "POST", &format!("/api/v1/orders/{id}/cancel"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_wishlist_duplicate_is_conflict() {
    let app = app().await;
    let product = create_product(&app, "Vase", "15.00", "0").await;
    let user = Caller::customer();
    let add = json!({"productId": product["id"]});

    let (status, _) = send(&app, "POST", "/api/v1/wishlist", Some(&user), Some(add.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", "/api/v1/wishlist", Some(&user), Some(add)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, list) = send(&app, "GET", "/api/v1/wishlist", Some(&user), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/wishlist/{}", product["id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let app = app().await;
    let user = Caller::customer();

    let req = Request::builder().method("POST").uri("/api/v1/cart")
        .header("x-user-id", user.id.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json")).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "DELETE", "/api/v1/wishlist/not-a-uuid", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "GET", "/api/v1/products?page=first", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let uri = format!("/api/v1/cart/{}?quantity=lots", Uuid::new_v4());
    let (status, body) = send(&app, "DELETE", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_first_address_is_default_for_checkout() {
    let app = app().await;
    let product = create_product(&app, "Rug", "40.00", "0").await;
    let user = Caller::customer();
    let (status, saved) = send(&app, "POST", "/api/v1/addresses", Some(&user), Some(json!({
        "label": "Home", "fullName": "Ada Lovelace", "line1": "12 St James's Square", "city": "London",
        "postalCode": "SW1Y 4JH", "country": "GB"
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{saved}");
    assert_eq!(saved["isDefault"], true);

    send(&app, "POST", "/api/v1/cart", Some(&user), Some(json!({"productId": product["id"], "quantity": 1}))).await;
    let (status, order) = send(&app, "POST", "/api/v1/orders", Some(&user), Some(json!({"paymentMethod": "card"}))).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["shippingAddress"]["city"], "London");
}
