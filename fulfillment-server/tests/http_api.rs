//! HTTP surface: routing, authentication, ownership and the response envelope

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::*;
use fulfillment_server::auth::{Role, create_token};
use fulfillment_server::{AppState, Config, api};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Harness {
    app: Router,
    config: Config,
    db: TestDb,
}

impl Harness {
    async fn new() -> Self {
        let db = setup().await;
        let config = Config::for_database("unused");
        let app = api::create_router(AppState::with_pool(db.pool.clone(), config.clone()));
        Self { app, config, db }
    }

    fn admin(&self, pharmacy_id: i64) -> String {
        create_token(1000 + pharmacy_id, Role::PharmacyAdmin, Some(pharmacy_id), &self.config.jwt_secret)
            .unwrap()
    }

    fn customer(&self, user_id: i64) -> String {
        create_token(user_id, Role::User, None, &self.config.jwt_secret).unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new().await;
    let (status, body) = h.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["service"], "fulfillment-server");
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let h = Harness::new().await;
    let (status, body) = h.send(Method::GET, "/api/orders/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, body) = h
        .send(Method::GET, "/api/orders/1", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn test_order_lifecycle_over_http() {
    let h = Harness::new().await;
    let pool = &h.db.pool;
    let x = product(pool, "Paracetamol 500mg").await;
    let p = pharmacy_at(pool, "P", 0.0, 0.0).await;
    let p_x = listing(pool, p.id, x, 5).await;
    let order_id = place_order(pool, p.id, 42, &[(x, 2)]).await.order.id;
    let admin = h.admin(p.id);
    let customer = h.customer(42);

    let (status, body) = h
        .send(
            Method::POST,
            &format!("/api/orders/{order_id}/confirm"),
            Some(&admin),
            Some(json!({ "description": "packed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "PROCESSED");
    assert_eq!(body["data"]["description"], "packed");
    assert_eq!(stock_of(pool, p_x.id).await, 3);

    // Customer cannot act for the pharmacy
    let (status, body) = h
        .send(Method::POST, &format!("/api/orders/{order_id}/ship"), Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2002);

    let (status, _) = h
        .send(Method::POST, &format!("/api/orders/{order_id}/ship"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Only the customer confirms receipt
    let (status, _) = h
        .send(Method::POST, &format!("/api/orders/{order_id}/receive"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = h
        .send(Method::POST, &format!("/api/orders/{order_id}/receive"), Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CONFIRMED");

    let (status, body) = h
        .send(Method::GET, &format!("/api/orders/{order_id}"), Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CONFIRMED");
    assert_eq!(body["data"]["details"][0]["quantity"], 2);

    let (status, body) = h
        .send(Method::GET, &format!("/api/orders/{order_id}/logs"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_wrong_status_and_foreign_pharmacy() {
    let h = Harness::new().await;
    let pool = &h.db.pool;
    let x = product(pool, "Paracetamol 500mg").await;
    let p = pharmacy_at(pool, "P", 0.0, 0.0).await;
    let other = pharmacy_at(pool, "Other", KM, 0.0).await;
    listing(pool, p.id, x, 5).await;
    let order_id = place_order(pool, p.id, 42, &[(x, 2)]).await.order.id;

    let (status, body) = h
        .send(Method::POST, &format!("/api/orders/{order_id}/ship"), Some(&h.admin(p.id)), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4103);
    assert_eq!(body["details"]["status"], "WAITING");

    let (status, body) = h
        .send(
            Method::POST,
            &format!("/api/orders/{order_id}/confirm"),
            Some(&h.admin(other.id)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);

    let (status, body) = h
        .send(Method::POST, "/api/orders/999/confirm", Some(&h.admin(p.id)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_confirm_without_supplier_reports_cancellation() {
    let h = Harness::new().await;
    let pool = &h.db.pool;
    let x = product(pool, "Paracetamol 500mg").await;
    let p = pharmacy_at(pool, "P", 0.0, 0.0).await;
    listing(pool, p.id, x, 1).await;
    let order_id = place_order(pool, p.id, 42, &[(x, 3)]).await.order.id;

    let (status, body) = h
        .send(
            Method::POST,
            &format!("/api/orders/{order_id}/confirm"),
            Some(&h.admin(p.id)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "No pharmacies available with the requested stock");
    assert_eq!(body["data"]["status"], "CANCELED_BY_PHARMACY");
    assert_eq!(
        body["data"]["description"],
        "no pharmacies available with the requested stock"
    );
}

#[tokio::test]
async fn test_manual_transfer_over_http() {
    let h = Harness::new().await;
    let pool = &h.db.pool;
    let x = product(pool, "Paracetamol 500mg").await;
    let p = pharmacy_at(pool, "P", 0.0, 0.0).await;
    let q = pharmacy_at(pool, "Q", KM, 0.0).await;
    let p_x = listing(pool, p.id, x, 8).await;
    let q_x = listing(pool, q.id, x, 0).await;

    // Destination asks
    let (status, body) = h
        .send(
            Method::POST,
            "/api/stock-mutations",
            Some(&h.admin(q.id)),
            Some(json!({
                "origin_pharmacy_product_id": p_x.id,
                "destination_pharmacy_product_id": q_x.id,
                "stock": 5
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "PENDING");
    let request_id = body["data"]["id"].as_i64().unwrap();

    // Destination cannot approve its own request
    let decide = format!("/api/stock-mutations/{request_id}/status");
    let (status, _) = h
        .send(
            Method::POST,
            &decide,
            Some(&h.admin(q.id)),
            Some(json!({ "status": "ACCEPTED" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Origin decides
    let (status, body) = h
        .send(
            Method::POST,
            &decide,
            Some(&h.admin(p.id)),
            Some(json!({ "status": "ACCEPTED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ACCEPTED");
    assert_eq!(stock_of(pool, p_x.id).await, 3);
    assert_eq!(stock_of(pool, q_x.id).await, 5);

    let (status, body) = h
        .send(
            Method::POST,
            &decide,
            Some(&h.admin(p.id)),
            Some(json!({ "status": "REJECTED" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6202);

    let (status, body) = h
        .send(
            Method::GET,
            "/api/stock-mutations?status=ACCEPTED",
            Some(&h.admin(p.id)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_pharmacy_product_stock_endpoints() {
    let h = Harness::new().await;
    let pool = &h.db.pool;
    let x = product(pool, "Paracetamol 500mg").await;
    let p = pharmacy_at(pool, "P", 0.0, 0.0).await;
    let admin = h.admin(p.id);

    let (status, body) = h
        .send(
            Method::POST,
            "/api/pharmacy-products",
            Some(&admin),
            Some(json!({ "pharmacy_id": p.id, "product_id": x, "price": 12.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["stock"], 0);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = h
        .send(
            Method::POST,
            "/api/pharmacy-products",
            Some(&admin),
            Some(json!({ "pharmacy_id": p.id, "product_id": x, "price": 12.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6004);

    let stock = format!("/api/pharmacy-products/{id}/stock");
    let (status, body) = h
        .send(
            Method::POST,
            &stock,
            Some(&admin),
            Some(json!({ "mutation_type": "ADDITION", "stock": 9 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock"], 9);

    let (status, body) = h
        .send(
            Method::POST,
            &stock,
            Some(&admin),
            Some(json!({ "mutation_type": "REDUCTION", "stock": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6003);
    assert_eq!(body["details"]["available"], 9);

    let (status, body) = h
        .send(
            Method::GET,
            &format!("/api/pharmacy-products/{id}/ledger"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["consistent"], true);
    assert_eq!(body["data"]["mutation_count"], 1);

    let (status, body) = h
        .send(
            Method::GET,
            &format!("/api/pharmacy-products/{id}/mutations?page=1&per_page=10"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["mutation_type"], "ADDITION");

    // Another pharmacy's admin cannot touch this stock
    let (status, _) = h
        .send(
            Method::POST,
            &stock,
            Some(&h.admin(p.id + 1)),
            Some(json!({ "mutation_type": "ADDITION", "stock": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
