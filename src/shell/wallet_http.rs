// Inbound HTTP for the wallet surface.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::errors::ApiError;
use crate::core::money::Money;
use crate::shell::auth::Principal;
use crate::shell::envelope::{ApiFailure, ok};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct TopUpBody {
    pub amount: Money,
    pub source_method_id: Uuid,
}

pub async fn top_up(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<TopUpBody>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let Json(body) = body.map_err(|_| ApiFailure(ApiError::bad_request("invalid request body")))?;
    let summary = state
        .wallet
        .top_up(principal.user_id, body.amount, body.source_method_id)
        .await
        .map_err(|e| ApiFailure::opaque(e, "top up wallet"))?;
    Ok(ok(summary))
}

pub async fn summary(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response, ApiFailure> {
    let summary = state
        .wallet
        .summary(principal.user_id)
        .await
        .map_err(|e| ApiFailure::opaque(e, "get wallet"))?;
    Ok(ok(summary))
}

#[cfg(test)]
mod wallet_http_inbound_tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::adapters::in_memory::in_memory_store::InMemoryStore;
    use crate::application::wallet_ledger::WalletConfig;
    use crate::shell::auth::USER_ID_HEADER;
    use crate::shell::http::router;
    use crate::shell::state::AppState;

    fn make_app() -> (Router, Arc<InMemoryStore>) {
        let (state, store, _rides) = AppState::in_memory(WalletConfig::default());
        (router(state), store)
    }

    async fn json_of(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn it_should_top_up_and_return_the_summary() {
        let (app, store) = make_app();
        let user = Uuid::now_v7();
        let card = store.seed_card(user);
        let response = app
            .oneshot(
                Request::post("/payment-methods/wallet/topup")
                    .header(USER_ID_HEADER, user.to_string())
                    .header("content-type", "application/json")
                    .body(Body::from(format!(
                        r#"{{"amount":100.00,"source_method_id":"{card}"}}"#
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        assert_eq!(json["success"], true);
        let balance: crate::core::money::Money =
            json["data"]["balance"].as_str().unwrap().parse().unwrap();
        assert_eq!(balance, rust_decimal_macros::dec!(100.00));
        assert_eq!(json["data"]["transactions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn it_should_return_404_for_an_unknown_source() {
        let (app, _) = make_app();
        let response = app
            .oneshot(
                Request::post("/payment-methods/wallet/topup")
                    .header(USER_ID_HEADER, Uuid::now_v7().to_string())
                    .header("content-type", "application/json")
                    .body(Body::from(format!(
                        r#"{{"amount":100.00,"source_method_id":"{}"}}"#,
                        Uuid::now_v7()
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_of(response).await;
        assert_eq!(json["error"]["message"], "source payment method not found");
    }

    #[tokio::test]
    async fn it_should_return_an_empty_summary_without_a_wallet() {
        let (app, _) = make_app();
        let response = app
            .oneshot(
                Request::get("/payment-methods/wallet")
                    .header(USER_ID_HEADER, Uuid::now_v7().to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        let balance: crate::core::money::Money =
            json["data"]["balance"].as_str().unwrap().parse().unwrap();
        assert_eq!(balance, crate::core::money::Money::ZERO);
        assert!(json["data"]["transactions"].as_array().unwrap().is_empty());
    }
}
