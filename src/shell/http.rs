use axum::{
    Router,
    routing::{get, post},
};

use crate::shell::disputes_http;
use crate::shell::state::AppState;
use crate::shell::wallet_http;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/disputes",
            post(disputes_http::file).get(disputes_http::list_mine),
        )
        .route("/disputes/reasons", get(disputes_http::reasons))
        .route("/disputes/{id}", get(disputes_http::detail))
        .route("/disputes/{id}/comments", post(disputes_http::add_comment))
        .route("/admin/disputes", get(disputes_http::admin_list))
        .route("/admin/disputes/stats", get(disputes_http::admin_stats))
        .route("/admin/disputes/{id}", get(disputes_http::admin_detail))
        .route(
            "/admin/disputes/{id}/resolve",
            post(disputes_http::admin_resolve),
        )
        .route(
            "/admin/disputes/{id}/comments",
            post(disputes_http::admin_comment),
        )
        .route("/payment-methods/wallet/topup", post(wallet_http::top_up))
        .route("/payment-methods/wallet", get(wallet_http::summary))
        .with_state(state)
}
