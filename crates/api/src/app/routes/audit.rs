use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use rodstock_audit::QuickAddLot;
use rodstock_auth::Permission;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/pairs", get(list_pairs))
        .route("/cycle", post(start_cycle))
        .route("/pairs/:material/:gauge/pool", get(get_pool))
        .route("/pairs/:material/:gauge/counts", post(record_count))
        .route("/pairs/:material/:gauge/quick-add", post(quick_add))
        .route("/pairs/:material/:gauge/finish", post(finish))
        .route("/sessions", get(list_sessions))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/reopen", post(reopen_session))
        .route("/sessions/:id/approve", post(approve_session))
        .route("/critical", get(list_critical))
}

pub async fn list_pairs(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_READ) {
        return resp;
    }

    match services.engine().overview().await {
        Ok(pairs) => (StatusCode::OK, Json(serde_json::json!({ "pairs": pairs }))).into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn start_cycle(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_MANAGE) {
        return resp;
    }

    match services.engine().start_cycle(principal.name()).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "created": created.len(),
                "sessions": created.iter().map(dto::session_summary_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn get_pool(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
    Path((material, gauge)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_READ) {
        return resp;
    }
    let pair = match dto::parse_pair(&material, &gauge) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let lots = match services.engine().pool(&pair).await {
        Ok(l) => l,
        Err(e) => return errors::audit_error_to_response(e),
    };
    let state = match services.engine().pair_state(&pair).await {
        Ok(s) => s,
        Err(e) => return errors::audit_error_to_response(e),
    };
    let drafts = services
        .draft_snapshot(&pair, principal.principal_id())
        .await;

    (
        StatusCode::OK,
        Json(dto::pool_to_json(&pair, state, &lots, drafts.as_ref())),
    )
        .into_response()
}

pub async fn record_count(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
    Path((material, gauge)): Path<(String, String)>,
    Json(body): Json<dto::RecordCountRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_COUNT) {
        return resp;
    }
    let pair = match dto::parse_pair(&material, &gauge) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let lot_id = match dto::parse_lot_id(&body.lot_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .record_count(
            pair,
            principal.principal(),
            lot_id,
            body.physical_weight,
            body.observation,
        )
        .await
    {
        Ok(feedback) => (StatusCode::OK, Json(feedback)).into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn quick_add(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
    Path((material, gauge)): Path<(String, String)>,
    Json(body): Json<QuickAddLot>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_COUNT) {
        return resp;
    }
    let pair = match dto::parse_pair(&material, &gauge) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.quick_add(pair, principal.principal(), body).await {
        Ok(lot_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "lot_id": lot_id })),
        )
            .into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn finish(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
    Path((material, gauge)): Path<(String, String)>,
    Json(body): Json<dto::FinishRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_COUNT) {
        return resp;
    }
    let pair = match dto::parse_pair(&material, &gauge) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.finish(pair, principal.principal(), body.confirm).await {
        Ok(session) => (StatusCode::OK, Json(dto::session_detail_json(&session))).into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn list_sessions(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_READ) {
        return resp;
    }

    match services.engine().list_sessions().await {
        Ok(sessions) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "sessions": sessions.iter().map(dto::session_summary_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn get_session(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_READ) {
        return resp;
    }
    let id = match dto::parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.engine().session(id).await {
        Ok(session) => (StatusCode::OK, Json(dto::session_detail_json(&session))).into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn reopen_session(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_MANAGE) {
        return resp;
    }
    let id = match dto::parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.reopen(id).await {
        Ok(session) => (StatusCode::OK, Json(dto::session_summary_json(&session))).into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn delete_session(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_MANAGE) {
        return resp;
    }
    let id = match dto::parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::audit_error_to_response(e),
    }
}

/// 200 when every lot was applied, 207 when some steps failed (retryable).
pub async fn approve_session(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ApproveRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_APPROVE) {
        return resp;
    }
    let id = match dto::parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.approve(principal.principal(), id, body.passphrase).await {
        Ok(report) => {
            let status = if report.is_success() {
                StatusCode::OK
            } else {
                StatusCode::MULTI_STATUS
            };
            (status, Json(report)).into_response()
        }
        Err(e) => errors::audit_error_to_response(e),
    }
}

pub async fn list_critical(
    Extension(services): Extension<AppServices>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&principal, &Permission::AUDIT_READ) {
        return resp;
    }

    let critical = match services.engine().critical().await {
        Ok(c) => c,
        Err(e) => return errors::audit_error_to_response(e),
    };
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "count": critical.len(),
            "items": critical,
        })),
    )
        .into_response()
}
