//! HTTP handlers for the transport-independent ops of spec §6: `query`,
//! `list_databases`, `refresh_schema`, `health`, plus the dockerflow-style
//! operational endpoints the reference project exposes alongside its real
//! API (`__version__`, `__lbheartbeat__`, `__error__`).
use std::sync::Arc;

use actix_web::{web, HttpResponse};
use gateway_history::{HistoryRecord, Source};
use gateway_orchestrator::QueryRequest;
use serde::Serialize;

use crate::state::AppState;

pub async fn query(state: web::Data<AppState>, body: web::Json<QueryRequest>) -> HttpResponse {
    let request = body.into_inner();
    let db_name = request.database_name.clone().unwrap_or_default();
    let response = state.orchestrator.query(request).await;

    if let Some(history) = &state.history {
        let request_id = response
            .error
            .as_ref()
            .map(|e| e.request_id.clone())
            .unwrap_or_default();
        let record = HistoryRecord::new(
            request_id,
            db_name,
            response.sql.clone().unwrap_or_default(),
            response.data.as_ref().map(|d| d.row_count),
            response.data.as_ref().map(|d| d.execution_ms),
            response.success,
            response.error.as_ref().map(|e| e.kind.clone()),
            Source::Nl,
        );
        let history = Arc::clone(history);
        tokio::spawn(async move {
            if let Err(e) = history.append(&record).await {
                warn!("failed to append history record"; "error" => %e);
            }
        });
    }

    let status = status_for(&response);
    HttpResponse::build(status).json(response)
}

fn status_for(response: &gateway_orchestrator::QueryResponse) -> actix_web::http::StatusCode {
    use actix_web::http::StatusCode;

    if response.success {
        return StatusCode::OK;
    }
    match response.error.as_ref().map(|e| e.kind.as_str()) {
        Some("unknown_db") => StatusCode::NOT_FOUND,
        Some("config_error") => StatusCode::BAD_REQUEST,
        Some("unsafe_sql" | "not_readonly" | "blocked_function" | "disallowed_identifier") => {
            StatusCode::FORBIDDEN
        }
        Some("rate_limited") => StatusCode::TOO_MANY_REQUESTS,
        Some("llm_unavailable" | "pool_closing" | "pool_exhausted" | "schema_unavailable") => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        Some("timeout") => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Serialize)]
struct DatabaseSummary {
    name: String,
    dialect: &'static str,
}

pub async fn list_databases(state: web::Data<AppState>) -> HttpResponse {
    let mut out = Vec::new();
    for name in state.registry.list_databases().await {
        if let Ok(descriptor) = state.registry.descriptor(&name).await {
            out.push(DatabaseSummary {
                name,
                dialect: descriptor.dialect.as_str(),
            });
        }
    }
    HttpResponse::Ok().json(out)
}

#[derive(Serialize)]
struct RefreshResponse {
    ok: bool,
}

pub async fn refresh_schema(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let db_name = path.into_inner();
    state.schema_cache.invalidate(&db_name).await;
    let ok = state.schema_cache.get(&db_name).await.is_ok();
    HttpResponse::Ok().json(RefreshResponse { ok })
}

#[derive(Serialize)]
struct PoolHealth {
    name: String,
    open: u32,
    in_use: u32,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    pools: Vec<PoolHealth>,
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let status = state.registry.health().await;
    let pools = status
        .databases
        .into_iter()
        .map(|d| PoolHealth {
            name: d.name,
            open: d.open_connections,
            in_use: d.in_use_connections,
        })
        .collect();
    HttpResponse::Ok().json(HealthResponse { ok: true, pools })
}

pub async fn lbheartbeat() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn version() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/json")
        .body(format!(
            r#"{{"name":"{}","version":"{}"}}"#,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
}

pub async fn test_error() -> HttpResponse {
    error!("test error endpoint invoked");
    HttpResponse::ServiceUnavailable().body("test error")
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use gateway_orchestrator::{ErrorRecord, QueryResponse, Stats};

    use super::status_for;

    fn failure(kind: &str) -> QueryResponse {
        QueryResponse::failure(
            ErrorRecord {
                kind: kind.to_owned(),
                message: "boom".to_owned(),
                detail: None,
                retryable: false,
                request_id: "req-1".to_owned(),
            },
            None,
            Stats::default(),
        )
    }

    #[test]
    fn success_maps_to_200() {
        let response = QueryResponse {
            success: true,
            sql: None,
            data: None,
            confidence: None,
            stats: Stats::default(),
            error: None,
        };
        assert_eq!(status_for(&response), StatusCode::OK);
    }

    #[test]
    fn unknown_db_maps_to_404() {
        assert_eq!(status_for(&failure("unknown_db")), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unsafe_sql_maps_to_403() {
        assert_eq!(status_for(&failure("unsafe_sql")), StatusCode::FORBIDDEN);
    }

    #[test]
    fn rate_limited_maps_to_429() {
        assert_eq!(
            status_for(&failure("rate_limited")),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn llm_unavailable_maps_to_503() {
        assert_eq!(
            status_for(&failure("llm_unavailable")),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn timeout_maps_to_504() {
        assert_eq!(status_for(&failure("timeout")), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn unrecognized_kind_maps_to_500() {
        assert_eq!(
            status_for(&failure("something_new")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn lbheartbeat_returns_200() {
        let response = lbheartbeat().await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn version_returns_package_name() {
        let response = version().await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
