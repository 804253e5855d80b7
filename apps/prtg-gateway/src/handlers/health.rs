//! 健康检查：返回连接状态。
//!
//! - GET /health

use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub ok: bool,
    pub state: &'static str,
    pub code: u16,
    pub summary: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.connection.status();
    Json(HealthDto {
        ok: status.state.is_connected(),
        state: status.state.as_str(),
        code: status.code,
        summary: status.summary,
    })
}
