//! Document number allocation

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::application::AppError;
use crate::domain::DocumentKind;

use super::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub success: bool,
    pub kind: DocumentKind,
    pub number: String,
}

/// POST /api/documents/{kind}/next-number
pub async fn next_number(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<NextNumberResponse>> {
    let kind: DocumentKind = kind.parse().map_err(AppError::NotFound)?;
    let number = state.service.next_document_number(kind).await?;

    Ok(Json(NextNumberResponse {
        success: true,
        kind,
        number,
    }))
}
