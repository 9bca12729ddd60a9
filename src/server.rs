// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! HTTP/JSON transport over a [`SessionStore`].
//!
//! # Endpoints
//!
//! | Method | Path | Body / Query | Response |
//! |--------|------|--------------|----------|
//! | POST | `/api/newgame` | `{players: [{name, extra?}]}` | `{success, gameCode, players}` |
//! | GET | `/api/summary` | `?gameCode=` | `{summary, settlements, bankSummary}` |
//! | POST | `/api/players` | `{gameCode, name}` | `{id, name}` |
//! | POST | `/api/transactions` | `{gameCode, type, from?, to, amount, paymentType?}` | `{success, id}` |
//! | GET | `/api/transactions` | `?gameCode=` | transaction log |
//!
//! Failures come back as `{error, code}` with status 400 for validation
//! errors and 404 for unknown game codes.

use crate::base::{SessionCode, TransactionId};
use crate::error::{ErrorKind, LedgerError};
use crate::ledger::Summary;
use crate::request::{NewPlayer, TransactionRequest};
use crate::session::Player;
use crate::store::{SessionCreated, SessionStore};
use crate::transaction::Transaction;
use axum::{
    Json, Router,
    extract::{
        Query, Request, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

// === Request/Response DTOs ===

#[derive(Debug, Deserialize)]
pub struct NewGameRequest {
    pub players: Option<Vec<NewPlayer>>,
}

#[derive(Debug, Serialize)]
pub struct NewGameResponse {
    pub success: bool,
    #[serde(flatten)]
    pub created: SessionCreated,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuery {
    #[serde(default)]
    pub game_code: SessionCode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPlayerRequest {
    #[serde(default)]
    pub game_code: SessionCode,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTransactionRequest {
    #[serde(default)]
    pub game_code: SessionCode,
    #[serde(flatten)]
    pub transaction: TransactionRequest,
}

#[derive(Debug, Serialize)]
pub struct RecordTransactionResponse {
    pub success: bool,
    pub id: TransactionId,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
}

// === Error Handling ===

/// Wrapper for converting [`LedgerError`] into HTTP responses.
#[derive(Debug)]
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(LedgerError::MalformedRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(LedgerError::MalformedRequest(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
        };
        let code = match &self.0 {
            LedgerError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            LedgerError::EmptyRoster => "EMPTY_ROSTER",
            LedgerError::MissingPlayerName => "MISSING_NAME",
            LedgerError::DuplicatePlayer(_) => "DUPLICATE_PLAYER",
            LedgerError::MissingField(_) => "MISSING_FIELD",
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::InvalidTransactionType(_) => "INVALID_TRANSACTION_TYPE",
            LedgerError::MissingSource => "MISSING_SOURCE",
            LedgerError::InvalidPaymentType => "INVALID_PAYMENT_TYPE",
            LedgerError::MalformedRequest(_) => "MALFORMED_REQUEST",
        };
        warn!(status = status.as_u16(), code, error = %self.0, "request rejected");

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /api/newgame - Open a session with its starting players.
async fn create_game(
    State(state): State<AppState>,
    payload: Result<Json<NewGameRequest>, JsonRejection>,
) -> Result<Json<NewGameResponse>, AppError> {
    let Json(request) = payload?;
    let players = request.players.unwrap_or_default();
    let created = state.store.create_session(&players)?;
    Ok(Json(NewGameResponse {
        success: true,
        created,
    }))
}

/// GET /api/summary - Balances, bank totals and settlements.
async fn get_summary(
    State(state): State<AppState>,
    query: Result<Query<GameQuery>, QueryRejection>,
) -> Result<Json<Summary>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.store.summary(&query.game_code)?))
}

/// POST /api/players - Seat a player in a running session.
async fn add_player(
    State(state): State<AppState>,
    payload: Result<Json<AddPlayerRequest>, JsonRejection>,
) -> Result<Json<Player>, AppError> {
    let Json(request) = payload?;
    let player = state
        .store
        .add_player(&request.game_code, request.name.as_deref())?;
    Ok(Json(player))
}

/// POST /api/transactions - Append a buy or transfer.
async fn record_transaction(
    State(state): State<AppState>,
    payload: Result<Json<RecordTransactionRequest>, JsonRejection>,
) -> Result<Json<RecordTransactionResponse>, AppError> {
    let Json(request) = payload?;
    let tx = state
        .store
        .record_transaction(&request.game_code, &request.transaction)?;
    Ok(Json(RecordTransactionResponse {
        success: true,
        id: tx.id,
    }))
}

/// GET /api/transactions - The raw log, oldest first.
async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<GameQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.store.transactions(&query.game_code)?))
}

// === Middleware ===

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

// === Router ===

pub fn router(store: Arc<SessionStore>) -> Router {
    Router::new()
        .route("/api/newgame", post(create_game))
        .route("/api/summary", get(get_summary))
        .route("/api/players", post(add_player))
        .route(
            "/api/transactions",
            get(list_transactions).post(record_transaction),
        )
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(AppState { store })
}

/// Serves the API on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, store: Arc<SessionStore>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "chip ledger API listening");
    }
    axum::serve(listener, router(store)).await
}
