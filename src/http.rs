// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP command interface.
//!
//! Every command endpoint answers `200 {}` once the frame has been handed
//! to the link, and `400 {"error": ...}` for malformed requests. A `200`
//! means accepted for transmission, not delivered.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::bluetooth::LinkManager;
use crate::commands::{Command, CommandError};

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub link: Arc<LinkManager>,
}

/// Creates the HTTP router with all command endpoints.
pub fn create_router(state: HttpState) -> Router {
    Router::new()
        .route("/quick/:quick", post(quick_handler))
        .route("/volup", post(volume_up_handler))
        .route("/voldn", post(volume_down_handler))
        .route("/mute", post(mute_handler))
        .route("/unmute", post(unmute_handler))
        .route("/input/:input", post(input_handler))
        .route("/power/:onoff", post(power_handler))
        .route("/sendhex", post(send_hex_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Send a parsed command, or reject the request.
async fn dispatch(state: &HttpState, command: Result<Command, CommandError>) -> Response {
    match command {
        Ok(command) => {
            debug!("Dispatching {:?}", command);
            state.link.send(&command.frame()).await;
            (StatusCode::OK, Json(json!({}))).into_response()
        }
        Err(e) => {
            warn!("Rejected request: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn quick_handler(State(state): State<HttpState>, Path(quick): Path<String>) -> Response {
    dispatch(&state, Command::quick(&quick)).await
}

async fn volume_up_handler(State(state): State<HttpState>) -> Response {
    dispatch(&state, Ok(Command::VolumeUp)).await
}

async fn volume_down_handler(State(state): State<HttpState>) -> Response {
    dispatch(&state, Ok(Command::VolumeDown)).await
}

async fn mute_handler(State(state): State<HttpState>) -> Response {
    dispatch(&state, Ok(Command::Mute)).await
}

async fn unmute_handler(State(state): State<HttpState>) -> Response {
    dispatch(&state, Ok(Command::Unmute)).await
}

async fn input_handler(State(state): State<HttpState>, Path(input): Path<String>) -> Response {
    dispatch(&state, Command::input(&input)).await
}

async fn power_handler(State(state): State<HttpState>, Path(onoff): Path<String>) -> Response {
    dispatch(&state, Command::power(&onoff)).await
}

/// Raw frame from the request body, hex encoded.
async fn send_hex_handler(State(state): State<HttpState>, body: String) -> Response {
    dispatch(&state, Command::raw(&body)).await
}

/// Link phase and counters.
async fn status_handler(State(state): State<HttpState>) -> impl IntoResponse {
    Json(state.link.status().snapshot())
}
