//! Greeting endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::client::{ClientError, GreetingService, Greetings};
use crate::http::server::AppState;
use crate::observability::InboundHeaders;

pub async fn ola(State(state): State<AppState>) -> String {
    state.greeting()
}

/// Local greeting followed by the hola chain.
pub async fn ola_chaining(
    State(state): State<AppState>,
    inbound: InboundHeaders,
) -> Result<Json<Greetings>, ClientError> {
    chain(&state, &state.hola, &inbound).await
}

/// Local greeting followed by the aloha chain.
pub async fn ola_aloha(
    State(state): State<AppState>,
    inbound: InboundHeaders,
) -> Result<Json<Greetings>, ClientError> {
    chain(&state, &state.aloha, &inbound).await
}

pub async fn health() -> &'static str {
    "I'm ok"
}

async fn chain(
    state: &AppState,
    service: &GreetingService,
    inbound: &InboundHeaders,
) -> Result<Json<Greetings>, ClientError> {
    let mut greetings = vec![state.greeting()];
    greetings.extend(service.call(inbound).await?);
    Ok(Json(greetings))
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Downstream call failed");
        (StatusCode::BAD_GATEWAY, self.to_string()).into_response()
    }
}
