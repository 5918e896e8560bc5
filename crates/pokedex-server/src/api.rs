use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pokedex::services::{NewPokemon, Pagination, PokemonPatch, ServiceError};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    code: String,
    message: String,
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorResponse {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
        },
    };
    (status, Json(body)).into_response()
}

/// Map a service error onto a status and error body. Server-side faults
/// were already logged with their source when they were classified.
fn service_error_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::DuplicateKey { .. } | ServiceError::InvalidRequest(_) => {
            StatusCode::BAD_REQUEST
        },
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Persistence(_) | ServiceError::UpstreamFetch(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        },
    };
    error_response(status, err.code(), &err.to_string())
}

/// Malformed bodies and query strings get the same error body as service
/// errors
fn rejection_response(message: String) -> Response {
    error_response(StatusCode::BAD_REQUEST, "bad_request", &message)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn create_pokemon(
    State(state): State<AppState>,
    body: Result<Json<NewPokemon>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.body_text()),
    };

    match state.pokemon_service.create(body).await {
        Ok(pokemon) => (StatusCode::CREATED, Json(pokemon)).into_response(),
        Err(e) => service_error_response(e),
    }
}

async fn list_pokemon(
    State(state): State<AppState>,
    pagination: Result<Query<Pagination>, QueryRejection>,
) -> Response {
    let Query(pagination) = match pagination {
        Ok(pagination) => pagination,
        Err(rejection) => return rejection_response(rejection.body_text()),
    };

    match state
        .pokemon_service
        .find_all(pagination, state.default_limit())
        .await
    {
        Ok(pokemon) => Json(pokemon).into_response(),
        Err(e) => service_error_response(e),
    }
}

async fn get_pokemon(State(state): State<AppState>, Path(term): Path<String>) -> Response {
    match state.pokemon_service.find_one(&term).await {
        Ok(pokemon) => Json(pokemon).into_response(),
        Err(e) => service_error_response(e),
    }
}

async fn update_pokemon(
    State(state): State<AppState>,
    Path(term): Path<String>,
    body: Result<Json<PokemonPatch>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.body_text()),
    };

    match state.pokemon_service.update(&term, body).await {
        Ok(pokemon) => Json(pokemon).into_response(),
        Err(e) => service_error_response(e),
    }
}

async fn delete_pokemon(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pokemon_service.remove(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => service_error_response(e),
    }
}

async fn execute_seed(State(state): State<AppState>) -> Response {
    match state.seed_service.execute_seed().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => service_error_response(e),
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/api/v2/pokemon", get(list_pokemon).post(create_pokemon))
        .route(
            "/api/v2/pokemon/{term}",
            get(get_pokemon)
                .patch(update_pokemon)
                .delete(delete_pokemon),
        )
        .route("/api/v2/seed", get(execute_seed));

    Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
