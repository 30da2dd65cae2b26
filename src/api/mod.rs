use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, Request, State, rejection::BytesRejection},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::post,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    EnricherError, Result,
    config::EnricherConfig,
    enrichment::RouteEnricher,
    models::{EnrichmentRequest, Route},
    routing::DistanceMatrixClient,
    weather::WeatherApiClient,
};

/// Header the Functions host accepts the function key in
pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

pub type Enricher = RouteEnricher<WeatherApiClient, DistanceMatrixClient>;

#[derive(Clone)]
pub struct AppState {
    pub enricher: Arc<Enricher>,
    pub function_key: Option<Arc<str>>,
}

impl AppState {
    /// Build the upstream clients and enricher from configuration
    pub fn from_config(config: &EnricherConfig) -> Result<Self> {
        let enricher = RouteEnricher::new(
            WeatherApiClient::new(&config.weather)?,
            DistanceMatrixClient::new(&config.maps)?,
        )
        .with_max_concurrent_routes(config.enrichment.max_concurrent_routes);

        Ok(Self {
            enricher: Arc::new(enricher),
            function_key: config.server.function_key.as_deref().map(Arc::from),
        })
    }
}

#[derive(Deserialize)]
struct FunctionKeyQuery {
    code: Option<String>,
}

/// Routes served under `/api`
pub fn router(state: AppState, route: &str) -> Router {
    Router::new()
        .route(&format!("/{route}"), post(enrich_routes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_function_key,
        ))
        .with_state(state)
}

#[instrument(skip_all)]
async fn enrich_routes(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<Vec<Route>>, EnricherError> {
    let body = body?;
    tracing::debug!(bytes = body.len(), "Read request body");
    let request = EnrichmentRequest::from_slice(&body)?;
    info!(
        routes = request.routes.len(),
        has_weather_key = request.weather_api_key.is_some(),
        has_maps_key = request.maps_api_key.is_some(),
        "Processing route enrichment request"
    );

    let enriched = state.enricher.enrich(request).await?;
    Ok(Json(enriched))
}

async fn require_function_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.function_key.as_deref() else {
        return next.run(request).await;
    };

    let from_header = request
        .headers()
        .get(FUNCTION_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let from_query = Query::<FunctionKeyQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.code);

    if from_header == Some(expected) || from_query.as_deref() == Some(expected) {
        next.run(request).await
    } else {
        EnricherError::Unauthorized.into_response()
    }
}
