//! HTTP delivery layer (axum)

use crate::core::ModelService;
use crate::domain::model::{ConfigurationId, StoredConfiguration};
use crate::domain::ports::{ConfigurationStore, SceneExporter};
use crate::export::ExportOptions;
use crate::utils::error::{BouquetError, ErrorCategory, Result};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
struct SaveResponse {
    id: ConfigurationId,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    nodes: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelQuery {
    pub format: Option<String>,
}

impl ModelQuery {
    fn export_options(&self) -> Result<ExportOptions> {
        match self.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("glb") => Ok(ExportOptions::default()),
            Some("gltf") => Ok(ExportOptions::gltf()),
            Some(other) => Err(BouquetError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "Supported formats: glb, gltf".to_string(),
            }),
        }
    }
}

impl IntoResponse for BouquetError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.category() {
            ErrorCategory::Input | ErrorCategory::NotFound => {
                tracing::debug!("Request rejected ({}): {}", status, self)
            }
            _ => {
                tracing::error!(
                    "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                    self,
                    self.category(),
                    self.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", self.recovery_suggestion());
            }
        }

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

async fn save_configuration<S, E>(
    State(service): State<Arc<ModelService<S, E>>>,
    body: Bytes,
) -> Result<Json<SaveResponse>>
where
    S: ConfigurationStore + 'static,
    E: SceneExporter + 'static,
{
    let stored = service.save_json(&body).await?;
    Ok(Json(SaveResponse { id: stored.id }))
}

async fn get_configuration<S, E>(
    State(service): State<Arc<ModelService<S, E>>>,
    Path(id): Path<String>,
) -> Result<Json<StoredConfiguration>>
where
    S: ConfigurationStore + 'static,
    E: SceneExporter + 'static,
{
    let stored = service.configuration(&ConfigurationId(id)).await?;
    Ok(Json(stored))
}

async fn get_model<S, E>(
    State(service): State<Arc<ModelService<S, E>>>,
    Path(id): Path<String>,
    Query(query): Query<ModelQuery>,
) -> Result<Response>
where
    S: ConfigurationStore + 'static,
    E: SceneExporter + 'static,
{
    let options = query.export_options()?;
    let id = ConfigurationId(id);
    let model = service.model(&id, options).await?;

    let disposition = format!("attachment; filename=\"bouquet-{}.{}\"", id, model.file_extension);
    let mut response = model.bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(model.content_type));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

async fn health<S, E>(State(service): State<Arc<ModelService<S, E>>>) -> Json<HealthBody>
where
    S: ConfigurationStore + 'static,
    E: SceneExporter + 'static,
{
    Json(HealthBody {
        status: "ok",
        nodes: service.base_scene().len(),
    })
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

pub fn router<S, E>(service: Arc<ModelService<S, E>>, allowed_origins: &[String]) -> Router
where
    S: ConfigurationStore + 'static,
    E: SceneExporter + 'static,
{
    Router::new()
        .route("/api/save-configuration", post(save_configuration::<S, E>))
        .route("/api/get-model/:id", get(get_model::<S, E>))
        .route("/api/configuration/:id", get(get_configuration::<S, E>))
        .route("/api/health", get(health::<S, E>))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serves until ctrl-c
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    if let Ok(address) = listener.local_addr() {
        tracing::info!("🚀 Listening on http://{}", address);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install ctrl-c handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_query() {
        let query = |format: Option<&str>| ModelQuery {
            format: format.map(str::to_string),
        };

        assert!(query(None).export_options().unwrap().binary);
        assert!(query(Some("GLB")).export_options().unwrap().binary);
        assert!(!query(Some("gltf")).export_options().unwrap().binary);

        let err = query(Some("obj")).export_options().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_error_response_status() {
        let response = BouquetError::NotFoundError { id: "x".into() }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = BouquetError::validation("missing balloonColors").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
