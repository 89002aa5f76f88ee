use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use server_api::{
    create_card, delete_card, get_card, list_cards, reorder_cards, store_image, update_card,
    ApiContext,
};
use shared::{
    domain::CardId,
    error::{ApiError, ErrorCode},
    protocol::{
        CardPayload, CreateCardRequest, ReorderEntry, UpdateCardRequest, UploadImageResponse,
    },
};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info};
use uuid::Uuid;

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_upload_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "drawer server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/drawer-cards",
            get(http_list_cards).post(http_create_card),
        )
        .route(
            "/api/drawer-cards/:card_id",
            get(http_get_card)
                .put(http_update_card)
                .delete(http_delete_card),
        )
        .route("/api/drawer-cards/reorder", post(http_reorder_cards))
        .route(
            "/api/upload-image",
            post(http_upload_image).layer(RequestBodyLimitLayer::new(max_upload_bytes)),
        )
        .route("/uploads/:filename", get(serve_upload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_cards(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CardPayload>>, (StatusCode, Json<ApiError>)> {
    let cards = list_cards(&state.api).await.map_err(error_response)?;
    Ok(Json(cards))
}

async fn http_get_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardPayload>, (StatusCode, Json<ApiError>)> {
    let card = get_card(&state.api, CardId(card_id))
        .await
        .map_err(error_response)?;
    Ok(Json(card))
}

async fn http_create_card(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCardRequest>,
) -> Result<Json<CardPayload>, (StatusCode, Json<ApiError>)> {
    let card = create_card(&state.api, req).await.map_err(error_response)?;
    Ok(Json(card))
}

async fn http_update_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    Json(req): Json<UpdateCardRequest>,
) -> Result<Json<CardPayload>, (StatusCode, Json<ApiError>)> {
    let card = update_card(&state.api, CardId(card_id), req)
        .await
        .map_err(error_response)?;
    Ok(Json(card))
}

async fn http_delete_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    delete_card(&state.api, CardId(card_id))
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_reorder_cards(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<ReorderEntry>>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    reorder_cards(&state.api, entries)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadImageResponse>, (StatusCode, Json<ApiError>)> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error_response(ApiError::new(
            ErrorCode::Validation,
            format!("invalid multipart body: {err}"),
        ))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let mime_type = field.content_type().map(str::to_string).ok_or_else(|| {
            error_response(ApiError::new(
                ErrorCode::Validation,
                "file part is missing a content type",
            ))
        })?;
        let bytes = field.bytes().await.map_err(|err| {
            error_response(ApiError::new(
                ErrorCode::Validation,
                format!("failed to read file part: {err}"),
            ))
        })?;

        let response = store_image(&state.api, filename.as_deref(), &mime_type, &bytes)
            .await
            .map_err(error_response)?;
        return Ok(Json(response));
    }

    Err(error_response(ApiError::new(
        ErrorCode::Validation,
        "multipart body must contain a 'file' field",
    )))
}

async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let image = state
        .api
        .storage
        .load_image(&filename)
        .await
        .map_err(|e| error_response(ApiError::new(ErrorCode::Internal, e.to_string())))?
        .ok_or_else(|| error_response(ApiError::new(ErrorCode::NotFound, "image not found")))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&image.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    Ok((StatusCode::OK, headers, image.bytes))
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::UnsupportedMedia => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}
