//! OpenAPI document aggregation.

use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::upload::upload,
        crate::handlers::media_get::get_image,
        crate::handlers::health::ping,
    ),
    components(schemas(
        fieldlog_core::models::UploadResponse,
        fieldlog_core::models::PingResponse,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "fieldlog", description = "Field photo upload service")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
