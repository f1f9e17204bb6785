//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use sharedfiles_core::models;

/// Returns the OpenAPI spec served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SharedFiles API",
        version = "0.1.0",
        description = "File upload and download service. Files are spread over capacity-bounded storage pools, or kept on local disk when no remote storage is configured.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::file_upload::upload_file,
        handlers::file_get::list_files,
        handlers::file_get::get_file,
        handlers::file_delete::delete_file,
        handlers::clusters::cluster_status,
        handlers::health::health_check,
    ),
    components(schemas(
        models::FileRecord,
        models::UploadReceipt,
        models::PoolStatus,
        models::PoolReport,
        models::PoolError,
        models::PoolHealth,
        models::StorageSummary,
        models::FilesCount,
        handlers::file_delete::DeleteResponse,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "files", description = "Upload, download, list and delete files"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
