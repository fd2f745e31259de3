use actix_multipart::Multipart;
use actix_web::{get, guard, http::header, web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::services::storage;
use crate::services::upload_service::{content_type_for, decode_payload, UploadService};

#[derive(Deserialize)]
pub struct UploadRequest {
    pub file: Option<String>,     // data URL or bare base64
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /api/upload with a JSON body (admin)
pub async fn upload_json(
    admin: AdminUser,
    req: HttpRequest,
    body: web::Json<UploadRequest>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let (file, filename) = match (body.file, body.filename) {
        (Some(file), Some(filename)) if !file.is_empty() && !filename.trim().is_empty() => {
            (file, filename)
        }
        _ => return Err(ApiError::bad_request("File and filename are required")),
    };

    let bytes = decode_payload(&file)
        .map_err(|e| ApiError::bad_request(format!("File is not valid base64: {e}")))?;
    if bytes.len() > uploads.max_bytes() {
        return Err(ApiError::bad_request("File too large"));
    }

    let url = uploads.store(&filename, bytes, &request_base(&req)).await?;
    tracing::debug!(by = %admin.0.username, "upload stored");

    Ok(HttpResponse::Ok().json(UploadResponse { url }))
}

/// POST /api/upload with `multipart/form-data` (admin)
///
/// Takes the part named `file`; a text part named `filename` overrides the
/// part's own filename.
pub async fn upload_multipart(
    admin: AdminUser,
    req: HttpRequest,
    mut payload: Multipart,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, ApiError> {
    let max_bytes = uploads.max_bytes();
    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut filename_override: Option<String> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?;

        let name = field.name().unwrap_or_default().to_string();
        let original_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?;
            if data.len() + chunk.len() > max_bytes {
                return Err(ApiError::bad_request("File too large"));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "file" => file = Some((original_name, data)),
            "filename" => {
                filename_override = String::from_utf8(data)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let Some((original_name, bytes)) = file else {
        return Err(ApiError::bad_request("No file uploaded"));
    };
    let Some(filename) = filename_override.or(original_name).filter(|name| !name.trim().is_empty())
    else {
        return Err(ApiError::bad_request("File and filename are required"));
    };

    let url = uploads.store(&filename, bytes, &request_base(&req)).await?;
    tracing::debug!(by = %admin.0.username, "multipart upload stored");

    Ok(HttpResponse::Ok().json(UploadResponse { url }))
}

/// GET /uploads/{key} - files written by the local disk backend
#[get("/uploads/{key}")]
pub async fn serve_upload(
    path: web::Path<String>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();

    match storage::read_local(uploads.local_dir(), &key).await? {
        Some(bytes) => Ok(HttpResponse::Ok()
            .content_type(content_type_for(&key))
            .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
            .body(bytes)),
        None => Err(ApiError::NotFound("File not found".to_string())),
    }
}

/// `scheme://host` as seen by the client
fn request_base(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

fn is_multipart(ctx: &guard::GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"))
}

pub fn upload_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/upload")
            .route(web::post().guard(guard::fn_guard(is_multipart)).to(upload_multipart))
            .route(web::post().to(upload_json))
            .default_service(web::route().to(super::method_not_allowed)),
    );
}

pub fn file_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(serve_upload);
}
