use actix_web::{HttpRequest, HttpResponse, error, web};
use serde::{Deserialize, Serialize};

use crate::database::models::Page;
use crate::error::AppError;
use crate::middleware::RequestIdExt;

/// Body of every error response and of plain acknowledgements.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub struct ApiResponse;

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> HttpResponse {
        HttpResponse::Ok().json(data)
    }

    pub fn created<T: Serialize>(data: T) -> HttpResponse {
        HttpResponse::Created().json(data)
    }

    pub fn success_message(message: &str) -> HttpResponse {
        HttpResponse::Ok().json(MessageResponse::new(message))
    }

    /// `{<key>: [...], pagination: {...}}`
    pub fn paginated<T: Serialize>(key: &str, page: Page<T>) -> HttpResponse {
        let mut body = serde_json::Map::new();
        body.insert(key.to_string(), serde_json::json!(page.items));
        body.insert("pagination".to_string(), serde_json::json!(page.pagination));

        HttpResponse::Ok().json(body)
    }
}

fn rejected_input(req: &HttpRequest, message: String) -> actix_web::Error {
    log::debug!(
        "Rejected input on {} (correlation_id={}): {}",
        req.path(),
        req.correlation_id().unwrap_or_default(),
        message
    );
    AppError::BadRequest(message).into()
}

fn json_error_handler(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    rejected_input(req, format!("Invalid request body: {}", err))
}

fn query_error_handler(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    rejected_input(req, format!("Invalid query string: {}", err))
}

fn path_error_handler(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    rejected_input(req, format!("Invalid path: {}", err))
}

/// Extractor configs that keep malformed input on the `{message}` error shape.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler));
}
