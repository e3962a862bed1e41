use actix_web::HttpResponse;
use serde::Serialize;

/// Successful 200 response in the `{ success, data }` envelope
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": data,
    }))
}

/// Successful 201 response in the `{ success, data }` envelope
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": data,
    }))
}

/// 400 response for rejected verification outcomes.
///
/// A signature mismatch is a normal result of verification, not an error,
/// so it travels in the envelope rather than through `AppError`.
pub fn rejected<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "data": data,
    }))
}
