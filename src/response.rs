use actix_web::{http::StatusCode, HttpResponse, HttpResponseBuilder};
use serde::Serialize;

/// Success envelope rendered by every handler: `{statusCode, data, message}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
            message: message.into(),
        }
    }

    /// Render the envelope with its own status code on the wire.
    pub fn into_http(self) -> HttpResponse {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponseBuilder::new(status).json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let resp = ApiResponse::new(StatusCode::OK, serde_json::json!({"id": 1}), "ok");
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["data"]["id"], 1);
        assert_eq!(value["message"], "ok");
    }

    #[test]
    fn test_into_http_uses_envelope_status() {
        let resp = ApiResponse::new(StatusCode::CREATED, (), "created").into_http();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}
