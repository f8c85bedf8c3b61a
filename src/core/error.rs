//! 核心错误处理模块

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::config::{current_environment, Environment};

/// 生产环境下替代内部错误详情的提示
pub const INTERNAL_ERROR_MESSAGE: &str = "Erro interno do servidor";

/// 核心错误类型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// 请求体未通过字段校验
    #[error("Dados inválidos")]
    Validation(Vec<String>),

    /// 路径中的 ID 不是整数
    #[error("ID deve ser um número válido")]
    MalformedIdentifier,

    #[error("Usuário não encontrado")]
    NotFound,

    /// 邮箱已被其他用户占用
    #[error("Email já está em uso")]
    Conflict,

    /// 请求体不是合法 JSON
    #[error("{0}")]
    MalformedBody(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Muitas tentativas, tente novamente em {window_minutes} minutos")]
    RateLimited { window_minutes: u64 },

    #[error("Rota não encontrada")]
    RouteNotFound { path: String, method: String },

    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::Validation(_)
            | CoreError::MalformedIdentifier
            | CoreError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound | CoreError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Conflict => StatusCode::CONFLICT,
            CoreError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            CoreError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 构造 JSON 错误体 `{error, ...}`
    pub fn body(&self, environment: Environment) -> Value {
        match self {
            CoreError::Validation(details) => json!({
                "error": self.to_string(),
                "details": details,
            }),
            CoreError::RouteNotFound { path, method } => json!({
                "error": self.to_string(),
                "path": path,
                "method": method,
            }),
            CoreError::Internal(message) => {
                internal_error_body(message, &format!("{:?}", self), environment)
            }
            _ => json!({ "error": self.to_string() }),
        }
    }
}

/// 内部错误响应体：生产环境隐藏详情，其余环境附带 `stack`
pub fn internal_error_body(message: &str, detail: &str, environment: Environment) -> Value {
    if environment.is_production() {
        json!({ "error": INTERNAL_ERROR_MESSAGE })
    } else {
        json!({ "error": message, "stack": detail })
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        if let CoreError::Internal(message) = &self {
            error!(error = %message, "未处理的内部错误");
        }

        let status = self.status_code();
        let body = self.body(current_environment());
        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        // 消息以 `"<field>"` 开头，按文本排序即按字段名排序
        let mut messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(_, errors)| {
                errors.iter().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("validation failed: {}", error.code))
                })
            })
            .collect();
        messages.sort();

        CoreError::Validation(messages)
    }
}

impl From<JsonRejection> for CoreError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match &rejection {
            JsonRejection::JsonDataError(_) => CoreError::Validation(vec![message]),
            _ if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                CoreError::PayloadTooLarge(message)
            }
            _ => CoreError::MalformedBody(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CoreError::Validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CoreError::MalformedIdentifier.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(CoreError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(CoreError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            CoreError::RateLimited { window_minutes: 15 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            CoreError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_bodies() {
        let body = CoreError::NotFound.body(Environment::Development);
        assert_eq!(body, json!({ "error": "Usuário não encontrado" }));

        let body = CoreError::Validation(vec!["\"name\" is required".into()])
            .body(Environment::Development);
        assert_eq!(body["error"], "Dados inválidos");
        assert_eq!(body["details"][0], "\"name\" is required");

        let body = CoreError::RouteNotFound {
            path: "/api/x?y=1".into(),
            method: "GET".into(),
        }
        .body(Environment::Development);
        assert_eq!(body["path"], "/api/x?y=1");
        assert_eq!(body["method"], "GET");

        let body = CoreError::RateLimited { window_minutes: 15 }.body(Environment::Production);
        assert_eq!(
            body["error"],
            "Muitas tentativas, tente novamente em 15 minutos"
        );
    }

    #[test]
    fn test_internal_error_redacted_in_production() {
        let err = CoreError::Internal("lock poisoned".into());

        let body = err.body(Environment::Production);
        assert_eq!(body, json!({ "error": INTERNAL_ERROR_MESSAGE }));

        let body = err.body(Environment::Development);
        assert_eq!(body["error"], "lock poisoned");
        assert!(body["stack"].as_str().unwrap().contains("Internal"));
    }

    #[test]
    fn test_validation_messages_sorted() {
        let mut errors = ValidationErrors::new();
        let mut name = ValidationError::new("length");
        name.message = Some("name message".into());
        let mut age = ValidationError::new("range");
        age.message = Some("age message".into());
        errors.add("name", name);
        errors.add("age", age);

        match CoreError::from(errors) {
            CoreError::Validation(messages) => {
                assert_eq!(messages, vec!["age message", "name message"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
