//! 核心响应处理模块

use serde::{Deserialize, Serialize};

/// API 响应结构：`message` 加上展开的业务字段
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        user: u32,
    }

    #[test]
    fn test_data_is_flattened() {
        let value = serde_json::to_value(ApiResponse::new("ok", Payload { user: 7 })).unwrap();
        assert_eq!(value, json!({ "message": "ok", "user": 7 }));
    }
}
