//! 核心层：错误处理、响应结构、请求体校验、中间件

pub mod error;
pub mod extract;
pub mod middleware;
pub mod rate_limit;
pub mod response;
