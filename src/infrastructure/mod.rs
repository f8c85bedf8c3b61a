//! 基础设施层：日志、时钟

pub mod clock;
pub mod logger;
