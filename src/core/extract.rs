//! 请求体提取与校验

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::ValidationErrors;

use super::error::CoreError;

/// 字段校验规则
///
/// `accept` 在校验通过时把原始载荷转换成只含已校验字段的值，
/// 失败时返回全部违例。
pub trait Schema {
    type Accepted;

    fn accept(self) -> Result<Self::Accepted, ValidationErrors>;
}

/// 先按 JSON 解析请求体，再按 `T` 的规则校验
pub struct Validated<T: Schema>(pub T::Accepted);

#[async_trait]
impl<T, S> FromRequest<S> for Validated<T>
where
    T: Schema + DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await?;
        let accepted = payload.accept()?;
        Ok(Validated(accepted))
    }
}
