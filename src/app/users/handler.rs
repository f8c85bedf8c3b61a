//! 用户处理器

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use super::model::{messages, UserBody, UserListBody};
use super::query::{ListUsersQuery, PageRequest};
use super::validation::{CreateUserRequest, UpdateUserRequest};
use crate::app::AppState;
use crate::core::{error::CoreError, extract::Validated, response::ApiResponse};
use crate::utils::parse_leading_int;

/// 路径中的用户 ID，无法解码的路径段同样视为无效 ID
fn parse_user_id(path: Result<Path<String>, PathRejection>) -> Result<i64, CoreError> {
    let Path(raw) = path.map_err(|_| CoreError::MalformedIdentifier)?;
    parse_leading_int(&raw).ok_or(CoreError::MalformedIdentifier)
}

/// 获取用户列表（支持分页和搜索）
pub async fn list_users(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<UserListBody>>, CoreError> {
    let query = ListUsersQuery::from_pairs(pairs);
    let page = PageRequest::from_query(&query);
    let result = state.users.list(query.search_term(), page)?;

    Ok(Json(ApiResponse::new(
        messages::LISTED,
        UserListBody {
            users: result.users,
            pagination: result.pagination,
        },
    )))
}

/// 根据 ID 获取用户
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<UserBody>>, CoreError> {
    let id = parse_user_id(id)?;
    let user = state.users.get(id)?;
    Ok(Json(ApiResponse::new(messages::FOUND, UserBody { user })))
}

/// 创建用户
pub async fn create_user(
    State(state): State<AppState>,
    Validated(new_user): Validated<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserBody>>), CoreError> {
    let user = state.users.create(new_user)?;
    info!("Created user: {} ({})", user.name, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(messages::CREATED, UserBody { user })),
    ))
}

/// 更新用户，请求体先于 ID 校验
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    Validated(changes): Validated<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserBody>>, CoreError> {
    let id = parse_user_id(id)?;
    let user = state.users.update(id, changes)?;
    Ok(Json(ApiResponse::new(messages::UPDATED, UserBody { user })))
}

/// 删除用户
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<UserBody>>, CoreError> {
    let id = parse_user_id(id)?;
    let user = state.users.delete(id)?;
    info!("Deleted user: {} ({})", user.name, user.id);
    Ok(Json(ApiResponse::new(messages::DELETED, UserBody { user })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str) -> Result<Path<String>, PathRejection> {
        Ok(Path(id.to_string()))
    }

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id(raw("4")).unwrap(), 4);
        assert_eq!(parse_user_id(raw("4abc")).unwrap(), 4);
        assert!(matches!(
            parse_user_id(raw("invalid")),
            Err(CoreError::MalformedIdentifier)
        ));
    }

    #[test]
    fn test_overflowing_id_is_well_formed() {
        assert_eq!(parse_user_id(raw("99999999999999999999")).unwrap(), i64::MAX);
    }
}
