//! 用户数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::Pagination;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 通过创建规则校验后的字段
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
}

/// 通过更新规则校验后的字段，`None` 表示不修改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
}

/// `{message, user}` 中的 `user`
#[derive(Debug, Serialize, Deserialize)]
pub struct UserBody {
    pub user: User,
}

/// `{message, users, pagination}` 中的列表部分
#[derive(Debug, Serialize, Deserialize)]
pub struct UserListBody {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// 响应消息
pub mod messages {
    pub const LISTED: &str = "Lista de usuários";
    pub const FOUND: &str = "Usuário encontrado";
    pub const CREATED: &str = "Usuário criado com sucesso";
    pub const UPDATED: &str = "Usuário atualizado com sucesso";
    pub const DELETED: &str = "Usuário removido com sucesso";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_user_json_shape() {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let user = User {
            id: 1,
            name: "João Silva".to_string(),
            email: "joao@example.com".to_string(),
            age: None,
            created_at: created,
            updated_at: None,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["id"], 1);
        assert!(value["age"].is_null());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_none());

        let user = User {
            updated_at: Some(created),
            ..user
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("updatedAt").is_some());
    }
}
