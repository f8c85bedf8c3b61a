//! 用户列表查询：搜索过滤与分页

use serde::{Deserialize, Serialize};

use super::model::User;
use crate::utils::positive_or;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// 原始查询参数，数值按前导整数规则宽松解析
#[derive(Debug, Default)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

/// 已解析的分页参数，`page` 与 `limit` 都至少为 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// 0、负数或无法解析的值回退到默认值
    pub fn from_query(query: &ListUsersQuery) -> Self {
        Self::new(
            positive_or(query.page.as_deref(), DEFAULT_PAGE),
            positive_or(query.limit.as_deref(), DEFAULT_LIMIT),
        )
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl ListUsersQuery {
    /// 从查询串键值对构造，重复的键取第一次出现的值，未知的键忽略
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                "search" => &mut query.search,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// 空字符串视为未提供
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|term| !term.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: usize,
    pub per_page: usize,
    /// 过滤后的总数
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// `needle` 已转为小写
fn contains_lowercase(user: &User, needle: &str) -> bool {
    user.name.to_lowercase().contains(needle) || user.email.to_lowercase().contains(needle)
}

/// 过滤并取出 `[(page-1)*limit, page*limit)` 这一页
pub fn paginate(users: &[User], search: Option<&str>, page: PageRequest) -> UserPage {
    let filtered: Vec<&User> = match search.filter(|term| !term.is_empty()) {
        Some(term) => {
            let needle = term.to_lowercase();
            users
                .iter()
                .filter(|user| contains_lowercase(user, &needle))
                .collect()
        }
        None => users.iter().collect(),
    };

    let total = filtered.len();
    let users = filtered
        .into_iter()
        .skip(page.offset())
        .take(page.limit)
        .cloned()
        .collect();

    UserPage {
        users,
        pagination: Pagination {
            current_page: page.page,
            per_page: page.limit,
            total,
            total_pages: total.div_ceil(page.limit),
        },
    }
}
