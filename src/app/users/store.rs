//! 用户集合存储
//!
//! 按插入顺序保存的内存列表，所有查找都是线性扫描。每个读-改-写操作
//! （唯一性检查 + 插入、查找 + 删除）都在同一个写锁内完成。

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::model::{NewUser, User, UserChanges};
use super::query::{paginate, PageRequest, UserPage};
use crate::core::error::CoreError;
use crate::infrastructure::clock::Clock;

struct Inner {
    users: Vec<User>,
    /// 已分配过的最大 ID，删除后也不回退
    last_id: i64,
}

pub struct UserStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl UserStore {
    /// 空集合时第一个 ID 为 1
    pub fn with_users(users: Vec<User>, clock: Arc<dyn Clock>) -> Self {
        let last_id = users.iter().map(|user| user.id).max().unwrap_or(0);
        Self {
            inner: RwLock::new(Inner { users, last_id }),
            clock,
        }
    }

    /// 带三个示例用户的集合
    pub fn seeded(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let sample = [
            (1, "João Silva", "joao@example.com", 25),
            (2, "Maria Santos", "maria@example.com", 30),
            (3, "Pedro Oliveira", "pedro@example.com", 28),
        ];

        let users = sample
            .into_iter()
            .map(|(id, name, email, age)| User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                age: Some(age),
                created_at: now,
                updated_at: None,
            })
            .collect::<Vec<_>>();

        info!("✅ 已初始化 {} 个示例用户", users.len());
        Self::with_users(users, clock)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, CoreError> {
        self.inner
            .read()
            .map_err(|_| CoreError::Internal("user store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, CoreError> {
        self.inner
            .write()
            .map_err(|_| CoreError::Internal("user store lock poisoned".to_string()))
    }

    pub fn count(&self) -> Result<usize, CoreError> {
        Ok(self.read()?.users.len())
    }

    pub fn list(&self, search: Option<&str>, page: PageRequest) -> Result<UserPage, CoreError> {
        let inner = self.read()?;
        Ok(paginate(&inner.users, search, page))
    }

    pub fn get(&self, id: i64) -> Result<User, CoreError> {
        let inner = self.read()?;
        inner
            .users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(CoreError::NotFound)
    }

    pub fn create(&self, new_user: NewUser) -> Result<User, CoreError> {
        let mut inner = self.write()?;

        if inner.users.iter().any(|user| user.email == new_user.email) {
            return Err(CoreError::Conflict);
        }

        let max_id = inner.users.iter().map(|user| user.id).max().unwrap_or(0);
        let id = max_id.max(inner.last_id) + 1;
        let now = self.clock.now();

        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
            age: new_user.age,
            created_at: now,
            updated_at: Some(now),
        };

        inner.last_id = id;
        inner.users.push(user.clone());
        debug!(id, "user created");
        Ok(user)
    }

    /// 只合并提供的字段，并刷新 `updatedAt`
    pub fn update(&self, id: i64, changes: UserChanges) -> Result<User, CoreError> {
        let mut inner = self.write()?;

        let index = inner
            .users
            .iter()
            .position(|user| user.id == id)
            .ok_or(CoreError::NotFound)?;

        if let Some(email) = &changes.email {
            if inner
                .users
                .iter()
                .any(|user| user.id != id && &user.email == email)
            {
                return Err(CoreError::Conflict);
            }
        }

        let updated_at = self.next_update_time(&inner.users[index]);
        let user = &mut inner.users[index];
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(age) = changes.age {
            user.age = Some(age);
        }
        user.updated_at = Some(updated_at);

        debug!(id, "user updated");
        Ok(user.clone())
    }

    /// 删除并返回被删除的记录
    pub fn delete(&self, id: i64) -> Result<User, CoreError> {
        let mut inner = self.write()?;

        let index = inner
            .users
            .iter()
            .position(|user| user.id == id)
            .ok_or(CoreError::NotFound)?;

        let user = inner.users.remove(index);
        debug!(id, "user deleted");
        Ok(user)
    }

    /// 严格晚于上一次修改时间
    fn next_update_time(&self, user: &User) -> DateTime<Utc> {
        let previous = user.updated_at.unwrap_or(user.created_at);
        let now = self.clock.now();
        if now > previous {
            now
        } else {
            previous + Duration::milliseconds(1)
        }
    }
}
