//! 用户载荷校验
//!
//! 创建与更新共用同一组字段约束（[`UserFields`]）：
//! - `name`: 2..=100 个字符
//! - `email`: 合法邮箱，域名至少两段且顶级域为字母
//! - `age`: 18..=120 的整数，`30.0` 这类整值浮点数视同整数
//!
//! 创建时 `name`、`email` 必填；更新时所有字段可选。任何出现的字段都不能为 `null`，
//! 未知字段报告为 `"<field>" is not allowed`。类型不符由反序列化阶段拒绝。

use std::{borrow::Cow, collections::BTreeMap};

use serde::{de, Deserialize, Deserializer};
use serde_json::{Number, Value};
use validator::{Validate, ValidationError, ValidationErrors};

use super::model::{NewUser, UserChanges};
use crate::core::extract::Schema;

/// 区分“未提供”、“显式 null”和“有值”的字段
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Patch::Null)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Value(value) => Some(value),
            Patch::Absent | Patch::Null => None,
        }
    }
}

/// 字段约束，缺省的字段不参与校验
#[derive(Debug, Validate)]
struct UserFields {
    #[validate(length(
        min = 2,
        max = 100,
        message = "\"name\" length must be between 2 and 100 characters"
    ))]
    name: Option<String>,

    #[validate(email(message = "\"email\" must be a valid email"))]
    email: Option<String>,

    #[validate(range(min = 18, max = 120, message = "\"age\" must be between 18 and 120"))]
    age: Option<i64>,
}

impl UserFields {
    fn check(&self) -> ValidationErrors {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        if let Some(email) = &self.email {
            if !errors.field_errors().contains_key("email") && !has_dotted_domain(email) {
                errors.add(
                    "email",
                    violation("email", "\"email\" must be a valid email".to_string()),
                );
            }
        }
        errors
    }
}

/// `local@label.tld`：至少两段非空标签，顶级域至少两个字母
fn has_dotted_domain(email: &str) -> bool {
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let labels: Vec<&str> = domain.split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };

    labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// `age` 字段：整数或整值浮点数
fn integer_patch<'de, D>(deserializer: D) -> Result<Patch<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(Patch::Null);
    };

    if let Some(value) = number.as_i64() {
        return Ok(Patch::Value(value));
    }
    match number.as_f64() {
        // 超出 i64 的值饱和到边界，随后由范围规则拒绝
        Some(value) if value.is_finite() && value.fract() == 0.0 => Ok(Patch::Value(value as i64)),
        _ => Err(de::Error::custom(format!(
            "invalid value: {}, expected an integer",
            number
        ))),
    }
}

fn violation(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

fn reject_null<T>(errors: &mut ValidationErrors, field: &'static str, value: &Patch<T>) {
    if value.is_null() {
        errors.add(
            field,
            violation("not_null", format!("\"{}\" must not be null", field)),
        );
    }
}

fn require<T>(errors: &mut ValidationErrors, field: &'static str, value: &Patch<T>) {
    if value.is_absent() {
        errors.add(
            field,
            violation("required", format!("\"{}\" is required", field)),
        );
    }
}

fn reject_unknown(errors: &mut ValidationErrors, extra: &BTreeMap<String, Value>) {
    for key in extra.keys() {
        errors.add(
            "unknown",
            violation("not_allowed", format!("\"{}\" is not allowed", key)),
        );
    }
}

/// 创建用户请求
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default, deserialize_with = "integer_patch")]
    pub age: Patch<i64>,
    /// 未声明的字段
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Schema for CreateUserRequest {
    type Accepted = NewUser;

    fn accept(self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        reject_unknown(&mut errors, &self.extra);
        require(&mut errors, "name", &self.name);
        require(&mut errors, "email", &self.email);
        reject_null(&mut errors, "name", &self.name);
        reject_null(&mut errors, "email", &self.email);
        reject_null(&mut errors, "age", &self.age);

        let fields = UserFields {
            name: self.name.into_option(),
            email: self.email.into_option(),
            age: self.age.into_option(),
        };
        merge(&mut errors, fields.check());

        match (fields.name, fields.email) {
            (Some(name), Some(email)) if errors.errors().is_empty() => Ok(NewUser {
                name,
                email,
                age: fields.age,
            }),
            _ => Err(errors),
        }
    }
}

/// 更新用户请求
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default, deserialize_with = "integer_patch")]
    pub age: Patch<i64>,
    /// 未声明的字段
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Schema for UpdateUserRequest {
    type Accepted = UserChanges;

    fn accept(self) -> Result<UserChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        reject_unknown(&mut errors, &self.extra);
        reject_null(&mut errors, "name", &self.name);
        reject_null(&mut errors, "email", &self.email);
        reject_null(&mut errors, "age", &self.age);

        let fields = UserFields {
            name: self.name.into_option(),
            email: self.email.into_option(),
            age: self.age.into_option(),
        };
        merge(&mut errors, fields.check());

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(UserChanges {
            name: fields.name,
            email: fields.email,
            age: fields.age,
        })
    }
}

fn merge(into: &mut ValidationErrors, from: ValidationErrors) {
    for (field, errors) in from.field_errors() {
        for error in errors {
            into.add(field, error.clone());
        }
    }
}
