//! 호출자 사용자 컨텍스트
//!
//! 인증 계층이 요청마다 한 번 만들어 넘겨주는 읽기 전용 값입니다.
//! 스레드 로컬이 아니라 모든 호출에 명시적으로 전달됩니다.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// 사용자 컨텍스트
///
/// # 조회 가능한 키
///
/// - `userId` / `user_id`
/// - `username`
/// - `orgId` / `org_id`
/// - `tenantId` / `tenant_id`
/// - `roles`
/// - 그 외 `fields`에 담긴 임의의 필드
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    /// 사용자 ID
    #[serde(default, rename = "userId")]
    pub user_id: Option<Value>,

    /// 사용자 이름
    #[serde(default)]
    pub username: Option<String>,

    /// 조직 ID
    #[serde(default, rename = "orgId")]
    pub org_id: Option<Value>,

    /// 테넌트 ID
    #[serde(default, rename = "tenantId")]
    pub tenant_id: Option<Value>,

    /// Role 목록
    #[serde(default)]
    pub roles: Vec<String>,

    /// 추가 필드
    #[serde(default, flatten)]
    pub fields: HashMap<String, Value>,

    /// 활성화된 추가 필드 목록 (None = 전부 허용)
    #[serde(skip)]
    enabled_fields: Option<HashSet<String>>,
}

impl UserContext {
    /// 새 컨텍스트 생성
    pub fn new(user_id: impl Into<Value>, username: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            username: Some(username.into()),
            ..Default::default()
        }
    }

    /// 익명 컨텍스트 (컨텍스트 기반 채움을 모두 건너뜀)
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// 조직 ID 설정
    pub fn with_org_id(mut self, org_id: impl Into<Value>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// 테넌트 ID 설정
    pub fn with_tenant_id(mut self, tenant_id: impl Into<Value>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Role 설정
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// 추가 필드 설정
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// 조회를 허용할 필드 목록 제한
    ///
    /// `userId`, `username`은 항상 허용됩니다.
    pub fn with_enabled_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// 인증되었는지 확인
    pub fn is_authenticated(&self) -> bool {
        self.user_id.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// 특정 role을 가지고 있는지 확인
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// 키로 필드 조회
    ///
    /// 비어있는 값은 `None`으로 돌려줍니다.
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = match key {
            "userId" | "user_id" => self.user_id.clone(),
            "username" => self.username.clone().map(Value::Text),
            _ if !self.is_enabled(key) => {
                tracing::warn!(field = key, "user context field is not enabled");
                None
            }
            "orgId" | "org_id" => self.org_id.clone(),
            "tenantId" | "tenant_id" => self.tenant_id.clone(),
            "roles" => Some(Value::List(
                self.roles.iter().cloned().map(Value::Text).collect(),
            )),
            _ => self.fields.get(key).cloned(),
        };

        value.filter(|v| !v.is_empty())
    }

    fn is_enabled(&self, key: &str) -> bool {
        match &self.enabled_fields {
            None => true,
            Some(enabled) => enabled.contains(key),
        }
    }
}
