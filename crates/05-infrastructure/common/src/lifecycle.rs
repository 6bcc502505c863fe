//! 服务生命周期定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 服务生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// 瞬时模式 - 每次解析都创建新实例
    Transient,
    /// 单例模式 - 容器生命周期内只创建一个实例
    Singleton,
    /// 线程模式 - 每个调用线程一个实例
    PerThread,
    /// 请求模式 - 每个请求作用域一个实例
    PerRequest,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::Transient
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transient => "transient",
            Self::Singleton => "singleton",
            Self::PerThread => "per_thread",
            Self::PerRequest => "per_request",
        };
        f.write_str(name)
    }
}

/// 作用域信息
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: uuid::Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Scope {
    /// 创建新作用域
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// 创建子作用域
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(format!("{}.{}", self.name, name.into()))
    }
}

/// 容器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// 可用
    Open,
    /// 已释放
    Disposed,
}

impl Default for ContainerState {
    fn default() -> Self {
        Self::Open
    }
}
