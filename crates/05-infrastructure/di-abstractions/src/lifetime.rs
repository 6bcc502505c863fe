//! 生命周期策略映射
//!
//! 把四种抽象生命周期映射为后端的作用域规则，各后端据此提供一致的可观察行为。

use infrastructure_common::Lifetime;
use std::fmt;

/// 后端实例作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceScope {
    /// 每次解析都创建并注入新实例
    PerDependency,
    /// 容器内共享一个实例
    Container,
    /// 每个（服务键，调用线程）一个实例，容器释放时回收
    Thread,
    /// 每个（服务键，请求作用域）一个实例，作用域由宿主提供
    Request,
}

impl InstanceScope {
    /// 实例是否在多次解析之间复用
    pub fn is_shared(&self) -> bool {
        !matches!(self, Self::PerDependency)
    }
}

impl fmt::Display for InstanceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PerDependency => "per-dependency",
            Self::Container => "container",
            Self::Thread => "thread",
            Self::Request => "request",
        };
        f.write_str(name)
    }
}

/// 生命周期策略
pub trait LifetimePolicy: Send + Sync {
    /// 生命周期对应的作用域
    fn scope_for(&self, lifetime: Lifetime) -> InstanceScope;
}

/// 标准生命周期策略
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLifetimePolicy;

impl LifetimePolicy for StandardLifetimePolicy {
    fn scope_for(&self, lifetime: Lifetime) -> InstanceScope {
        match lifetime {
            Lifetime::Transient => InstanceScope::PerDependency,
            Lifetime::Singleton => InstanceScope::Container,
            Lifetime::PerThread => InstanceScope::Thread,
            Lifetime::PerRequest => InstanceScope::Request,
        }
    }
}
