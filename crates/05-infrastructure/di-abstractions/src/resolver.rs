//! 依赖解析接口
//!
//! 提供按服务键解析实例的能力，以及用于检测循环依赖的解析链

use crate::instance::ServiceInstance;
use crate::scope::RequestScope;
use infrastructure_common::{
    DependencyError, DependencyResult, ResolutionFailure, ServiceKey, ServiceType,
};
use std::sync::Arc;

/// 依赖解析器
///
/// 由容器在每次解析调用时提供，后端与注入计划通过它解析依赖。
pub trait Resolver {
    /// 解析服务，未注册时返回 `Ok(None)`
    fn try_resolve(&self, key: &ServiceKey) -> DependencyResult<Option<ServiceInstance>>;

    /// 解析服务类型的所有注册
    fn resolve_all(&self, service_type: ServiceType) -> DependencyResult<Vec<ServiceInstance>>;

    /// 当前请求作用域
    fn request_scope(&self) -> Option<&RequestScope>;

    /// 解析服务，未注册时返回解析失败错误
    fn resolve(&self, key: &ServiceKey) -> DependencyResult<ServiceInstance> {
        self.try_resolve(key)?.ok_or_else(|| {
            DependencyError::resolution_failed(key, ResolutionFailure::NotRegistered)
        })
    }
}

impl dyn Resolver + '_ {
    /// 解析默认注册的服务
    pub fn get<S>(&self) -> DependencyResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<S>();
        self.resolve(&key)?.expect::<S>(&key)
    }

    /// 解析命名注册的服务
    pub fn get_named<S>(&self, name: &str) -> DependencyResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::named::<S>(name);
        self.resolve(&key)?.expect::<S>(&key)
    }
}

/// 解析链
///
/// 记录当前正在解析的服务键，用于检测循环依赖和限制递归深度。
#[derive(Debug, Clone)]
pub struct ResolutionChain {
    keys: Vec<ServiceKey>,
    max_depth: usize,
}

impl ResolutionChain {
    /// 默认最大解析深度
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn new(max_depth: usize) -> Self {
        Self {
            keys: Vec::new(),
            max_depth,
        }
    }

    /// 进入服务键的解析
    pub fn enter(&mut self, key: &ServiceKey) -> DependencyResult<()> {
        if self.keys.contains(key) {
            let chain = self
                .keys
                .iter()
                .chain(std::iter::once(key))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(DependencyError::resolution_failed(
                key,
                ResolutionFailure::CircularDependency { chain },
            ));
        }
        if self.keys.len() >= self.max_depth {
            return Err(DependencyError::resolution_failed(
                key,
                ResolutionFailure::DepthExceeded {
                    depth: self.max_depth,
                },
            ));
        }
        self.keys.push(key.clone());
        Ok(())
    }

    /// 退出最近进入的解析
    pub fn exit(&mut self) {
        self.keys.pop();
    }

    /// 当前深度
    pub fn depth(&self) -> usize {
        self.keys.len()
    }
}

impl Default for ResolutionChain {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DEPTH)
    }
}
