//! 请求作用域
//!
//! 请求边界由宿主环境管理，容器只通过显式的 [`RequestScope`] 句柄缓存请求级实例。

use crate::instance::ServiceInstance;
use crate::registry::RegistrationId;
use infrastructure_common::{DependencyResult, Scope};
use parking_lot::Mutex;
use std::collections::HashMap;

/// 请求作用域
#[derive(Debug)]
pub struct RequestScope {
    info: Scope,
    instances: Mutex<HashMap<RegistrationId, ServiceInstance>>,
}

impl RequestScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: Scope::new(name),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// 作用域信息
    pub fn info(&self) -> &Scope {
        &self.info
    }

    /// 获取或创建注册在本作用域内的实例
    ///
    /// 创建在锁外进行，并发创建时先写入者胜出。
    pub fn get_or_create<F>(&self, id: RegistrationId, create: F) -> DependencyResult<ServiceInstance>
    where
        F: FnOnce() -> DependencyResult<ServiceInstance>,
    {
        if let Some(existing) = self.instances.lock().get(&id) {
            return Ok(existing.clone());
        }
        let created = create()?;
        let mut instances = self.instances.lock();
        Ok(instances.entry(id).or_insert(created).clone())
    }

    /// 已缓存的实例数量
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    /// 释放作用域内的所有实例
    pub fn clear(&self) {
        self.instances.lock().clear();
    }
}
