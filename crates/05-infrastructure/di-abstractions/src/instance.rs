//! 类型擦除的实例表示

use infrastructure_common::{DependencyError, DependencyResult, ResolutionFailure, ServiceKey, ServiceType};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 具体类型实例（内部为 `Arc<T>`）
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// 服务实例
///
/// 持有按服务类型转换后的 `Arc<S>`，`S` 通常为 `dyn Trait`。克隆只增加引用计数。
#[derive(Clone)]
pub struct ServiceInstance {
    service_type: ServiceType,
    value: Arc<dyn Any + Send + Sync>,
}

impl ServiceInstance {
    /// 包装服务实例
    pub fn new<S>(service: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            service_type: ServiceType::of::<S>(),
            value: Arc::new(service),
        }
    }

    /// 实例对应的服务类型
    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// 取出 `Arc<S>`，类型不符时返回 `None`
    pub fn downcast<S>(&self) -> Option<Arc<S>>
    where
        S: ?Sized + 'static,
    {
        self.value.downcast_ref::<Arc<S>>().cloned()
    }

    /// 取出 `Arc<S>`，类型不符时返回类型转换错误
    pub fn expect<S>(&self, key: &ServiceKey) -> DependencyResult<Arc<S>>
    where
        S: ?Sized + 'static,
    {
        self.downcast::<S>().ok_or_else(|| {
            DependencyError::resolution_failed(
                key,
                ResolutionFailure::TypeMismatch {
                    expected: std::any::type_name::<S>().to_string(),
                    actual: self.service_type.name().to_string(),
                },
            )
        })
    }

    /// 两个服务实例是否指向同一个对象
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("service_type", &self.service_type)
            .finish()
    }
}

/// 已解析的调用参数
///
/// 按声明顺序依次取出，供构造函数和注入方法使用。
pub struct Arguments {
    owner: &'static str,
    values: std::vec::IntoIter<ServiceInstance>,
}

impl Arguments {
    /// 创建参数列表
    pub fn new(owner: &'static str, values: Vec<ServiceInstance>) -> Self {
        Self {
            owner,
            values: values.into_iter(),
        }
    }

    /// 取出下一个参数
    pub fn take<S>(&mut self) -> DependencyResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<S>();
        match self.values.next() {
            Some(value) => value.expect::<S>(&key),
            None => Err(DependencyError::resolution_failed(
                &key,
                ResolutionFailure::Activation {
                    message: format!("{} 缺少参数", self.owner),
                },
            )),
        }
    }

    /// 剩余参数数量
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}
