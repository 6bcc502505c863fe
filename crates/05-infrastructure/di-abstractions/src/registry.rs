//! 服务注册表抽象接口

use crate::descriptor::TypeDescriptor;
use crate::instance::{AnyInstance, ServiceInstance};
use infrastructure_common::{DependencyResult, Lifetime, ServiceKey, ServiceType};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// 服务注册表
///
/// 与具体后端无关的统一注册与解析接口。
pub trait ServiceRegistry: Send + Sync {
    /// 注册实现类型，实现类型必须能够提供服务类型
    fn register_type(
        &self,
        service_type: ServiceType,
        implementation: TypeDescriptor,
        name: Option<&str>,
        lifetime: Lifetime,
    ) -> DependencyResult<ServiceRegistration>;

    /// 注册预先构建的实例（等同单例，不执行注入）
    fn register_service_instance(
        &self,
        instance: ServiceInstance,
        name: Option<&str>,
    ) -> DependencyResult<ServiceRegistration>;

    /// 解析服务
    fn resolve_service(&self, key: &ServiceKey) -> DependencyResult<ServiceInstance>;

    /// 解析服务类型的所有注册，没有注册时返回空列表
    fn resolve_all_services(&self, service_type: ServiceType)
        -> DependencyResult<Vec<ServiceInstance>>;

    /// 检查服务键是否已注册
    fn is_registered(&self, key: &ServiceKey) -> bool;

    /// 已提交的注册快照
    fn registrations(&self) -> Vec<ServiceRegistration>;

    /// 释放注册表，重复调用无副作用
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

/// 注册标识，按注册顺序递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 服务注册信息
///
/// 提交后不可变；同一服务键的重新注册会产生新的注册并取代旧注册。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    id: RegistrationId,
    key: ServiceKey,
    implementation_type: ServiceType,
    lifetime: Lifetime,
}

impl ServiceRegistration {
    pub fn new(
        id: RegistrationId,
        key: ServiceKey,
        implementation_type: ServiceType,
        lifetime: Lifetime,
    ) -> Self {
        Self {
            id,
            key,
            implementation_type,
            lifetime,
        }
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn service_type(&self) -> ServiceType {
        self.key.service_type()
    }

    pub fn name(&self) -> Option<&str> {
        self.key.name()
    }

    pub fn implementation_type(&self) -> ServiceType {
        self.implementation_type
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }
}

impl fmt::Display for ServiceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} => {} [{}]",
            self.key,
            self.implementation_type.short_name(),
            self.lifetime
        )
    }
}

/// 实例装饰函数
pub type Decorator = Arc<dyn Fn(ServiceInstance) -> DependencyResult<ServiceInstance> + Send + Sync>;

/// 实例激活回调
pub type ActivationHook = Arc<dyn Fn(&ServiceRegistration, &AnyInstance) + Send + Sync>;

/// 后端注册构建器
///
/// 注册事件观察者可以在提交前修改它，例如附加拦截装饰。
#[derive(Clone, Default)]
pub struct RegistrationBuilder {
    decorators: Vec<Decorator>,
    activation_hooks: Vec<ActivationHook>,
    metadata: BTreeMap<String, String>,
}

impl RegistrationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加服务装饰器，实例类型不是 `S` 时原样传递
    pub fn decorate<S, F>(&mut self, decorate: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>) -> Arc<S> + Send + Sync + 'static,
    {
        self.decorate_instance(move |instance: ServiceInstance| {
            Ok(match instance.downcast::<S>() {
                Some(service) => ServiceInstance::new(decorate(service)),
                None => instance,
            })
        })
    }

    /// 添加类型擦除的装饰器
    pub fn decorate_instance<F>(&mut self, decorate: F) -> &mut Self
    where
        F: Fn(ServiceInstance) -> DependencyResult<ServiceInstance> + Send + Sync + 'static,
    {
        self.decorators.push(Arc::new(decorate));
        self
    }

    /// 添加激活回调，每个新创建的实例都会触发
    pub fn on_activated<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&ServiceRegistration, &AnyInstance) + Send + Sync + 'static,
    {
        self.activation_hooks.push(Arc::new(hook));
        self
    }

    /// 附加元数据
    pub fn with_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn has_decorators(&self) -> bool {
        !self.decorators.is_empty()
    }

    /// 按添加顺序应用装饰器
    pub fn apply_decorators(&self, instance: ServiceInstance) -> DependencyResult<ServiceInstance> {
        self.decorators
            .iter()
            .try_fold(instance, |instance, decorate| decorate(instance))
    }

    /// 通知激活回调
    pub fn notify_activated(&self, registration: &ServiceRegistration, instance: &AnyInstance) {
        for hook in &self.activation_hooks {
            hook(registration, instance);
        }
    }
}

impl fmt::Debug for RegistrationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationBuilder")
            .field("decorators", &self.decorators.len())
            .field("activation_hooks", &self.activation_hooks.len())
            .field("metadata", &self.metadata)
            .finish()
    }
}
