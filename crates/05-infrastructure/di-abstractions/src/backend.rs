//! 后端适配器接口
//!
//! 每种注入引擎实现一个 [`Backend`]，容器门面只依赖这个接口，从不区分具体后端。

use crate::descriptor::ServiceCaster;
use crate::instance::{AnyInstance, ServiceInstance};
use crate::lifetime::InstanceScope;
use crate::plan::InjectionPlan;
use crate::registry::{RegistrationBuilder, ServiceRegistration};
use crate::resolver::Resolver;
use infrastructure_common::{DependencyResult, ServiceKey, ServiceType};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 实例激活函数：通过解析器构造并注入具体实例
pub type Activator = Arc<dyn Fn(&dyn Resolver) -> DependencyResult<AnyInstance> + Send + Sync>;

/// 提交给后端的注册
#[derive(Clone)]
pub struct BackendRegistration {
    pub registration: ServiceRegistration,
    pub scope: InstanceScope,
    pub activator: Activator,
    pub caster: ServiceCaster,
    pub builder: RegistrationBuilder,
}

impl fmt::Debug for BackendRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistration")
            .field("registration", &self.registration)
            .field("scope", &self.scope)
            .field("builder", &self.builder)
            .finish()
    }
}

/// 后端注入引擎适配器
pub trait Backend: Send + Sync {
    /// 后端名称
    fn name(&self) -> &'static str;

    /// 提交类型注册
    fn register(&self, registration: BackendRegistration) -> DependencyResult<()>;

    /// 提交实例注册
    fn register_instance(
        &self,
        registration: ServiceRegistration,
        instance: ServiceInstance,
    ) -> DependencyResult<()>;

    /// 服务键是否已注册
    fn is_registered(&self, key: &ServiceKey) -> bool;

    /// 解析服务，未注册时返回 `Ok(None)`
    fn resolve(
        &self,
        key: &ServiceKey,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Option<ServiceInstance>>;

    /// 按注册顺序解析服务类型的所有注册
    fn resolve_all(
        &self,
        service_type: ServiceType,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Vec<ServiceInstance>>;

    /// 对已有实例执行注入
    fn inject_existing(
        &self,
        target: &mut dyn Any,
        plan: &InjectionPlan,
        resolver: &dyn Resolver,
    ) -> DependencyResult<()> {
        plan.apply(target, resolver)
    }

    /// 释放后端持有的所有资源
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}
