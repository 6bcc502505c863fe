//! 容器扩展与拦截
//!
//! 拦截扩展订阅注册事件，为匹配服务类型的每个注册附加装饰器。
//! 只影响扩展加入之后提交的注册。

use crate::container::ServiceContainer;
use di_abstractions::{DependencyResult, RegistrationEvent, ServiceType};
use std::sync::Arc;
use tracing::debug;

/// 容器扩展
pub trait ContainerExtension: Send + Sync {
    /// 扩展名称
    fn name(&self) -> &str;

    /// 扩展加入容器时调用
    fn initialize(&self, container: &ServiceContainer) -> DependencyResult<()>;
}

type Interceptor = Arc<dyn Fn(&mut RegistrationEvent<'_>) + Send + Sync>;

/// 拦截扩展
#[derive(Default)]
pub struct InterceptionExtension {
    interceptors: Vec<(ServiceType, Interceptor)>,
}

impl InterceptionExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// 拦截服务 `S` 的所有注册，解析出的实例经过 `wrap` 包装
    pub fn intercept<S, F>(mut self, wrap: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>) -> Arc<S> + Send + Sync + 'static,
    {
        let wrap = Arc::new(wrap);
        let interceptor: Interceptor = Arc::new(move |event: &mut RegistrationEvent<'_>| {
            let wrap = wrap.clone();
            event
                .builder
                .decorate::<S, _>(move |service| wrap(service))
                .with_metadata("intercepted", "true");
        });
        self.interceptors.push((ServiceType::of::<S>(), interceptor));
        self
    }

    /// 已配置的拦截服务类型
    pub fn intercepted_services(&self) -> impl Iterator<Item = ServiceType> + '_ {
        self.interceptors.iter().map(|(service_type, _)| *service_type)
    }
}

impl ContainerExtension for InterceptionExtension {
    fn name(&self) -> &str {
        "interception"
    }

    fn initialize(&self, container: &ServiceContainer) -> DependencyResult<()> {
        for (service_type, interceptor) in &self.interceptors {
            let service_type = *service_type;
            let interceptor = interceptor.clone();
            container.subscribe(move |event: &mut RegistrationEvent<'_>| {
                if event.service_type == service_type {
                    debug!(
                        "拦截注册: {} => {}",
                        service_type.short_name(),
                        event.implementation_type.short_name()
                    );
                    interceptor(event);
                }
            })?;
        }
        Ok(())
    }
}
