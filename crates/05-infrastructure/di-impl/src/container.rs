//! 服务容器
//!
//! 与后端无关的容器门面：注册经过注册事件中心后提交给后端，解析由后端完成，
//! 实例的构造与注入使用按类型缓存的注入计划。

use crate::backend::create_backend;
use crate::config::ContainerOptions;
use crate::hub::{RegistrationEventHub, SubscriptionId};
use crate::injector::InjectorBuilder;
use crate::interception::ContainerExtension;
use crate::selector::ConstructorSelector;
use di_abstractions::{
    Activator, Backend, BackendRegistration, ContainerState, DependencyError, DependencyResult,
    Injectable, Lifetime, LifetimePolicy, RegistrationBuilder, RegistrationEvent, RegistrationId,
    RegistrationObserver, RequestScope, ResolutionChain, Resolver, ServiceInstance, ServiceKey,
    ServiceRegistration, ServiceRegistry, ServiceType, StandardLifetimePolicy, TypeDescriptor,
};
use parking_lot::{Mutex, RwLock};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// 服务容器
pub struct ServiceContainer {
    backend: Arc<dyn Backend>,
    policy: Arc<dyn LifetimePolicy>,
    injector: Arc<InjectorBuilder>,
    hub: RegistrationEventHub,
    options: ContainerOptions,
    registrations: RwLock<HashMap<ServiceKey, ServiceRegistration>>,
    implicit: Mutex<()>,
    extensions: Mutex<Vec<Arc<dyn ContainerExtension>>>,
    next_id: AtomicU64,
    disposed: AtomicBool,
}

impl ServiceContainer {
    /// 使用默认选项创建容器
    pub fn new() -> Self {
        Self::from_options(ContainerOptions::default())
    }

    /// 按选项创建容器，后端由 `options.backend` 决定
    pub fn from_options(options: ContainerOptions) -> Self {
        Self::builder().with_options(options).build()
    }

    /// 创建共享容器，容器把自身的 [`ContainerHandle`] 注册为实例
    pub fn shared(options: ContainerOptions) -> DependencyResult<Arc<Self>> {
        Self::builder().with_options(options).build_shared()
    }

    /// 使用指定后端创建容器
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self::builder().with_backend(backend).build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// 当前后端名称
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// 注入器构建器（计划缓存）
    pub fn injector(&self) -> &InjectorBuilder {
        &self.injector
    }

    pub fn state(&self) -> ContainerState {
        if self.is_disposed() {
            ContainerState::Disposed
        } else {
            ContainerState::Open
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> DependencyResult<()> {
        if self.is_disposed() {
            return Err(DependencyError::Disposed);
        }
        Ok(())
    }

    /// 注册类型映射 `S` → `T`
    pub fn register<S, T>(
        &self,
        name: Option<&str>,
        lifetime: Lifetime,
    ) -> DependencyResult<ServiceRegistration>
    where
        S: ?Sized + 'static,
        T: Injectable,
    {
        self.register_descriptor(ServiceType::of::<S>(), T::describe(), name, lifetime)
    }

    /// 注册具体类型自身
    pub fn register_self<T: Injectable>(
        &self,
        name: Option<&str>,
        lifetime: Lifetime,
    ) -> DependencyResult<ServiceRegistration> {
        self.register::<T, T>(name, lifetime)
    }

    /// 按类型描述注册实现类型
    ///
    /// 实现类型必须能够提供服务类型；注册事件在提交前发布，观察者的修改对提交可见。
    pub fn register_descriptor(
        &self,
        service_type: ServiceType,
        implementation: TypeDescriptor,
        name: Option<&str>,
        lifetime: Lifetime,
    ) -> DependencyResult<ServiceRegistration> {
        self.ensure_open()?;
        let caster = implementation
            .caster_for(service_type)
            .cloned()
            .ok_or_else(|| {
                DependencyError::invalid_argument(format!(
                    "{} 不能作为 {} 的实现",
                    implementation.type_info().name(),
                    service_type.name()
                ))
            })?;
        let key = ServiceKey::new(service_type, name);
        let implementation_type = implementation.type_info();

        let mut builder = RegistrationBuilder::new();
        let mut event = RegistrationEvent {
            service_type,
            implementation_type,
            service_name: key.name(),
            lifetime,
            builder: &mut builder,
        };
        self.hub.publish(&mut event);

        let injector = self.injector.clone();
        let activator: Activator = Arc::new(move |resolver: &dyn Resolver| {
            injector.get_or_build_plan(&implementation)?.instantiate(resolver)
        });

        let mut registrations = self.registrations.write();
        self.ensure_open()?;
        let registration = ServiceRegistration::new(
            self.allocate_id(),
            key.clone(),
            implementation_type,
            lifetime,
        );
        self.backend.register(BackendRegistration {
            registration: registration.clone(),
            scope: self.policy.scope_for(lifetime),
            activator,
            caster,
            builder,
        })?;
        registrations.insert(key, registration.clone());
        info!("注册服务: {}", registration);
        Ok(registration)
    }

    /// 注册预先构建的实例，等同单例，不执行注入
    pub fn register_instance<S>(
        &self,
        instance: Arc<S>,
        name: Option<&str>,
    ) -> DependencyResult<ServiceRegistration>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.register_service_instance_inner(ServiceInstance::new(instance), name)
    }

    fn register_service_instance_inner(
        &self,
        instance: ServiceInstance,
        name: Option<&str>,
    ) -> DependencyResult<ServiceRegistration> {
        let key = ServiceKey::new(instance.service_type(), name);
        let mut registrations = self.registrations.write();
        self.ensure_open()?;
        let registration = ServiceRegistration::new(
            self.allocate_id(),
            key.clone(),
            instance.service_type(),
            Lifetime::Singleton,
        );
        self.backend
            .register_instance(registration.clone(), instance)?;
        registrations.insert(key, registration.clone());
        info!("注册实例: {}", registration);
        Ok(registration)
    }

    fn allocate_id(&self) -> RegistrationId {
        RegistrationId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// 解析服务，未注册时返回解析失败错误
    pub fn get_instance<S>(&self, name: Option<&str>) -> DependencyResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.get_in_scope(name, None)
    }

    /// 解析服务，未注册时返回 `Ok(None)`
    pub fn try_get_instance<S>(&self, name: Option<&str>) -> DependencyResult<Option<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::new(ServiceType::of::<S>(), name);
        ResolutionContext::new(self, None)
            .try_resolve(&key)?
            .map(|instance| instance.expect::<S>(&key))
            .transpose()
    }

    /// 解析具体类型，未注册时按选项隐式注册自身
    pub fn get_concrete<T: Injectable>(&self, name: Option<&str>) -> DependencyResult<Arc<T>> {
        self.get_concrete_in_scope(name, None)
    }

    /// 解析服务类型的所有注册，按注册顺序返回
    pub fn get_all_instances<S>(&self) -> DependencyResult<Vec<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.get_all_in_scope(None)
    }

    /// 对已有实例执行属性与方法注入，不调用构造函数
    pub fn inject_existing<T: Injectable>(&self, target: &mut T) -> DependencyResult<()> {
        self.inject_in_scope(target, None)
    }

    /// 创建请求作用域
    pub fn request_scope(&self, name: impl Into<String>) -> DependencyResult<RequestContainer<'_>> {
        self.ensure_open()?;
        let scope = RequestScope::new(name);
        debug!("创建请求作用域: {} ({})", scope.info().name, scope.info().id);
        Ok(RequestContainer {
            container: self,
            scope,
        })
    }

    fn get_in_scope<S>(&self, name: Option<&str>, scope: Option<&RequestScope>) -> DependencyResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::new(ServiceType::of::<S>(), name);
        ResolutionContext::new(self, scope)
            .resolve(&key)?
            .expect::<S>(&key)
    }

    fn get_concrete_in_scope<T: Injectable>(
        &self,
        name: Option<&str>,
        scope: Option<&RequestScope>,
    ) -> DependencyResult<Arc<T>> {
        self.ensure_open()?;
        let key = ServiceKey::new(ServiceType::of::<T>(), name);
        if self.options.implicit_registration && !self.backend.is_registered(&key) {
            let _guard = self.implicit.lock();
            if !self.backend.is_registered(&key) {
                info!(
                    "隐式注册具体类型: {} [{}]",
                    key, self.options.implicit_lifetime
                );
                self.register_descriptor(
                    key.service_type(),
                    T::describe(),
                    name,
                    self.options.implicit_lifetime,
                )?;
            }
        }
        self.get_in_scope(name, scope)
    }

    fn get_all_in_scope<S>(&self, scope: Option<&RequestScope>) -> DependencyResult<Vec<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<S>();
        ResolutionContext::new(self, scope)
            .resolve_all(key.service_type())?
            .iter()
            .map(|instance| instance.expect::<S>(&key))
            .collect()
    }

    fn inject_in_scope<T: Injectable>(
        &self,
        target: &mut T,
        scope: Option<&RequestScope>,
    ) -> DependencyResult<()> {
        self.ensure_open()?;
        let plan = self.injector.member_plan_for::<T>()?;
        let context = ResolutionContext::new(self, scope);
        self.backend.inject_existing(target, &plan, &context)
    }

    /// 订阅注册事件
    pub fn subscribe<O>(&self, observer: O) -> DependencyResult<SubscriptionId>
    where
        O: RegistrationObserver + 'static,
    {
        self.ensure_open()?;
        Ok(self.hub.subscribe(observer))
    }

    /// 退订注册事件
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// 加入容器扩展
    pub fn add_extension<E>(&self, extension: E) -> DependencyResult<()>
    where
        E: ContainerExtension + 'static,
    {
        self.ensure_open()?;
        extension.initialize(self)?;
        info!("加入容器扩展: {}", extension.name());
        self.extensions.lock().push(Arc::new(extension));
        Ok(())
    }

    /// 已加入的扩展名称
    pub fn extensions(&self) -> Vec<String> {
        self.extensions
            .lock()
            .iter()
            .map(|extension| extension.name().to_string())
            .collect()
    }

    /// 服务键是否已注册
    pub fn contains<S: ?Sized + 'static>(&self, name: Option<&str>) -> bool {
        self.backend
            .is_registered(&ServiceKey::new(ServiceType::of::<S>(), name))
    }

    /// 已提交注册的快照，按注册顺序排列
    pub fn registrations(&self) -> Vec<ServiceRegistration> {
        let mut registrations: Vec<_> = self.registrations.read().values().cloned().collect();
        registrations.sort_by_key(ServiceRegistration::id);
        registrations
    }

    /// 释放容器，重复调用无副作用
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.backend.dispose();
        self.injector.clear();
        self.hub.clear();
        self.extensions.lock().clear();
        self.registrations.write().clear();
        info!("容器已释放");
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ServiceContainer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl ServiceRegistry for ServiceContainer {
    fn register_type(
        &self,
        service_type: ServiceType,
        implementation: TypeDescriptor,
        name: Option<&str>,
        lifetime: Lifetime,
    ) -> DependencyResult<ServiceRegistration> {
        self.register_descriptor(service_type, implementation, name, lifetime)
    }

    fn register_service_instance(
        &self,
        instance: ServiceInstance,
        name: Option<&str>,
    ) -> DependencyResult<ServiceRegistration> {
        self.register_service_instance_inner(instance, name)
    }

    fn resolve_service(&self, key: &ServiceKey) -> DependencyResult<ServiceInstance> {
        ResolutionContext::new(self, None).resolve(key)
    }

    fn resolve_all_services(
        &self,
        service_type: ServiceType,
    ) -> DependencyResult<Vec<ServiceInstance>> {
        ResolutionContext::new(self, None).resolve_all(service_type)
    }

    fn is_registered(&self, key: &ServiceKey) -> bool {
        self.backend.is_registered(key)
    }

    fn registrations(&self) -> Vec<ServiceRegistration> {
        ServiceContainer::registrations(self)
    }

    fn dispose(&self) {
        ServiceContainer::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        ServiceContainer::is_disposed(self)
    }
}

/// 容器构建器
pub struct ContainerBuilder {
    options: ContainerOptions,
    backend: Option<Arc<dyn Backend>>,
    policy: Arc<dyn LifetimePolicy>,
    selector: Option<Arc<dyn ConstructorSelector>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            options: ContainerOptions::default(),
            backend: None,
            policy: Arc::new(StandardLifetimePolicy),
            selector: None,
        }
    }

    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// 使用外部后端，忽略 `options.backend`
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_lifetime_policy(mut self, policy: Arc<dyn LifetimePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_constructor_selector(mut self, selector: Arc<dyn ConstructorSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn build(self) -> ServiceContainer {
        let backend = self
            .backend
            .unwrap_or_else(|| create_backend(self.options.backend));
        let injector = match self.selector {
            Some(selector) => InjectorBuilder::with_selector(selector),
            None => InjectorBuilder::new(),
        };
        info!("创建服务容器，后端: {}", backend.name());
        ServiceContainer {
            backend,
            policy: self.policy,
            injector: Arc::new(injector),
            hub: RegistrationEventHub::new(),
            options: self.options,
            registrations: RwLock::new(HashMap::new()),
            implicit: Mutex::new(()),
            extensions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }
}

impl ContainerBuilder {
    /// 构建共享容器并注册 [`ContainerHandle`]
    ///
    /// 句柄只持有弱引用，容器的最后一个 `Arc` 被释放后句柄失效。
    pub fn build_shared(self) -> DependencyResult<Arc<ServiceContainer>> {
        let container = Arc::new(self.build());
        container.register_instance(
            Arc::new(ContainerHandle {
                container: Arc::downgrade(&container),
            }),
            None,
        )?;
        Ok(container)
    }
}

/// 容器句柄
///
/// 服务可以在构造函数中依赖 `Arc<ContainerHandle>`，在运行时按需解析其他服务。
pub struct ContainerHandle {
    container: Weak<ServiceContainer>,
}

impl ContainerHandle {
    /// 获取容器，容器已被释放时返回 [`DependencyError::Disposed`]
    pub fn container(&self) -> DependencyResult<Arc<ServiceContainer>> {
        self.container
            .upgrade()
            .filter(|container| !container.is_disposed())
            .ok_or(DependencyError::Disposed)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 请求作用域容器
///
/// 在作用域内解析的 `PerRequest` 服务共享同一实例，作用域结束时释放。
pub struct RequestContainer<'c> {
    container: &'c ServiceContainer,
    scope: RequestScope,
}

impl RequestContainer<'_> {
    pub fn scope(&self) -> &RequestScope {
        &self.scope
    }

    pub fn get_instance<S>(&self, name: Option<&str>) -> DependencyResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.container.get_in_scope(name, Some(&self.scope))
    }

    pub fn get_concrete<T: Injectable>(&self, name: Option<&str>) -> DependencyResult<Arc<T>> {
        self.container.get_concrete_in_scope(name, Some(&self.scope))
    }

    pub fn get_all_instances<S>(&self) -> DependencyResult<Vec<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.container.get_all_in_scope(Some(&self.scope))
    }

    pub fn inject_existing<T: Injectable>(&self, target: &mut T) -> DependencyResult<()> {
        self.container.inject_in_scope(target, Some(&self.scope))
    }
}

impl Drop for RequestContainer<'_> {
    fn drop(&mut self) {
        debug!("结束请求作用域: {}", self.scope.info().name);
        self.scope.clear();
    }
}

/// 单次解析调用的上下文
///
/// 记录解析链以检测循环依赖，并携带当前请求作用域。
struct ResolutionContext<'c> {
    container: &'c ServiceContainer,
    scope: Option<&'c RequestScope>,
    chain: RefCell<ResolutionChain>,
}

impl<'c> ResolutionContext<'c> {
    fn new(container: &'c ServiceContainer, scope: Option<&'c RequestScope>) -> Self {
        Self {
            container,
            scope,
            chain: RefCell::new(ResolutionChain::new(
                container.options.max_resolution_depth,
            )),
        }
    }
}

impl Resolver for ResolutionContext<'_> {
    fn try_resolve(&self, key: &ServiceKey) -> DependencyResult<Option<ServiceInstance>> {
        self.container.ensure_open()?;
        self.chain.borrow_mut().enter(key)?;
        let resolved = self.container.backend.resolve(key, self);
        self.chain.borrow_mut().exit();
        resolved
    }

    fn resolve_all(&self, service_type: ServiceType) -> DependencyResult<Vec<ServiceInstance>> {
        self.container.ensure_open()?;
        self.container.backend.resolve_all(service_type, self)
    }

    fn request_scope(&self) -> Option<&RequestScope> {
        self.scope
    }
}
