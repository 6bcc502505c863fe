//! 绑定表
//!
//! 两种内置后端共用的解析引擎：按服务键保存绑定，并按作用域规则缓存实例。
//! 线程作用域的实例在线程退出或绑定表清空时释放，以先发生者为准。

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use di_abstractions::{
    Activator, BackendRegistration, DependencyError, DependencyResult, InstanceScope,
    RegistrationBuilder, ResolutionFailure, Resolver, ServiceCaster, ServiceInstance, ServiceKey,
    ServiceRegistration, ServiceType,
};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use tracing::debug;

type ThreadInstances = DashMap<ThreadId, ServiceInstance>;

thread_local! {
    static THREAD_EXIT: ThreadExitGuard = ThreadExitGuard {
        thread: thread::current().id(),
        tables: RefCell::new(Vec::new()),
    };
}

/// 线程退出时移除该线程在各绑定中缓存的实例
struct ThreadExitGuard {
    thread: ThreadId,
    tables: RefCell<Vec<Weak<ThreadInstances>>>,
}

impl Drop for ThreadExitGuard {
    fn drop(&mut self) {
        for table in self.tables.get_mut().drain(..) {
            if let Some(table) = table.upgrade() {
                table.remove(&self.thread);
            }
        }
    }
}

fn release_on_thread_exit(instances: &Arc<ThreadInstances>) {
    let registered = THREAD_EXIT.try_with(|guard| {
        let mut tables = guard.tables.borrow_mut();
        tables.retain(|table| table.strong_count() > 0);
        let weak = Arc::downgrade(instances);
        if !tables.iter().any(|table| table.ptr_eq(&weak)) {
            tables.push(weak);
        }
    });
    if registered.is_err() {
        debug!("线程正在退出，线程作用域实例将在绑定表清空时释放");
    }
}

enum Source {
    Activator {
        activator: Activator,
        caster: ServiceCaster,
    },
    Instance,
}

struct Binding {
    registration: ServiceRegistration,
    scope: InstanceScope,
    source: Source,
    builder: RegistrationBuilder,
    shared: OnceCell<ServiceInstance>,
    per_thread: Arc<ThreadInstances>,
}

impl Binding {
    fn instance(&self, resolver: &dyn Resolver) -> DependencyResult<ServiceInstance> {
        match self.scope {
            InstanceScope::PerDependency => self.create(resolver),
            InstanceScope::Container => self
                .shared
                .get_or_try_init(|| self.create(resolver))
                .cloned(),
            InstanceScope::Thread => {
                let thread_id = thread::current().id();
                if let Some(existing) = self.per_thread.get(&thread_id) {
                    return Ok(existing.clone());
                }
                let created = self.create(resolver)?;
                let instance = match self.per_thread.entry(thread_id) {
                    Entry::Occupied(entry) => return Ok(entry.get().clone()),
                    Entry::Vacant(entry) => entry.insert(created).value().clone(),
                };
                release_on_thread_exit(&self.per_thread);
                Ok(instance)
            }
            InstanceScope::Request => {
                let scope = resolver.request_scope().ok_or_else(|| {
                    DependencyError::resolution_failed(
                        self.registration.key(),
                        ResolutionFailure::NoRequestScope,
                    )
                })?;
                scope.get_or_create(self.registration.id(), || self.create(resolver))
            }
        }
    }

    fn create(&self, resolver: &dyn Resolver) -> DependencyResult<ServiceInstance> {
        let Source::Activator { activator, caster } = &self.source else {
            return self.shared.get().cloned().ok_or_else(|| {
                DependencyError::activation(self.registration.key(), "实例注册已被释放")
            });
        };

        let concrete = activator(resolver)?;
        self.builder.notify_activated(&self.registration, &concrete);
        let service = caster(concrete).ok_or_else(|| {
            DependencyError::resolution_failed(
                self.registration.key(),
                ResolutionFailure::TypeMismatch {
                    expected: self.registration.service_type().name().to_string(),
                    actual: self.registration.implementation_type().name().to_string(),
                },
            )
        })?;
        self.builder.apply_decorators(service)
    }
}

/// 绑定表
#[derive(Default)]
pub struct BindingTable {
    bindings: RwLock<HashMap<ServiceKey, Arc<Binding>>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加类型绑定，取代同一服务键的旧绑定
    pub fn bind(&self, registration: BackendRegistration) {
        let BackendRegistration {
            registration,
            scope,
            activator,
            caster,
            builder,
        } = registration;
        self.insert(Binding {
            registration,
            scope,
            source: Source::Activator { activator, caster },
            builder,
            shared: OnceCell::new(),
            per_thread: Arc::default(),
        });
    }

    /// 添加实例绑定
    pub fn bind_instance(&self, registration: ServiceRegistration, instance: ServiceInstance) {
        self.insert(Binding {
            registration,
            scope: InstanceScope::Container,
            source: Source::Instance,
            builder: RegistrationBuilder::default(),
            shared: OnceCell::with_value(instance),
            per_thread: Arc::default(),
        });
    }

    fn insert(&self, binding: Binding) {
        let key = binding.registration.key().clone();
        if let Some(previous) = self.bindings.write().insert(key, Arc::new(binding)) {
            debug!("注册 {} 已被取代", previous.registration);
        }
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.bindings.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// 解析服务键，解析过程中不持有表锁
    pub fn resolve(
        &self,
        key: &ServiceKey,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Option<ServiceInstance>> {
        let binding = self.bindings.read().get(key).cloned();
        binding
            .map(|binding| binding.instance(resolver))
            .transpose()
    }

    /// 按注册顺序解析服务类型的所有绑定
    pub fn resolve_all(
        &self,
        service_type: ServiceType,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Vec<ServiceInstance>> {
        let mut bindings: Vec<Arc<Binding>> = self
            .bindings
            .read()
            .values()
            .filter(|binding| binding.registration.service_type() == service_type)
            .cloned()
            .collect();
        bindings.sort_by_key(|binding| binding.registration.id());
        bindings
            .iter()
            .map(|binding| binding.instance(resolver))
            .collect()
    }

    /// 清空所有绑定与缓存的实例
    pub fn clear(&self) {
        let bindings: Vec<Arc<Binding>> = self.bindings.write().drain().map(|(_, b)| b).collect();
        for binding in &bindings {
            binding.per_thread.clear();
        }
        debug!("已释放 {} 个绑定", bindings.len());
    }
}
