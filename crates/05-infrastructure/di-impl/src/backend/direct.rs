//! 即时提交后端
//!
//! 每次注册都直接写入绑定表，没有构建阶段。

use super::engine::BindingTable;
use di_abstractions::{
    Backend, BackendRegistration, DependencyError, DependencyResult, Resolver, ServiceInstance,
    ServiceKey, ServiceRegistration, ServiceType,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// 即时提交后端
#[derive(Default)]
pub struct DirectBackend {
    table: BindingTable,
    disposed: AtomicBool,
}

impl DirectBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> DependencyResult<&BindingTable> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(DependencyError::Disposed);
        }
        Ok(&self.table)
    }
}

impl Backend for DirectBackend {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn register(&self, registration: BackendRegistration) -> DependencyResult<()> {
        self.table()?.bind(registration);
        Ok(())
    }

    fn register_instance(
        &self,
        registration: ServiceRegistration,
        instance: ServiceInstance,
    ) -> DependencyResult<()> {
        self.table()?.bind_instance(registration, instance);
        Ok(())
    }

    fn is_registered(&self, key: &ServiceKey) -> bool {
        self.table().map_or(false, |table| table.contains(key))
    }

    fn resolve(
        &self,
        key: &ServiceKey,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Option<ServiceInstance>> {
        self.table()?.resolve(key, resolver)
    }

    fn resolve_all(
        &self,
        service_type: ServiceType,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Vec<ServiceInstance>> {
        self.table()?.resolve_all(service_type, resolver)
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.table.clear();
        info!("即时提交后端已释放");
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
