//! 延迟构建后端
//!
//! 注册先暂存在构建器中，第一次解析时才构建绑定表。构建使用双重检查：
//! 快路径无锁读取，只有需要构建时才获取锁，并在持锁后再次检查。

use super::engine::BindingTable;
use di_abstractions::{
    Backend, BackendRegistration, DependencyError, DependencyResult, Resolver, ServiceInstance,
    ServiceKey, ServiceRegistration, ServiceType,
};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

enum Staged {
    Type(BackendRegistration),
    Instance(ServiceRegistration, ServiceInstance),
}

impl Staged {
    fn key(&self) -> &ServiceKey {
        match self {
            Self::Type(registration) => registration.registration.key(),
            Self::Instance(registration, _) => registration.key(),
        }
    }
}

/// 延迟构建后端
#[derive(Default)]
pub struct StagedBackend {
    pending: Mutex<Vec<Staged>>,
    engine: OnceCell<BindingTable>,
    disposed: AtomicBool,
}

impl StagedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定表是否已经构建
    pub fn is_materialized(&self) -> bool {
        self.engine.get().is_some()
    }

    fn ensure_open(&self) -> DependencyResult<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(DependencyError::Disposed);
        }
        Ok(())
    }

    fn ensure_engine(&self) -> DependencyResult<&BindingTable> {
        self.ensure_open()?;
        if let Some(engine) = self.engine.get() {
            return Ok(engine);
        }

        let mut pending = self.pending.lock();
        if let Some(engine) = self.engine.get() {
            return Ok(engine);
        }
        self.ensure_open()?;

        let table = BindingTable::new();
        let count = pending.len();
        for staged in pending.drain(..) {
            match staged {
                Staged::Type(registration) => table.bind(registration),
                Staged::Instance(registration, instance) => table.bind_instance(registration, instance),
            }
        }
        info!("延迟构建后端已构建，绑定数: {}", count);
        Ok(self.engine.get_or_init(|| table))
    }

    fn stage(&self, staged: Staged) -> DependencyResult<()> {
        self.ensure_open()?;
        let mut pending = self.pending.lock();
        match self.engine.get() {
            Some(engine) => {
                debug!("后端已构建，直接更新绑定表: {:?}", staged.key());
                match staged {
                    Staged::Type(registration) => engine.bind(registration),
                    Staged::Instance(registration, instance) => {
                        engine.bind_instance(registration, instance)
                    }
                }
            }
            None => pending.push(staged),
        }
        Ok(())
    }
}

impl Backend for StagedBackend {
    fn name(&self) -> &'static str {
        "staged"
    }

    fn register(&self, registration: BackendRegistration) -> DependencyResult<()> {
        self.stage(Staged::Type(registration))
    }

    fn register_instance(
        &self,
        registration: ServiceRegistration,
        instance: ServiceInstance,
    ) -> DependencyResult<()> {
        self.stage(Staged::Instance(registration, instance))
    }

    fn is_registered(&self, key: &ServiceKey) -> bool {
        if self.disposed.load(Ordering::Acquire) {
            return false;
        }
        let pending = self.pending.lock();
        match self.engine.get() {
            Some(engine) => engine.contains(key),
            None => pending.iter().any(|staged| staged.key() == key),
        }
    }

    fn resolve(
        &self,
        key: &ServiceKey,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Option<ServiceInstance>> {
        self.ensure_engine()?.resolve(key, resolver)
    }

    fn resolve_all(
        &self,
        service_type: ServiceType,
        resolver: &dyn Resolver,
    ) -> DependencyResult<Vec<ServiceInstance>> {
        self.ensure_engine()?.resolve_all(service_type, resolver)
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.pending.lock().clear();
        if let Some(engine) = self.engine.get() {
            engine.clear();
        }
        info!("延迟构建后端已释放");
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
