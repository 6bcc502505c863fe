//! 启动期类型发现
//!
//! 宿主环境提供可加载的模块，启动代码批量扫描其中的类型并注册符合条件的具体类型。
//! 容器本身从不枚举模块。

use crate::scanner::MetadataScanner;
use di_abstractions::{
    DependencyResult, Injectable, Lifetime, ServiceRegistration, ServiceRegistry, TypeDescriptor,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// 模块部分加载失败，`loaded` 为失败前成功加载的类型
#[derive(Error, Debug)]
#[error("模块部分加载失败: {message}")]
pub struct PartialLoad {
    pub loaded: Vec<TypeDescriptor>,
    pub message: String,
}

/// 类型模块
pub trait TypeModule: Send + Sync {
    fn name(&self) -> &str;

    /// 加载模块定义的类型
    fn load_types(&self) -> Result<Vec<TypeDescriptor>, PartialLoad>;
}

/// 宿主环境
pub trait HostingEnvironment: Send + Sync {
    fn modules(&self) -> Vec<Arc<dyn TypeModule>>;
}

/// 静态类型模块
pub struct StaticModule {
    name: String,
    types: Vec<fn() -> TypeDescriptor>,
}

impl StaticModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type<T: Injectable>(mut self) -> Self {
        self.types.push(T::describe);
        self
    }
}

impl TypeModule for StaticModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_types(&self) -> Result<Vec<TypeDescriptor>, PartialLoad> {
        Ok(self.types.iter().map(|describe| describe()).collect())
    }
}

impl HostingEnvironment for Vec<Arc<dyn TypeModule>> {
    fn modules(&self) -> Vec<Arc<dyn TypeModule>> {
        self.clone()
    }
}

/// 注册宿主环境中符合条件的具体类型（以自身作为服务类型）
///
/// 部分加载失败的模块保留已加载的类型；没有可用构造函数的类型被跳过。
pub fn register_discovered<F>(
    registry: &dyn ServiceRegistry,
    environment: &dyn HostingEnvironment,
    filter: F,
    lifetime: Lifetime,
) -> DependencyResult<Vec<ServiceRegistration>>
where
    F: Fn(&TypeDescriptor) -> bool,
{
    let mut descriptors = Vec::new();
    for module in environment.modules() {
        match module.load_types() {
            Ok(types) => descriptors.extend(types),
            Err(partial) => {
                warn!(
                    "模块 {} 部分加载失败，保留 {} 个类型: {}",
                    module.name(),
                    partial.loaded.len(),
                    partial.message
                );
                descriptors.extend(partial.loaded);
            }
        }
    }

    let scanner = MetadataScanner::new();
    let scans = scanner.scan_batch(&descriptors);
    let mut registrations = Vec::new();
    for (descriptor, scan) in descriptors.into_iter().zip(scans) {
        if !filter(&descriptor) {
            continue;
        }
        if scan.eligible_constructors().next().is_none() {
            debug!("跳过没有可用构造函数的类型: {}", scan.type_info.short_name());
            continue;
        }
        let service_type = descriptor.type_info();
        registrations.push(registry.register_type(service_type, descriptor, None, lifetime)?);
    }
    info!("类型发现完成，注册 {} 个类型", registrations.len());
    Ok(registrations)
}
