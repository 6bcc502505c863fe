//! 元数据定义
//!
//! 提供服务类型与服务注册键的元数据信息

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 服务类型信息
///
/// 相等性与哈希仅由 `TypeId` 决定，名称只用于诊断输出。
#[derive(Clone, Copy)]
pub struct ServiceType {
    id: TypeId,
    name: &'static str,
}

impl ServiceType {
    /// 从类型获取服务类型信息，支持 `dyn Trait` 等非定长类型
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 类型ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称（包含模块路径）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        let base = name.split('<').next().unwrap_or(name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// 是否为指定类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceType").field(&self.name).finish()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 服务注册键
///
/// 由服务类型与可选名称组成；空名称与 `None` 等价，表示该类型的默认注册。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    service_type: ServiceType,
    name: Option<Arc<str>>,
}

impl ServiceKey {
    /// 创建服务注册键
    pub fn new(service_type: ServiceType, name: Option<&str>) -> Self {
        Self {
            service_type,
            name: name.filter(|name| !name.is_empty()).map(Arc::from),
        }
    }

    /// 指定类型的默认注册键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(ServiceType::of::<T>(), None)
    }

    /// 指定类型的命名注册键
    pub fn named<T: ?Sized + 'static>(name: &str) -> Self {
        Self::new(ServiceType::of::<T>(), Some(name))
    }

    /// 服务类型
    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// 服务名称
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 是否为默认注册
    pub fn is_default(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Key({}, Name({}))", self.service_type.name, name),
            None => write!(f, "Key({})", self.service_type.name),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.service_type.short_name(), name),
            None => f.write_str(self.service_type.short_name()),
        }
    }
}
