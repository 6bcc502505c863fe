//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义类型描述、注入计划、后端适配器与注册事件的核心接口。
//!
//! ## 核心接口
//!
//! - [`TypeDescriptor`] / [`Injectable`] - 类型结构描述（构造函数、属性、方法）
//! - [`InjectionPlan`] - 按具体类型编译的注入计划
//! - [`Resolver`] - 依赖解析接口
//! - [`Backend`] - 后端注入引擎适配器接口
//! - [`LifetimePolicy`] - 生命周期到作用域规则的映射
//! - [`RegistrationObserver`] - 注册事件观察者

pub mod backend;
pub mod descriptor;
pub mod events;
pub mod instance;
pub mod lifetime;
pub mod plan;
pub mod registry;
pub mod resolver;
pub mod scope;

pub use backend::*;
pub use descriptor::*;
pub use events::*;
pub use instance::*;
pub use lifetime::*;
pub use plan::*;
pub use registry::*;
pub use resolver::*;
pub use scope::*;

pub use infrastructure_common::{
    ContainerState, DependencyError, DependencyResult, Lifetime, ResolutionFailure, Scope,
    ServiceKey, ServiceType,
};
