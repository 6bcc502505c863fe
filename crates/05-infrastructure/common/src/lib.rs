//! # Infrastructure Common
//!
//! 这个 crate 提供了依赖注入基础设施的公共类型和错误定义。
//!
//! ## 核心类型
//!
//! - [`ServiceType`] - 服务类型标识（基于 `TypeId`）
//! - [`ServiceKey`] - 服务注册键（类型 + 可选名称）
//! - [`Lifetime`] - 服务生命周期策略
//! - [`DependencyError`] - 依赖注入错误
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 同步优先，所有操作在调用线程上完成
//! - 错误快速失败，不做内部重试

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
