//! # Injection Macros
//!
//! 在编译期为类型生成注入描述（`TypeDescriptor`），替代运行时反射。
//!
//! ## 核心宏
//!
//! - [`Injectable`] - 派生 `Injectable`，描述服务映射与注入属性
//! - [`injectable`] - 标注 impl 块，描述构造函数与注入方法
//!
//! ## 使用示例
//!
//! ```ignore
//! use injection_macros::{injectable, Injectable};
//! use std::sync::Arc;
//!
//! #[derive(Injectable)]
//! #[injection(provides(dyn OrderService), members)]
//! pub struct DefaultOrderService {
//!     repository: Arc<dyn OrderRepository>,
//!     #[inject]
//!     pub audit: Option<Arc<dyn AuditLog>>,
//! }
//!
//! #[injectable]
//! impl DefaultOrderService {
//!     #[inject]
//!     pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
//!         Self { repository, audit: None }
//!     }
//!
//!     #[inject]
//!     pub fn attach_clock(&mut self, clock: Arc<dyn Clock>) {
//!         // ...
//!     }
//! }
//! ```

use proc_macro::TokenStream;

mod derive;
mod members;
mod utils;

/// 派生 `Injectable`
///
/// # 结构体参数 `#[injection(...)]`
///
/// - `provides(dyn A, dyn B)` - 类型可以作为这些服务的实现
/// - `members` - 构造函数与方法由 `#[injectable]` impl 块提供；
///   未指定时使用 `Default` 作为唯一构造函数
///
/// # 字段标记
///
/// - `#[inject]` - 可选注入属性，字段类型必须是 `Option<Arc<T>>`
/// - `#[inject(required)]` - 必需注入属性，服务缺失时解析失败
///
/// 只有 `pub` 字段会被注入。
#[proc_macro_derive(Injectable, attributes(injection, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    derive::derive_injectable_impl(input)
}

/// 标注 impl 块，生成 `InjectableMembers`
///
/// - 返回 `Self` 且参数均为 `Arc<T>` 的关联函数作为构造函数，`#[inject]` 标记的优先
/// - `#[inject]` 标记的 `&mut self` 方法在属性注入后按声明顺序调用
/// - `#[inject]` 标记的其他关联函数被记录但不会被调用
///
/// # 示例
///
/// ```ignore
/// #[injectable]
/// impl Greeter {
///     pub fn new(clock: Arc<dyn Clock>) -> Self {
///         Self { clock }
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn injectable(args: TokenStream, input: TokenStream) -> TokenStream {
    members::injectable_impl(args, input)
}
