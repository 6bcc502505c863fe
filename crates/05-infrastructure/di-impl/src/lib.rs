//! # 依赖注入具体实现
//!
//! 提供与后端无关的服务容器、元数据扫描器、构造函数选择器、注入器构建器、
//! 注册事件中心以及两种内置后端（延迟构建与即时提交）。
//!
//! ```ignore
//! let container = ServiceContainer::new();
//! container.register::<dyn Repository, SqlRepository>(None, Lifetime::Singleton)?;
//! let repository = container.get_instance::<dyn Repository>(None)?;
//! ```

pub mod backend;
pub mod config;
pub mod container;
pub mod discovery;
pub mod hub;
pub mod injector;
pub mod interception;
pub mod scanner;
pub mod selector;

pub use backend::{create_backend, BindingTable, DirectBackend, StagedBackend};
pub use config::{BackendKind, ContainerOptions};
pub use container::{ContainerBuilder, ContainerHandle, RequestContainer, ServiceContainer};
pub use discovery::{register_discovered, HostingEnvironment, PartialLoad, StaticModule, TypeModule};
pub use hub::{RegistrationEventHub, SubscriptionId};
pub use injector::InjectorBuilder;
pub use interception::{ContainerExtension, InterceptionExtension};
pub use scanner::{Candidate, MetadataScanner, ScanResult};
pub use selector::{ConstructorSelector, MostParametersSelector};
