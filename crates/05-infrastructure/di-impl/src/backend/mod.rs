//! 内置后端适配器

mod direct;
mod engine;
mod staged;

pub use direct::DirectBackend;
pub use engine::BindingTable;
pub use staged::StagedBackend;

use crate::config::BackendKind;
use di_abstractions::Backend;
use std::sync::Arc;

/// 按类型创建内置后端
pub fn create_backend(kind: BackendKind) -> Arc<dyn Backend> {
    match kind {
        BackendKind::Staged => Arc::new(StagedBackend::new()),
        BackendKind::Direct => Arc::new(DirectBackend::new()),
    }
}
