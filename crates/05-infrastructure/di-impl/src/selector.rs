//! 构造函数选择器

use crate::scanner::ScanResult;
use di_abstractions::{ConstructorDescriptor, DependencyError, DependencyResult};

/// 构造函数选择策略
pub trait ConstructorSelector: Send + Sync {
    /// 从扫描结果的可用构造函数中选出一个
    fn select(&self, scan: &ScanResult) -> DependencyResult<ConstructorDescriptor>;
}

/// 参数最多者优先
///
/// 可用构造函数由扫描器确定：有标记时只包含被标记的，否则为全部公开构造函数。
/// 参数个数相同时取声明顺序中靠前的一个。
#[derive(Debug, Clone, Copy, Default)]
pub struct MostParametersSelector;

impl ConstructorSelector for MostParametersSelector {
    fn select(&self, scan: &ScanResult) -> DependencyResult<ConstructorDescriptor> {
        scan.eligible_constructors()
            .fold(None::<&ConstructorDescriptor>, |best, candidate| match best {
                Some(best) if best.parameters().len() >= candidate.parameters().len() => Some(best),
                _ => Some(candidate),
            })
            .cloned()
            .ok_or_else(|| DependencyError::NoSuitableConstructor {
                type_name: scan.type_info.name().to_string(),
            })
    }
}
