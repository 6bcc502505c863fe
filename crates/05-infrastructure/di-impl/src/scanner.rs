//! 元数据扫描器
//!
//! 枚举类型的构造函数、属性和方法，并标出可以参与注入的成员。

use di_abstractions::{
    ConstructorDescriptor, DependencyError, DependencyResult, LoadFailure, MethodDescriptor,
    PropertyDescriptor, ServiceType, TypeDescriptor,
};
use tracing::{debug, warn};

/// 扫描到的候选成员
#[derive(Debug, Clone)]
pub struct Candidate<M> {
    pub member: M,
    pub eligible: bool,
}

/// 单个类型的扫描结果
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub type_info: ServiceType,
    pub constructors: Vec<Candidate<ConstructorDescriptor>>,
    pub properties: Vec<Candidate<PropertyDescriptor>>,
    pub methods: Vec<Candidate<MethodDescriptor>>,
    /// 批量扫描时跳过的成员
    pub skipped: Vec<LoadFailure>,
}

impl ScanResult {
    pub fn eligible_constructors(&self) -> impl Iterator<Item = &ConstructorDescriptor> {
        eligible(&self.constructors)
    }

    pub fn eligible_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        eligible(&self.properties)
    }

    pub fn eligible_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        eligible(&self.methods)
    }
}

fn eligible<M>(candidates: &[Candidate<M>]) -> impl Iterator<Item = &M> {
    candidates
        .iter()
        .filter(|candidate| candidate.eligible)
        .map(|candidate| &candidate.member)
}

/// 元数据扫描器
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataScanner;

impl MetadataScanner {
    pub fn new() -> Self {
        Self
    }

    /// 扫描单个类型，成员无法加载时返回 [`DependencyError::TypeLoad`]
    pub fn scan(&self, descriptor: &TypeDescriptor) -> DependencyResult<ScanResult> {
        if let Some(failure) = descriptor.load_failures().first() {
            return Err(DependencyError::TypeLoad {
                type_name: descriptor.type_info().name().to_string(),
                member: failure.member.clone(),
                message: failure.message.clone(),
            });
        }
        Ok(self.collect(descriptor, Vec::new()))
    }

    /// 批量扫描，跳过无法加载的成员而不中断整个批次
    pub fn scan_batch<'a, I>(&self, descriptors: I) -> Vec<ScanResult>
    where
        I: IntoIterator<Item = &'a TypeDescriptor>,
    {
        descriptors
            .into_iter()
            .map(|descriptor| {
                for failure in descriptor.load_failures() {
                    warn!(
                        "跳过无法加载的成员 {}::{}: {}",
                        descriptor.type_info().short_name(),
                        failure.member,
                        failure.message
                    );
                }
                self.collect(descriptor, descriptor.load_failures().to_vec())
            })
            .collect()
    }

    fn collect(&self, descriptor: &TypeDescriptor, skipped: Vec<LoadFailure>) -> ScanResult {
        let any_marked = descriptor.constructors().iter().any(|c| c.is_marked());
        let constructors = descriptor
            .constructors()
            .iter()
            .map(|constructor| Candidate {
                eligible: if any_marked {
                    constructor.is_marked()
                } else {
                    constructor.is_public()
                },
                member: constructor.clone(),
            })
            .collect();

        let properties = descriptor
            .properties()
            .iter()
            .map(|property| {
                let eligible = property.is_marked()
                    && property.is_public()
                    && property.is_writable()
                    && !property.is_static()
                    && !property.is_indexed();
                if property.is_marked() && !eligible {
                    debug!(
                        "属性 {}::{} 已标记但不可注入",
                        descriptor.type_info().short_name(),
                        property.name()
                    );
                }
                Candidate {
                    member: property.clone(),
                    eligible,
                }
            })
            .collect();

        let methods = descriptor
            .methods()
            .iter()
            .map(|method| Candidate {
                eligible: method.is_marked() && method.is_public() && !method.is_static(),
                member: method.clone(),
            })
            .collect();

        ScanResult {
            type_info: descriptor.type_info(),
            constructors,
            properties,
            methods,
            skipped,
        }
    }
}
