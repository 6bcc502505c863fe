//! 注入计划
//!
//! 计划按具体类型构建一次并缓存：构造函数 → 属性 → 方法。计划只引用类型结构，不持有任何后端状态。
//! 只用于已有实例的计划可以没有构造函数。

use crate::descriptor::{ConstructorDescriptor, MethodDescriptor, Parameter, PropertyDescriptor};
use crate::instance::{AnyInstance, Arguments, ServiceInstance};
use crate::resolver::Resolver;
use infrastructure_common::{
    DependencyError, DependencyResult, ResolutionFailure, ServiceKey, ServiceType,
};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// 具体类型的注入计划
#[derive(Debug, Clone)]
pub struct InjectionPlan {
    target_type: ServiceType,
    constructor: Option<ConstructorDescriptor>,
    properties: Vec<PropertyDescriptor>,
    methods: Vec<MethodDescriptor>,
}

impl InjectionPlan {
    pub fn new(
        target_type: ServiceType,
        constructor: ConstructorDescriptor,
        properties: Vec<PropertyDescriptor>,
        methods: Vec<MethodDescriptor>,
    ) -> Self {
        Self {
            target_type,
            constructor: Some(constructor),
            properties,
            methods,
        }
    }

    /// 只包含属性与方法的计划，用于注入已有实例
    pub fn members_only(
        target_type: ServiceType,
        properties: Vec<PropertyDescriptor>,
        methods: Vec<MethodDescriptor>,
    ) -> Self {
        Self {
            target_type,
            constructor: None,
            properties,
            methods,
        }
    }

    pub fn target_type(&self) -> ServiceType {
        self.target_type
    }

    /// 选中的构造函数
    pub fn constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructor.as_ref()
    }

    /// 构造函数参数（按声明顺序）
    pub fn constructor_parameters(&self) -> &[Parameter] {
        self.constructor
            .as_ref()
            .map(ConstructorDescriptor::parameters)
            .unwrap_or_default()
    }

    /// 可注入属性（按声明顺序）
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// 可注入方法（按声明顺序）
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// 解析构造函数依赖、构造实例，然后执行属性与方法注入
    pub fn instantiate(&self, resolver: &dyn Resolver) -> DependencyResult<AnyInstance> {
        let constructor =
            self.constructor
                .as_ref()
                .ok_or_else(|| DependencyError::NoSuitableConstructor {
                    type_name: self.target_type.name().to_string(),
                })?;
        let arguments = resolve_arguments(constructor.name(), constructor.parameters(), resolver)?;
        let mut instance = constructor.construct(arguments)?;
        self.apply(&mut *instance, resolver)?;
        Ok(Arc::from(instance))
    }

    /// 对已构造的实例执行属性与方法注入，不调用构造函数
    ///
    /// 属性只按类型解析；没有注册且不是必需属性时跳过。方法的参数全部必需。
    pub fn apply(&self, target: &mut dyn Any, resolver: &dyn Resolver) -> DependencyResult<()> {
        for property in &self.properties {
            let key = ServiceKey::new(property.service_type(), None);
            match resolver.try_resolve(&key)? {
                Some(value) => property.assign(target, value)?,
                None if property.is_required() => {
                    return Err(DependencyError::resolution_failed(
                        &key,
                        ResolutionFailure::NotRegistered,
                    ));
                }
                None => {
                    debug!(
                        "属性 {}::{} 没有可用注册，跳过注入",
                        self.target_type.short_name(),
                        property.name()
                    );
                }
            }
        }

        for method in &self.methods {
            let arguments = resolve_arguments(method.name(), method.parameters(), resolver)?;
            method.invoke(target, arguments)?;
        }
        Ok(())
    }
}

fn resolve_arguments(
    owner: &'static str,
    parameters: &[Parameter],
    resolver: &dyn Resolver,
) -> DependencyResult<Arguments> {
    let values = parameters
        .iter()
        .map(|parameter| resolver.resolve(&parameter.key()))
        .collect::<DependencyResult<Vec<ServiceInstance>>>()?;
    Ok(Arguments::new(owner, values))
}
