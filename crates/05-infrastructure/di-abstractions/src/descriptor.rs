//! 类型结构描述
//!
//! Rust 没有运行时反射，类型的可注入成员由 [`TypeDescriptor`] 描述。
//! 描述通常由 `injection-macros` 在编译期生成，也可以通过
//! [`TypeDescriptor::builder`] 手工构建。`#[inject]` 标记在描述中记录为 `marked`。

use crate::instance::{AnyInstance, Arguments, ServiceInstance};
use infrastructure_common::{
    DependencyError, DependencyResult, ResolutionFailure, ServiceKey, ServiceType,
};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 服务类型转换函数：具体实例 → 服务实例
pub type ServiceCaster = Arc<dyn Fn(AnyInstance) -> Option<ServiceInstance> + Send + Sync>;

/// 构造函数调用器
pub type ConstructFn =
    Arc<dyn Fn(Arguments) -> DependencyResult<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// 属性设置器
pub type PropertySetter =
    Arc<dyn Fn(&mut dyn Any, ServiceInstance) -> DependencyResult<()> + Send + Sync>;

/// 方法调用器
pub type MethodInvoker = Arc<dyn Fn(&mut dyn Any, Arguments) -> DependencyResult<()> + Send + Sync>;

/// 注入方法的返回值
///
/// 注入方法只能返回 `()` 或 `Result<(), E>`，`Err` 被转换为激活失败。
pub trait MethodOutcome {
    /// 转换为注入结果
    fn into_method_result(self, key: &ServiceKey, method: &str) -> DependencyResult<()>;
}

impl MethodOutcome for () {
    fn into_method_result(self, _: &ServiceKey, _: &str) -> DependencyResult<()> {
        Ok(())
    }
}

impl<E: fmt::Display> MethodOutcome for Result<(), E> {
    fn into_method_result(self, key: &ServiceKey, method: &str) -> DependencyResult<()> {
        self.map_err(|error| {
            DependencyError::activation(key, format!("注入方法 {method} 失败: {error}"))
        })
    }
}

/// 可注入类型
///
/// 通常通过 `#[derive(Injectable)]` 实现。
pub trait Injectable: Send + Sync + Sized + 'static {
    /// 描述类型的构造函数、属性和方法
    fn describe() -> TypeDescriptor;
}

/// 由 `#[injectable]` 标注的 impl 块提供的成员（构造函数与方法）
pub trait InjectableMembers: Send + Sync + Sized + 'static {
    /// 向构建器添加构造函数与方法
    fn describe_members(builder: TypeDescriptorBuilder<Self>) -> TypeDescriptorBuilder<Self>;
}

/// 成员可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// 公开成员
    Public,
    /// 受限成员（私有或 crate 内可见）
    Restricted,
}

/// 成员参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    name: &'static str,
    service_type: ServiceType,
}

impl Parameter {
    /// 创建参数描述
    pub fn of<S: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            service_type: ServiceType::of::<S>(),
        }
    }

    /// 参数名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 参数的服务类型
    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// 参数对应的默认服务键（参数只按类型解析）
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(self.service_type, None)
    }
}

fn target_mismatch<T: 'static>(member: &str) -> DependencyError {
    DependencyError::resolution_failed(
        &ServiceKey::of::<T>(),
        ResolutionFailure::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: format!("{member} 的目标实例"),
        },
    )
}

/// 构造函数描述
#[derive(Clone)]
pub struct ConstructorDescriptor {
    name: &'static str,
    visibility: Visibility,
    marked: bool,
    parameters: Vec<Parameter>,
    construct: ConstructFn,
}

impl ConstructorDescriptor {
    /// 创建构造函数描述，默认公开且未标记
    pub fn new<T, F>(name: &'static str, parameters: Vec<Parameter>, construct: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arguments) -> DependencyResult<T> + Send + Sync + 'static,
    {
        Self {
            name,
            visibility: Visibility::Public,
            marked: false,
            parameters,
            construct: Arc::new(move |args| {
                let instance: Box<dyn Any + Send + Sync> = Box::new(construct(args)?);
                Ok(instance)
            }),
        }
    }

    /// 设置可见性
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// 设置注入标记
    pub fn with_marker(mut self, marked: bool) -> Self {
        self.marked = marked;
        self
    }

    /// 构造函数名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 构造函数可见性
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// 是否公开
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// 是否带有注入标记
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// 按声明顺序排列的参数
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// 调用构造函数
    pub fn construct(&self, arguments: Arguments) -> DependencyResult<Box<dyn Any + Send + Sync>> {
        (self.construct)(arguments)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("marked", &self.marked)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// 属性描述
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: &'static str,
    service_type: ServiceType,
    visibility: Visibility,
    is_static: bool,
    index_arity: usize,
    marked: bool,
    required: bool,
    setter: Option<PropertySetter>,
}

impl PropertyDescriptor {
    /// 创建可写属性描述
    pub fn new<T, S, F>(name: &'static str, set: F) -> Self
    where
        T: 'static,
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut T, Arc<S>) + Send + Sync + 'static,
    {
        let setter: PropertySetter = Arc::new(move |target: &mut dyn Any, value: ServiceInstance| {
            let target = target
                .downcast_mut::<T>()
                .ok_or_else(|| target_mismatch::<T>(name))?;
            let value = value.expect::<S>(&ServiceKey::of::<S>())?;
            set(target, value);
            Ok(())
        });
        Self {
            setter: Some(setter),
            ..Self::read_only::<S>(name)
        }
    }

    /// 创建只读属性描述（没有设置器）
    pub fn read_only<S: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            service_type: ServiceType::of::<S>(),
            visibility: Visibility::Public,
            is_static: false,
            index_arity: 0,
            marked: false,
            required: false,
            setter: None,
        }
    }

    /// 设置可见性
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// 设置注入标记
    pub fn with_marker(mut self, marked: bool) -> Self {
        self.marked = marked;
        self
    }

    /// 缺少注册时是否视为错误
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// 标记为类型级（静态）属性
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// 设置索引参数个数
    pub fn with_index_arity(mut self, arity: usize) -> Self {
        self.index_arity = arity;
        self
    }

    /// 属性名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 属性的服务类型
    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// 属性可见性
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// 是否公开
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// 是否有设置器
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// 是否为类型级属性
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// 是否带索引参数
    pub fn is_indexed(&self) -> bool {
        self.index_arity > 0
    }

    /// 是否带有注入标记
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// 缺少注册时是否报错
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// 为目标实例赋值
    pub fn assign(&self, target: &mut dyn Any, value: ServiceInstance) -> DependencyResult<()> {
        match &self.setter {
            Some(setter) => setter(target, value),
            None => Err(DependencyError::invalid_argument(format!(
                "属性 {} 不可写",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("service_type", &self.service_type)
            .field("visibility", &self.visibility)
            .field("writable", &self.is_writable())
            .field("static", &self.is_static)
            .field("index_arity", &self.index_arity)
            .field("marked", &self.marked)
            .field("required", &self.required)
            .finish()
    }
}

/// 方法描述
#[derive(Clone)]
pub struct MethodDescriptor {
    name: &'static str,
    visibility: Visibility,
    marked: bool,
    parameters: Vec<Parameter>,
    invoke: Option<MethodInvoker>,
}

impl MethodDescriptor {
    /// 创建实例方法描述（接收 `&mut self`）
    pub fn new<T, F>(name: &'static str, parameters: Vec<Parameter>, invoke: F) -> Self
    where
        T: 'static,
        F: Fn(&mut T, Arguments) -> DependencyResult<()> + Send + Sync + 'static,
    {
        let invoker: MethodInvoker = Arc::new(move |target: &mut dyn Any, args: Arguments| {
            let target = target
                .downcast_mut::<T>()
                .ok_or_else(|| target_mismatch::<T>(name))?;
            invoke(target, args)
        });
        Self {
            name,
            visibility: Visibility::Public,
            marked: false,
            parameters,
            invoke: Some(invoker),
        }
    }

    /// 创建关联函数（静态方法）描述，静态方法不能被注入
    pub fn associated(name: &'static str, parameters: Vec<Parameter>) -> Self {
        Self {
            name,
            visibility: Visibility::Public,
            marked: false,
            parameters,
            invoke: None,
        }
    }

    /// 设置可见性
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// 设置注入标记
    pub fn with_marker(mut self, marked: bool) -> Self {
        self.marked = marked;
        self
    }

    /// 方法名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 方法可见性
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// 是否公开
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// 是否为关联函数（没有接收者）
    pub fn is_static(&self) -> bool {
        self.invoke.is_none()
    }

    /// 是否带有注入标记
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// 按声明顺序排列的参数
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// 在目标实例上调用方法
    pub fn invoke(&self, target: &mut dyn Any, arguments: Arguments) -> DependencyResult<()> {
        match &self.invoke {
            Some(invoke) => invoke(target, arguments),
            None => Err(DependencyError::invalid_argument(format!(
                "静态方法 {} 不能注入",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("static", &self.is_static())
            .field("marked", &self.marked)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// 无法加载的成员
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub member: String,
    pub message: String,
}

/// 类型描述
#[derive(Clone)]
pub struct TypeDescriptor {
    type_info: ServiceType,
    constructors: Vec<ConstructorDescriptor>,
    properties: Vec<PropertyDescriptor>,
    methods: Vec<MethodDescriptor>,
    provides: Vec<(ServiceType, ServiceCaster)>,
    load_failures: Vec<LoadFailure>,
}

impl TypeDescriptor {
    /// 创建指定类型的描述构建器
    pub fn builder<T: Send + Sync + 'static>() -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder::new()
    }

    /// 获取可注入类型的描述
    pub fn of<T: Injectable>() -> Self {
        T::describe()
    }

    /// 被描述的具体类型
    pub fn type_info(&self) -> ServiceType {
        self.type_info
    }

    /// 按声明顺序排列的构造函数
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// 按声明顺序排列的属性
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// 按声明顺序排列的方法
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// 无法加载的成员
    pub fn load_failures(&self) -> &[LoadFailure] {
        &self.load_failures
    }

    /// 类型实现的服务类型列表（包含自身）
    pub fn provided_services(&self) -> impl Iterator<Item = ServiceType> + '_ {
        self.provides.iter().map(|(service_type, _)| *service_type)
    }

    /// 是否可以作为指定服务类型的实现
    pub fn provides(&self, service_type: ServiceType) -> bool {
        self.caster_for(service_type).is_some()
    }

    /// 获取到指定服务类型的转换函数
    pub fn caster_for(&self, service_type: ServiceType) -> Option<&ServiceCaster> {
        self.provides
            .iter()
            .find(|(provided, _)| *provided == service_type)
            .map(|(_, caster)| caster)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_info", &self.type_info)
            .field("constructors", &self.constructors)
            .field("properties", &self.properties)
            .field("methods", &self.methods)
            .field("provides", &self.provided_services().collect::<Vec<_>>())
            .field("load_failures", &self.load_failures)
            .finish()
    }
}

/// 类型描述构建器
pub struct TypeDescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDescriptorBuilder<T> {
    fn new() -> Self {
        let builder = Self {
            descriptor: TypeDescriptor {
                type_info: ServiceType::of::<T>(),
                constructors: Vec::new(),
                properties: Vec::new(),
                methods: Vec::new(),
                provides: Vec::new(),
                load_failures: Vec::new(),
            },
            _marker: PhantomData,
        };
        builder.provides::<T>(|this| this)
    }

    /// 声明类型可以作为服务 `S` 的实现
    pub fn provides<S>(mut self, cast: impl Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let caster: ServiceCaster = Arc::new(move |instance: AnyInstance| {
            instance
                .downcast::<T>()
                .ok()
                .map(|concrete| ServiceInstance::new(cast(concrete)))
        });
        let service_type = ServiceType::of::<S>();
        self.descriptor
            .provides
            .retain(|(provided, _)| *provided != service_type);
        self.descriptor.provides.push((service_type, caster));
        self
    }

    /// 添加构造函数
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.descriptor.constructors.push(constructor);
        self
    }

    /// 添加属性
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.descriptor.properties.push(property);
        self
    }

    /// 添加方法
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.descriptor.methods.push(method);
        self
    }

    /// 记录无法加载的成员
    pub fn load_failure(mut self, member: impl Into<String>, message: impl Into<String>) -> Self {
        self.descriptor.load_failures.push(LoadFailure {
            member: member.into(),
            message: message.into(),
        });
        self
    }

    /// 完成构建
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}
