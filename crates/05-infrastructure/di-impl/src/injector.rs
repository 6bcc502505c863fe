//! 注入器构建器
//!
//! 为具体类型编译注入计划并按类型缓存，避免每次解析重复扫描。

use crate::scanner::MetadataScanner;
use crate::selector::{ConstructorSelector, MostParametersSelector};
use di_abstractions::{DependencyResult, Injectable, InjectionPlan, Resolver, TypeDescriptor};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 注入器构建器
pub struct InjectorBuilder {
    scanner: MetadataScanner,
    selector: Arc<dyn ConstructorSelector>,
    plans: RwLock<HashMap<TypeId, Arc<InjectionPlan>>>,
    member_plans: RwLock<HashMap<TypeId, Arc<InjectionPlan>>>,
}

impl InjectorBuilder {
    pub fn new() -> Self {
        Self::with_selector(Arc::new(MostParametersSelector))
    }

    /// 使用自定义构造函数选择器
    pub fn with_selector(selector: Arc<dyn ConstructorSelector>) -> Self {
        Self {
            scanner: MetadataScanner::new(),
            selector,
            plans: RwLock::new(HashMap::new()),
            member_plans: RwLock::new(HashMap::new()),
        }
    }

    /// 扫描类型并构建注入计划（不缓存）
    pub fn build_plan(&self, descriptor: &TypeDescriptor) -> DependencyResult<InjectionPlan> {
        let scan = self.scanner.scan(descriptor)?;
        let constructor = self.selector.select(&scan)?;
        let constructor_name = constructor.name();
        let plan = InjectionPlan::new(
            scan.type_info,
            constructor,
            scan.eligible_properties().cloned().collect(),
            scan.eligible_methods().cloned().collect(),
        );
        debug!(
            "已构建注入计划: {} (构造函数 {}, 属性 {}, 方法 {})",
            plan.target_type().short_name(),
            constructor_name,
            plan.properties().len(),
            plan.methods().len()
        );
        Ok(plan)
    }

    /// 获取缓存的注入计划，没有时构建并缓存
    pub fn get_or_build_plan(&self, descriptor: &TypeDescriptor) -> DependencyResult<Arc<InjectionPlan>> {
        let type_id = descriptor.type_info().id();
        if let Some(plan) = self.plans.read().get(&type_id) {
            return Ok(plan.clone());
        }

        let mut plans = self.plans.write();
        if let Some(plan) = plans.get(&type_id) {
            return Ok(plan.clone());
        }
        let plan = Arc::new(self.build_plan(descriptor)?);
        plans.insert(type_id, plan.clone());
        Ok(plan)
    }

    /// 获取可注入类型的计划，命中缓存时不会重新生成类型描述
    pub fn plan_for<T: Injectable>(&self) -> DependencyResult<Arc<InjectionPlan>> {
        if let Some(plan) = self.plans.read().get(&TypeId::of::<T>()) {
            return Ok(plan.clone());
        }
        self.get_or_build_plan(&T::describe())
    }

    /// 获取注入已有实例用的计划，不需要可用的构造函数
    ///
    /// 已有完整计划时直接复用，否则只扫描属性与方法并单独缓存。
    pub fn member_plan_for<T: Injectable>(&self) -> DependencyResult<Arc<InjectionPlan>> {
        let type_id = TypeId::of::<T>();
        if let Some(plan) = self.plans.read().get(&type_id) {
            return Ok(plan.clone());
        }
        if let Some(plan) = self.member_plans.read().get(&type_id) {
            return Ok(plan.clone());
        }

        let scan = self.scanner.scan(&T::describe())?;
        let plan = Arc::new(InjectionPlan::members_only(
            scan.type_info,
            scan.eligible_properties().cloned().collect(),
            scan.eligible_methods().cloned().collect(),
        ));
        debug!(
            "已构建成员注入计划: {} (属性 {}, 方法 {})",
            plan.target_type().short_name(),
            plan.properties().len(),
            plan.methods().len()
        );
        Ok(self.member_plans.write().entry(type_id).or_insert(plan).clone())
    }

    /// 对已构造的实例执行计划中的属性与方法注入
    pub fn apply_plan(
        &self,
        plan: &InjectionPlan,
        resolver: &dyn Resolver,
        target: &mut dyn Any,
    ) -> DependencyResult<()> {
        plan.apply(target, resolver)
    }

    /// 缓存的计划数量（包括成员注入计划）
    pub fn cached_plans(&self) -> usize {
        self.plans.read().len() + self.member_plans.read().len()
    }

    /// 清空计划缓存
    pub fn clear(&self) {
        self.plans.write().clear();
        self.member_plans.write().clear();
    }
}

impl Default for InjectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
