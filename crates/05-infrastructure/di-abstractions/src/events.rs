//! 注册事件
//!
//! 每次注册提交前同步发布 [`RegistrationEvent`]，观察者可以修改后端注册构建器，但不能取消注册。

use crate::registry::RegistrationBuilder;
use infrastructure_common::{Lifetime, ServiceType};

/// 注册事件
#[derive(Debug)]
pub struct RegistrationEvent<'a> {
    pub service_type: ServiceType,
    pub implementation_type: ServiceType,
    pub service_name: Option<&'a str>,
    pub lifetime: Lifetime,
    pub builder: &'a mut RegistrationBuilder,
}

impl RegistrationEvent<'_> {
    /// 是否为指定服务类型的注册
    pub fn is_service<S: ?Sized + 'static>(&self) -> bool {
        self.service_type.is::<S>()
    }
}

/// 注册事件观察者
pub trait RegistrationObserver: Send + Sync {
    fn on_registering(&self, event: &mut RegistrationEvent<'_>);
}

impl<F> RegistrationObserver for F
where
    F: Fn(&mut RegistrationEvent<'_>) + Send + Sync,
{
    fn on_registering(&self, event: &mut RegistrationEvent<'_>) {
        self(event)
    }
}
