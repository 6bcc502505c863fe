//! 注册事件中心
//!
//! 按订阅顺序同步通知观察者。发布时先复制观察者列表，观察者内部可以安全地订阅或退订。

use di_abstractions::{RegistrationEvent, RegistrationObserver};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 订阅标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// 注册事件中心
#[derive(Default)]
pub struct RegistrationEventHub {
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn RegistrationObserver>)>>,
    next_id: AtomicU64,
}

impl RegistrationEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅注册事件
    pub fn subscribe<O>(&self, observer: O) -> SubscriptionId
    where
        O: RegistrationObserver + 'static,
    {
        self.subscribe_shared(Arc::new(observer))
    }

    /// 订阅共享的观察者
    pub fn subscribe_shared(&self, observer: Arc<dyn RegistrationObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// 退订，返回订阅是否存在
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(subscription, _)| *subscription != id);
        observers.len() != before
    }

    /// 发布注册事件
    pub fn publish(&self, event: &mut RegistrationEvent<'_>) {
        let observers: Vec<Arc<dyn RegistrationObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer.on_registering(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    pub fn clear(&self) {
        self.observers.write().clear();
    }
}
