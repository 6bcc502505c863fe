//! 作用域、拦截与激活回调集成测试

mod common;

use common::*;
use di_abstractions::RegistrationEvent;
use di_impl::InterceptionExtension;
use infrastructure_common::{Lifetime, ResolutionFailure};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_request_scope_shares_instances_within_scope() {
    for container in containers() {
        container
            .register_self::<Lenient>(None, Lifetime::PerRequest)
            .unwrap();

        let first_scope = container.request_scope("first").unwrap();
        let a = first_scope.get_instance::<Lenient>(None).unwrap();
        let b = first_scope.get_instance::<Lenient>(None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(first_scope.scope().len(), 1);

        let second_scope = container.request_scope("second").unwrap();
        let c = second_scope.get_instance::<Lenient>(None).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }
}

#[test]
fn test_request_service_outside_scope_fails() {
    for container in containers() {
        container
            .register_self::<Lenient>(None, Lifetime::PerRequest)
            .unwrap();

        let error = container.get_instance::<Lenient>(None).err().unwrap();
        assert_eq!(
            error.resolution_failure(),
            Some(&ResolutionFailure::NoRequestScope)
        );
    }
}

#[test]
fn test_per_thread_instances() {
    for container in containers() {
        container
            .register_self::<Lenient>(None, Lifetime::PerThread)
            .unwrap();

        let main_a = container.get_instance::<Lenient>(None).unwrap();
        let main_b = container.get_instance::<Lenient>(None).unwrap();
        assert!(Arc::ptr_eq(&main_a, &main_b));

        let other = std::thread::scope(|scope| {
            scope
                .spawn(|| container.get_instance::<Lenient>(None).unwrap())
                .join()
                .unwrap()
        });
        assert!(!Arc::ptr_eq(&main_a, &other));
    }
}

#[test]
fn test_per_thread_instances_released_after_thread_exit() {
    for container in containers() {
        container
            .register_self::<Lenient>(None, Lifetime::PerThread)
            .unwrap();
        let main = container.get_instance::<Lenient>(None).unwrap();

        let released: Vec<_> = std::thread::scope(|scope| {
            (0..16)
                .map(|_| {
                    scope
                        .spawn(|| Arc::downgrade(&container.get_instance::<Lenient>(None).unwrap()))
                        .join()
                        .unwrap()
                })
                .collect()
        });

        assert!(
            released.iter().all(|weak| weak.upgrade().is_none()),
            "backend {}",
            container.backend_name()
        );
        assert!(Arc::ptr_eq(&main, &container.get_instance::<Lenient>(None).unwrap()));
    }
}

struct Offset {
    inner: Arc<dyn Clock>,
}

impl Clock for Offset {
    fn now(&self) -> u64 {
        self.inner.now() + 1
    }
}

#[test]
fn test_interception_wraps_later_registrations() {
    for container in containers() {
        container
            .register::<dyn Clock, SlowClock>(Some("before"), Lifetime::Singleton)
            .unwrap();
        container
            .add_extension(
                InterceptionExtension::new()
                    .intercept::<dyn Clock, _>(|inner| Arc::new(Offset { inner })),
            )
            .unwrap();
        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
            .unwrap();
        container
            .register::<dyn Greeter, ClockGreeter>(None, Lifetime::Transient)
            .unwrap();

        assert_eq!(container.extensions(), vec!["interception".to_string()]);
        assert_eq!(container.get_instance::<dyn Clock>(Some("before")).unwrap().now(), 7);

        let first = container.get_instance::<dyn Clock>(None).unwrap();
        let second = container.get_instance::<dyn Clock>(None).unwrap();
        assert_eq!(first.now(), 43);
        assert!(Arc::ptr_eq(&first, &second));

        // 非拦截服务不受影响，但其依赖是被拦截的实例
        assert_eq!(container.get_instance::<dyn Greeter>(None).unwrap().greet(), "hello@43");
    }
}

#[test]
fn test_activation_hooks_observe_new_instances() {
    for container in containers() {
        let activations = Arc::new(AtomicUsize::new(0));
        let counted = activations.clone();
        container
            .subscribe(move |event: &mut RegistrationEvent<'_>| {
                let counted = counted.clone();
                event.builder.on_activated(move |registration, instance| {
                    assert!(instance.is::<Lenient>() || instance.is::<FixedClock>());
                    assert!(registration.id().value() > 0);
                    counted.fetch_add(1, Ordering::SeqCst);
                });
            })
            .unwrap();

        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
            .unwrap();
        container
            .register_self::<Lenient>(None, Lifetime::Transient)
            .unwrap();

        container.get_instance::<Lenient>(None).unwrap();
        container.get_instance::<Lenient>(None).unwrap();

        // 两个瞬态实例加一个单例
        assert_eq!(activations.load(Ordering::SeqCst), 3);
    }
}

#[test]
fn test_unsubscribed_observer_sees_no_events() {
    for container in containers() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counted = seen.clone();
        let id = container
            .subscribe(move |_: &mut RegistrationEvent<'_>| {
                counted.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
            .unwrap();
        assert!(container.unsubscribe(id));
        assert!(!container.unsubscribe(id));
        container
            .register::<dyn Clock, SlowClock>(Some("slow"), Lifetime::Singleton)
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_inject_existing_in_request_scope() {
    for container in containers() {
        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::PerRequest)
            .unwrap();

        let scope = container.request_scope("inject").unwrap();
        let mut lenient = Lenient::default();
        scope.inject_existing(&mut lenient).unwrap();
        let scoped = scope.get_instance::<dyn Clock>(None).unwrap();
        assert!(Arc::ptr_eq(lenient.clock.as_ref().unwrap(), &scoped));
    }
}
