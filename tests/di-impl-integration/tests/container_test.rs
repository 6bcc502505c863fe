//! 服务容器集成测试，每个场景在两种后端上运行

mod common;

use common::*;
use di_abstractions::{
    ConstructorDescriptor, DependencyResult, Injectable, Parameter, RegistrationEvent, ServiceKey,
    ServiceRegistry, ServiceType, TypeDescriptor,
};
use di_impl::{
    BackendKind, ContainerHandle, ContainerOptions, MostParametersSelector, ServiceContainer,
};
use infrastructure_common::{ContainerState, DependencyError, Lifetime, ResolutionFailure};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

fn register_clock_and_greeter(container: &ServiceContainer) {
    container
        .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
        .unwrap();
    container
        .register::<dyn Greeter, ClockGreeter>(None, Lifetime::Transient)
        .unwrap();
}

#[test]
fn test_marked_constructor_wins_over_more_parameters() {
    for container in containers() {
        register_clock_and_greeter(&container);
        let marked = container.get_concrete::<Marked>(None).unwrap();
        assert_eq!(marked.chosen, "none", "backend {}", container.backend_name());
    }
}

#[test]
fn test_most_parameters_with_declaration_order_tie_break() {
    for container in containers() {
        register_clock_and_greeter(&container);
        for _ in 0..3 {
            let ambiguous = container.get_concrete::<Ambiguous>(None).unwrap();
            assert_eq!(ambiguous.chosen, "pair_a", "backend {}", container.backend_name());
        }
    }
}

#[test]
fn test_plan_is_cached_per_concrete_type() {
    let container = ServiceContainer::builder()
        .with_constructor_selector(Arc::new(MostParametersSelector))
        .build();
    register_clock_and_greeter(&container);

    container.get_concrete::<Ambiguous>(None).unwrap();
    let cached = container.injector().cached_plans();
    container.get_concrete::<Ambiguous>(None).unwrap();

    assert_eq!(container.injector().cached_plans(), cached);
    let plan = container.injector().plan_for::<Ambiguous>().unwrap();
    assert_eq!(plan.constructor().map(|c| c.name()), Some("pair_a"));
}

#[test]
fn test_singleton_identity_and_transient_distinctness() {
    for container in containers() {
        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
            .unwrap();
        container
            .register_self::<Lenient>(None, Lifetime::Transient)
            .unwrap();

        let first = container.get_instance::<dyn Clock>(None).unwrap();
        let second = container.get_instance::<dyn Clock>(None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let a = container.get_instance::<Lenient>(None).unwrap();
        let b = container.get_instance::<Lenient>(None).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        // 属性注入得到的是同一个单例
        assert!(Arc::ptr_eq(a.clock.as_ref().unwrap(), &first));
    }
}

#[test]
fn test_injection_order_constructor_properties_methods() {
    for container in containers() {
        register_clock_and_greeter(&container);
        let tracked = container.get_concrete::<Tracked>(None).unwrap();
        assert_eq!(
            tracked.steps,
            vec![
                "constructor:hello@42".to_string(),
                "property:42".to_string(),
                "start:property_set=true:42".to_string(),
                "finish".to_string(),
            ]
        );
    }
}

#[test]
fn test_resolve_all_with_named_registrations() {
    for container in containers() {
        container
            .register::<dyn Clock, FixedClock>(Some("a"), Lifetime::Singleton)
            .unwrap();
        container
            .register::<dyn Clock, SlowClock>(Some("b"), Lifetime::Singleton)
            .unwrap();

        let all = container.get_all_instances::<dyn Clock>().unwrap();
        let values: Vec<_> = all.iter().map(|clock| clock.now()).collect();
        assert_eq!(values, vec![42, 7]);

        assert_eq!(container.get_instance::<dyn Clock>(Some("b")).unwrap().now(), 7);
        assert!(container
            .get_instance::<dyn Clock>(None)
            .err()
            .unwrap()
            .is_not_registered());
        assert!(container.contains::<dyn Clock>(Some("a")));
        assert!(!container.contains::<dyn Clock>(Some("c")));
    }
}

#[test]
fn test_missing_property_dependency_is_skipped() {
    for container in containers() {
        let lenient = container.get_concrete::<Lenient>(None).unwrap();
        assert!(lenient.clock.is_none());
    }
}

#[test]
fn test_missing_constructor_dependency_fails() {
    for container in containers() {
        let error = container.get_concrete::<Strict>(None).err().unwrap();
        match error {
            DependencyError::ResolutionFailed { service, reason, .. } => {
                assert_eq!(service, ServiceType::of::<dyn Clock>().name());
                assert_eq!(reason, ResolutionFailure::NotRegistered);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_dispose_is_idempotent() {
    for container in containers() {
        register_clock_and_greeter(&container);
        container.get_instance::<dyn Greeter>(None).unwrap();

        container.dispose();
        container.dispose();

        assert_eq!(container.state(), ContainerState::Disposed);
        assert!(container.registrations().is_empty());
        assert!(matches!(
            container.get_instance::<dyn Clock>(None),
            Err(DependencyError::Disposed)
        ));
        assert!(matches!(
            container.request_scope("late"),
            Err(DependencyError::Disposed)
        ));
    }
}

#[test]
fn test_concurrent_implicit_registration_happens_once() {
    for container in containers() {
        let events = Arc::new(AtomicUsize::new(0));
        let counted = events.clone();
        container
            .subscribe(move |event: &mut RegistrationEvent<'_>| {
                if event.is_service::<Lenient>() {
                    counted.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();

        let threads = 8;
        let barrier = Barrier::new(threads);
        std::thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|| {
                    barrier.wait();
                    container.get_concrete::<Lenient>(None).unwrap();
                });
            }
        });

        assert_eq!(events.load(Ordering::SeqCst), 1);
        let lenient: Vec<_> = container
            .registrations()
            .into_iter()
            .filter(|registration| registration.service_type().is::<Lenient>())
            .collect();
        assert_eq!(lenient.len(), 1);
        assert_eq!(lenient[0].lifetime(), Lifetime::Transient);
    }
}

#[test]
fn test_concurrent_singleton_resolution_yields_one_instance() {
    for container in containers() {
        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
            .unwrap();

        let threads = 8;
        let barrier = Barrier::new(threads);
        let resolved: Vec<Arc<dyn Clock>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        container.get_instance::<dyn Clock>(None).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert!(resolved.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}

#[test]
fn test_registration_snapshot_and_registry_trait() {
    for container in containers() {
        let registry: &dyn ServiceRegistry = &container;
        registry
            .register_type(
                ServiceType::of::<dyn Clock>(),
                <SlowClock as di_abstractions::Injectable>::describe(),
                Some("slow"),
                Lifetime::PerThread,
            )
            .unwrap();
        container
            .register_instance::<dyn Clock>(Arc::new(FixedClock), None)
            .unwrap();

        let registrations = registry.registrations();
        assert_eq!(registrations.len(), 2);
        assert_eq!(registrations[0].name(), Some("slow"));
        assert_eq!(registrations[0].lifetime(), Lifetime::PerThread);
        assert!(registrations[1].implementation_type().is::<dyn Clock>());
        assert!(registrations[0].id() < registrations[1].id());

        let key = ServiceKey::named::<dyn Clock>("slow");
        let clock = registry.resolve_service(&key).unwrap();
        assert_eq!(clock.downcast::<dyn Clock>().unwrap().now(), 7);

        registry.dispose();
        assert!(registry.is_disposed());
    }
}

#[test]
fn test_resolution_depth_is_limited() {
    let container = ServiceContainer::from_options(
        ContainerOptions::default()
            .with_backend(BackendKind::Direct)
            .with_max_resolution_depth(1),
    );
    container
        .register::<dyn Clock, FixedClock>(None, Lifetime::Transient)
        .unwrap();

    assert!(container.get_instance::<dyn Clock>(None).is_ok());
    let error = container.get_concrete::<Strict>(None).err().unwrap();
    assert_eq!(
        error.resolution_failure(),
        Some(&ResolutionFailure::DepthExceeded { depth: 1 })
    );
}

#[test]
fn test_late_registration_after_first_resolve() {
    for container in containers() {
        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
            .unwrap();
        let old_clock = container.get_instance::<dyn Clock>(None).unwrap();

        container
            .register::<dyn Greeter, ClockGreeter>(None, Lifetime::Transient)
            .unwrap();
        container
            .register_self::<ClockGreeter>(None, Lifetime::Singleton)
            .unwrap();
        assert_eq!(
            container.get_instance::<dyn Greeter>(None).unwrap().greet(),
            "hello@42"
        );
        let greeter = container.get_instance::<ClockGreeter>(None).unwrap();

        // 后注册的同键映射覆盖之前的映射
        container
            .register::<dyn Clock, SlowClock>(None, Lifetime::Singleton)
            .unwrap();
        assert_eq!(container.get_instance::<dyn Clock>(None).unwrap().now(), 7);
        assert_eq!(
            container.get_instance::<dyn Greeter>(None).unwrap().greet(),
            "hello@7"
        );

        // 已解析的单例保持不变
        let again = container.get_instance::<ClockGreeter>(None).unwrap();
        assert!(Arc::ptr_eq(&greeter, &again));
        assert_eq!(again.greet(), "hello@42");
        assert!(Arc::ptr_eq(&again.clock, &old_clock));
        assert_eq!(old_clock.now(), 42);
    }
}

/// 通过容器句柄按需解析时钟
struct LazyClock {
    handle: Arc<ContainerHandle>,
}

impl LazyClock {
    fn now(&self) -> DependencyResult<u64> {
        Ok(self.handle.container()?.get_instance::<dyn Clock>(None)?.now())
    }
}

impl Injectable for LazyClock {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .constructor(ConstructorDescriptor::new(
                "new",
                vec![Parameter::of::<ContainerHandle>("container")],
                |mut args| {
                    Ok(LazyClock {
                        handle: args.take::<ContainerHandle>()?,
                    })
                },
            ))
            .build()
    }
}

#[test]
fn test_shared_container_resolves_its_own_handle() {
    init_tracing();
    for backend in [BackendKind::Staged, BackendKind::Direct] {
        let container =
            ServiceContainer::shared(ContainerOptions::default().with_backend(backend)).unwrap();
        assert!(container.contains::<ContainerHandle>(None));

        let lazy = container.get_concrete::<LazyClock>(None).unwrap();
        // 时钟在句柄被注入之后才注册
        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
            .unwrap();
        assert_eq!(lazy.now().unwrap(), 42);
        assert!(Arc::ptr_eq(&lazy.handle.container().unwrap(), &container));

        // 句柄不延长容器的生命周期
        drop(container);
        assert!(matches!(lazy.now(), Err(DependencyError::Disposed)));
    }
}
