//! 容器配置与类型发现集成测试

mod common;

use common::*;
use di_abstractions::{Injectable, TypeDescriptor};
use di_impl::{
    register_discovered, BackendKind, ContainerOptions, PartialLoad, ServiceContainer,
    StaticModule, TypeModule,
};
use infrastructure_common::{ConfigError, Lifetime};
use std::io::Write;
use std::sync::Arc;

#[test]
fn test_options_from_toml_file_select_backend() {
    init_tracing();
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
backend = "direct"
implicit_registration = false
max_resolution_depth = 16
"#
    )
    .unwrap();

    let options = ContainerOptions::from_file(file.path()).unwrap();
    assert_eq!(options.backend, BackendKind::Direct);
    assert_eq!(options.max_resolution_depth, 16);
    assert_eq!(options.implicit_lifetime, Lifetime::Transient);

    let container = ServiceContainer::from_options(options);
    assert_eq!(container.backend_name(), "direct");
    assert!(container
        .get_concrete::<Lenient>(None)
        .err()
        .unwrap()
        .is_not_registered());
}

#[test]
fn test_implicit_lifetime_from_options() {
    let options = ContainerOptions::from_toml_str(r#"implicit_lifetime = "singleton""#).unwrap();
    let container = ServiceContainer::from_options(options);
    assert_eq!(container.backend_name(), "staged");

    let a = container.get_concrete::<Lenient>(None).unwrap();
    let b = container.get_concrete::<Lenient>(None).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(container.registrations()[0].lifetime(), Lifetime::Singleton);
}

#[test]
fn test_invalid_options_are_rejected() {
    assert!(matches!(
        ContainerOptions::from_toml_str("max_resolution_depth = 0"),
        Err(ConfigError::ValidationError { .. })
    ));
    assert!(matches!(
        ContainerOptions::from_toml_str(r#"backend = "remote""#),
        Err(ConfigError::ParseError { .. })
    ));
    assert!(matches!(
        ContainerOptions::from_file("/nonexistent/di.toml"),
        Err(ConfigError::FileNotFound { .. })
    ));
}

#[test]
fn test_malformed_file_is_load_error() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "max_resolution_depth = = 3").unwrap();

    let error = ContainerOptions::from_file(file.path()).unwrap_err();
    assert!(matches!(error, ConfigError::LoadError { .. }), "unexpected error: {error}");
}

pub struct HomeController {
    pub greeter: Arc<dyn Greeter>,
}

impl Injectable for HomeController {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .constructor(di_abstractions::ConstructorDescriptor::new(
                "new",
                vec![di_abstractions::Parameter::of::<dyn Greeter>("greeter")],
                |mut args| {
                    Ok(HomeController {
                        greeter: args.take::<dyn Greeter>()?,
                    })
                },
            ))
            .build()
    }
}

struct FailingModule;

impl TypeModule for FailingModule {
    fn name(&self) -> &str {
        "controllers-extra"
    }

    fn load_types(&self) -> Result<Vec<TypeDescriptor>, PartialLoad> {
        Err(PartialLoad {
            loaded: vec![HomeController::describe(), Strict::describe()],
            message: "无法加载 AdminController".to_string(),
        })
    }
}

#[test]
fn test_discovered_controllers_are_registered() {
    for container in containers() {
        container
            .register::<dyn Clock, FixedClock>(None, Lifetime::Singleton)
            .unwrap();
        container
            .register::<dyn Greeter, ClockGreeter>(None, Lifetime::Transient)
            .unwrap();

        let environment: Vec<Arc<dyn TypeModule>> = vec![
            Arc::new(
                StaticModule::new("services")
                    .with_type::<Lenient>()
                    .with_type::<Strict>(),
            ),
            Arc::new(FailingModule),
        ];
        let registered = register_discovered(
            &container,
            &environment,
            |descriptor| descriptor.type_info().short_name().ends_with("Controller"),
            Lifetime::Transient,
        )
        .unwrap();

        assert_eq!(registered.len(), 1);
        assert!(container.contains::<HomeController>(None));
        assert!(!container.contains::<Strict>(None));
        let controller = container.get_instance::<HomeController>(None).unwrap();
        assert_eq!(controller.greeter.greet(), "hello@42");
    }
}
