//! 集成测试共享的服务类型
#![allow(dead_code)]

use di_abstractions::{
    ConstructorDescriptor, Injectable, MethodDescriptor, Parameter, PropertyDescriptor,
    TypeDescriptor, Visibility,
};
use di_impl::{BackendKind, ContainerOptions, ServiceContainer};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 两种后端各一个容器
pub fn containers() -> Vec<ServiceContainer> {
    init_tracing();
    [BackendKind::Staged, BackendKind::Direct]
        .into_iter()
        .map(|backend| ServiceContainer::from_options(ContainerOptions::default().with_backend(backend)))
        .collect()
}

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        42
    }
}

impl Injectable for FixedClock {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .provides::<dyn Clock>(|this| this)
            .constructor(ConstructorDescriptor::new("new", vec![], |_| Ok(FixedClock)))
            .build()
    }
}

pub struct SlowClock;

impl Clock for SlowClock {
    fn now(&self) -> u64 {
        7
    }
}

impl Injectable for SlowClock {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .provides::<dyn Clock>(|this| this)
            .constructor(ConstructorDescriptor::new("new", vec![], |_| Ok(SlowClock)))
            .build()
    }
}

pub trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

pub struct ClockGreeter {
    pub clock: Arc<dyn Clock>,
}

impl Greeter for ClockGreeter {
    fn greet(&self) -> String {
        format!("hello@{}", self.clock.now())
    }
}

impl Injectable for ClockGreeter {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .provides::<dyn Greeter>(|this| this)
            .constructor(ConstructorDescriptor::new(
                "new",
                vec![Parameter::of::<dyn Clock>("clock")],
                |mut args| {
                    Ok(ClockGreeter {
                        clock: args.take::<dyn Clock>()?,
                    })
                },
            ))
            .build()
    }
}

/// 多个构造函数，记录被选中的那个
pub struct Ambiguous {
    pub chosen: &'static str,
}

impl Ambiguous {
    fn constructors() -> Vec<ConstructorDescriptor> {
        vec![
            ConstructorDescriptor::new("none", vec![], |_| Ok(Ambiguous { chosen: "none" })),
            ConstructorDescriptor::new("one", vec![Parameter::of::<dyn Clock>("clock")], |_| {
                Ok(Ambiguous { chosen: "one" })
            }),
            ConstructorDescriptor::new(
                "pair_a",
                vec![
                    Parameter::of::<dyn Clock>("clock"),
                    Parameter::of::<dyn Greeter>("greeter"),
                ],
                |_| Ok(Ambiguous { chosen: "pair_a" }),
            ),
            ConstructorDescriptor::new(
                "pair_b",
                vec![
                    Parameter::of::<dyn Greeter>("greeter"),
                    Parameter::of::<dyn Clock>("clock"),
                ],
                |_| Ok(Ambiguous { chosen: "pair_b" }),
            ),
            ConstructorDescriptor::new(
                "hidden",
                vec![
                    Parameter::of::<dyn Clock>("clock"),
                    Parameter::of::<dyn Greeter>("greeter"),
                    Parameter::of::<FixedClock>("fixed"),
                ],
                |_| Ok(Ambiguous { chosen: "hidden" }),
            )
            .with_visibility(Visibility::Restricted),
        ]
    }
}

impl Injectable for Ambiguous {
    fn describe() -> TypeDescriptor {
        Self::constructors()
            .into_iter()
            .fold(TypeDescriptor::builder::<Self>(), |builder, constructor| {
                builder.constructor(constructor)
            })
            .build()
    }
}

/// 与 [`Ambiguous`] 相同，但标记了参数最少的构造函数
pub struct Marked {
    pub chosen: &'static str,
}

impl Injectable for Marked {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .constructor(ConstructorDescriptor::new(
                "pair",
                vec![
                    Parameter::of::<dyn Clock>("clock"),
                    Parameter::of::<dyn Greeter>("greeter"),
                ],
                |_| Ok(Marked { chosen: "pair" }),
            ))
            .constructor(
                ConstructorDescriptor::new("none", vec![], |_| Ok(Marked { chosen: "none" }))
                    .with_marker(true),
            )
            .build()
    }
}

/// 记录注入步骤的顺序
pub struct Tracked {
    pub steps: Vec<String>,
    pub clock: Option<Arc<dyn Clock>>,
}

impl Injectable for Tracked {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .constructor(ConstructorDescriptor::new(
                "new",
                vec![Parameter::of::<dyn Greeter>("greeter")],
                |mut args| {
                    let greeter = args.take::<dyn Greeter>()?;
                    Ok(Tracked {
                        steps: vec![format!("constructor:{}", greeter.greet())],
                        clock: None,
                    })
                },
            ))
            .property(
                PropertyDescriptor::new("clock", |this: &mut Tracked, clock: Arc<dyn Clock>| {
                    this.steps.push(format!("property:{}", clock.now()));
                    this.clock = Some(clock);
                })
                .with_marker(true),
            )
            .method(
                MethodDescriptor::new(
                    "start",
                    vec![Parameter::of::<dyn Clock>("clock")],
                    |this: &mut Tracked, mut args| {
                        let clock = args.take::<dyn Clock>()?;
                        this.steps
                            .push(format!("start:property_set={}:{}", this.clock.is_some(), clock.now()));
                        Ok(())
                    },
                )
                .with_marker(true),
            )
            .method(
                MethodDescriptor::new("finish", vec![], |this: &mut Tracked, _| {
                    this.steps.push("finish".to_string());
                    Ok(())
                })
                .with_marker(true),
            )
            .build()
    }
}

/// 只有可选属性依赖
#[derive(Default)]
pub struct Lenient {
    pub clock: Option<Arc<dyn Clock>>,
}

impl Injectable for Lenient {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .constructor(ConstructorDescriptor::new("default", vec![], |_| Ok(Lenient::default())))
            .property(
                PropertyDescriptor::new("clock", |this: &mut Lenient, clock: Arc<dyn Clock>| {
                    this.clock = Some(clock);
                })
                .with_marker(true),
            )
            .build()
    }
}

/// 构造函数依赖时钟
pub struct Strict {
    pub clock: Arc<dyn Clock>,
}

impl Injectable for Strict {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .constructor(ConstructorDescriptor::new(
                "new",
                vec![Parameter::of::<dyn Clock>("clock")],
                |mut args| {
                    Ok(Strict {
                        clock: args.take::<dyn Clock>()?,
                    })
                },
            ))
            .build()
    }
}
