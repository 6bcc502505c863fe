use di_abstractions::{Injectable, TypeDescriptor};
use injection_macros::Injectable;
use std::sync::Arc;

trait Greeter: Send + Sync {}

#[derive(Default, Injectable)]
#[injection(provides(dyn Greeter))]
struct Plain {
    #[inject]
    pub prefix: Option<Arc<String>>,
}

impl Greeter for Plain {}

fn main() {
    let descriptor: TypeDescriptor = Plain::describe();
    assert_eq!(descriptor.constructors().len(), 1);
    assert_eq!(descriptor.properties().len(), 1);
    assert!(descriptor.provides(di_abstractions::ServiceType::of::<dyn Greeter>()));
}
