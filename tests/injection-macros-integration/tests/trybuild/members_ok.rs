use di_abstractions::Injectable;
use injection_macros::{injectable, Injectable};
use std::sync::Arc;

struct Settings;

#[derive(Injectable)]
#[injection(members)]
struct Service {
    settings: Arc<Settings>,
    ready: bool,
}

#[injectable]
impl Service {
    #[inject]
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            ready: false,
        }
    }

    #[inject]
    pub fn start(&mut self) -> Result<(), String> {
        self.ready = true;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

fn main() {
    let descriptor = Service::describe();
    assert!(descriptor.constructors()[0].is_marked());
    assert_eq!(descriptor.methods()[0].name(), "start");
}
