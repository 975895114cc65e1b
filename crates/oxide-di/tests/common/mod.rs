#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use oxide_di::{Container, ContainerSlot, Service, ValueMap};

/// A leaf object built from a name.
#[derive(Debug)]
pub struct Store {
    pub name: String,
}
impl Service for Store {}

/// An object built from an option map, keeping its container.
pub struct Cache {
    pub options: ValueMap,
    pub slot: ContainerSlot,
}
impl Service for Cache {
    fn container_slot(&self) -> Option<&ContainerSlot> {
        Some(&self.slot)
    }
}

/// An object that carries its own container slot, already filled.
pub struct Preattached {
    pub slot: ContainerSlot,
}
impl Service for Preattached {
    fn container_slot(&self) -> Option<&ContainerSlot> {
        Some(&self.slot)
    }
}

/// Returns a container with `Store` and `Cache` classes, plus a counter of
/// `Store` constructions.
pub fn container() -> (Arc<Container>, Arc<AtomicUsize>) {
    let built = Arc::new(AtomicUsize::new(0));
    let container = Container::new();

    let counter = Arc::clone(&built);
    container.register_class("Store", move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Store {
            name: args.str(0)?.to_string(),
        })
    });
    container.register_class("Cache", |args| {
        Ok(Cache {
            options: args.map(0)?.clone(),
            slot: ContainerSlot::new(),
        })
    });
    (container, built)
}

pub fn constructions(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
