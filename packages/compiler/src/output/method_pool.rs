//! Method Pool
//!
//! Generated closures are handed to a `MethodEmitter`, which returns the handle
//! that `newfunction` refers to. `MethodPool` keeps them in memory in creation order.

use crate::output::abc_ast::{MethodBody, MethodHandle};

pub trait MethodEmitter {
    fn emit_method(&mut self, body: MethodBody) -> MethodHandle;
}

#[derive(Debug, Clone, Default)]
pub struct MethodPool {
    methods: Vec<MethodBody>,
}

impl MethodPool {
    pub fn new() -> Self {
        MethodPool { methods: Vec::new() }
    }

    pub fn get(&self, handle: MethodHandle) -> Option<&MethodBody> {
        self.methods.get(handle.as_usize())
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MethodHandle, &MethodBody)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, body)| (MethodHandle::new(i), body))
    }
}

impl MethodEmitter for MethodPool {
    fn emit_method(&mut self, body: MethodBody) -> MethodHandle {
        let handle = MethodHandle::new(self.methods.len());
        self.methods.push(body);
        handle
    }
}
