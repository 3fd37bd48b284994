//! Per-request context shared between middlewares and the handler.
//!
//! A [`Context`] starts empty for every request. Middlewares put values into
//! it, later middlewares and the handler read them back. Values are keyed by
//! their Rust type, so two middlewares never collide unless they agree on a
//! type.
//!
//! # Extending the context from your own module
//!
//! No central struct lists every field. A middleware that decodes a caller
//! defines its own type and, if it wants a nicer call site, an extension
//! trait:
//!
//! ```rust
//! use tollgate::Context;
//!
//! #[derive(Debug)]
//! pub struct Caller { pub id: u64 }
//!
//! pub trait CallerContext {
//!     fn caller(&self) -> Option<&Caller>;
//! }
//!
//! impl CallerContext for Context {
//!     fn caller(&self) -> Option<&Caller> { self.get::<Caller>() }
//! }
//!
//! let mut ctx = Context::new();
//! ctx.insert(Caller { id: 7 });
//! assert_eq!(ctx.caller().map(|c| c.id), Some(7));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Typed, growable map carried through one request.
///
/// Owned by the in-flight request: created by the route, lent mutably to
/// each middleware in turn, then moved into the handler. Dropped when the
/// handler returns or a rejection has been written.
#[derive(Default)]
pub struct Context {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the previous value of the same type if any.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut::<T>())
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("len", &self.values.len()).finish()
    }
}
