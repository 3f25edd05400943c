// Copyright 2025 Cowboy AI, LLC.

//! Opaque caller context threaded through a classification call

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied payload handed to every `convert` and `build_arguments` hook
///
/// The classifier never inspects it. It is cheap to clone and `'static`, so
/// deferred diagnostics can replay a call with the same context.
#[derive(Clone, Default)]
pub struct UserContext(Option<Arc<dyn Any + Send + Sync>>);

impl UserContext {
    /// No context
    pub fn none() -> Self {
        Self(None)
    }

    /// Wrap a payload
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self(Some(Arc::new(payload)))
    }

    /// Borrow the payload as `T`
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|p| p.downcast_ref::<T>())
    }

    /// True when no payload was supplied
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for UserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("UserContext(..)"),
            None => f.write_str("UserContext(none)"),
        }
    }
}
