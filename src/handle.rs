//! Exclusive ownership of toolkit resources.
//!
//! Every resource kind implements [`Resource`], naming itself and saying how
//! it is released. A [`Handle`] owns at most one resource and releases it
//! exactly once: on [`Handle::reset`], or when the handle is dropped. Handles
//! are not `Clone`; ownership moves, and [`Handle::release`] hands the
//! resource back to the caller without releasing it.

use std::fmt;

/// A kind of resource owned through a [`Handle`].
pub trait Resource: Sized {
    /// Short name used in diagnostics.
    const KIND: &'static str;

    /// Releases the resource. The default simply drops it.
    fn free(self) {
        drop(self)
    }
}

/// Owns one resource of kind `R`, or nothing.
pub struct Handle<R: Resource> {
    resource: Option<R>,
}

impl<R: Resource> Handle<R> {
    pub const fn empty() -> Self {
        Self { resource: None }
    }

    pub const fn new(resource: R) -> Self {
        Self {
            resource: Some(resource),
        }
    }

    pub fn is_null(&self) -> bool {
        self.resource.is_none()
    }

    pub fn get(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.resource.as_mut()
    }

    /// Releases the currently owned resource, then takes ownership of
    /// `resource`.
    pub fn reset(&mut self, resource: Option<R>) {
        if let Some(old) = self.resource.take() {
            old.free();
        }
        self.resource = resource;
    }

    /// Gives up ownership without releasing. The handle is empty afterwards.
    pub fn release(&mut self) -> Option<R> {
        self.resource.take()
    }

    /// Moves the resource into a new handle, leaving this one empty.
    pub fn take(&mut self) -> Handle<R> {
        Handle {
            resource: self.resource.take(),
        }
    }
}

impl<R: Resource> Drop for Handle<R> {
    fn drop(&mut self) {
        self.reset(None);
    }
}

impl<R: Resource> Default for Handle<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: Resource> From<R> for Handle<R> {
    fn from(resource: R) -> Self {
        Self::new(resource)
    }
}

impl<R: Resource> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle<{}>(null)", R::KIND)
        } else {
            write!(f, "Handle<{}>", R::KIND)
        }
    }
}
