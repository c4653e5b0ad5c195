//! Scoped ownership of native-allocated values.
//!
//! Strings and arrays returned by libclang come with a "caller must free"
//! contract. [`Tracked`] holds such a value in one of two states:
//!
//! ```text
//! Acquired --release--> Released
//! ```
//!
//! Reading a released value fails with `UseAfterDispose`. Releasing again is
//! a no-op. Dropping an acquired value releases it.

use crate::arena::HandleClass;
use crate::error::{LifecycleError, Result};

/// A native value with a matching release routine.
pub trait Release {
    /// Label used in lifecycle errors.
    const CLASS: HandleClass;

    /// Free the native storage. Called exactly once per acquired value.
    fn release(&mut self);
}

/// A native value that is released exactly once.
#[derive(Debug)]
pub struct Tracked<R: Release> {
    value: Option<R>,
}

impl<R: Release> Tracked<R> {
    /// Take ownership of a freshly returned native value.
    pub fn acquire(value: R) -> Self {
        Self { value: Some(value) }
    }

    pub fn is_released(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the value if it has not been released.
    pub fn get(&self) -> Result<&R> {
        self.value
            .as_ref()
            .ok_or(LifecycleError::UseAfterDispose { class: R::CLASS })
    }

    /// Release the native storage now.
    pub fn release(&mut self) {
        if let Some(mut value) = self.value.take() {
            tracing::trace!(class = %R::CLASS, "releasing tracked value");
            value.release();
        }
    }
}

impl<R: Release> Drop for Tracked<R> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Counted {
        frees: Rc<Cell<u32>>,
        text: &'static str,
    }

    impl Release for Counted {
        const CLASS: HandleClass = HandleClass::String;

        fn release(&mut self) {
            self.frees.set(self.frees.get() + 1);
        }
    }

    fn counted(frees: &Rc<Cell<u32>>) -> Tracked<Counted> {
        Tracked::acquire(Counted {
            frees: frees.clone(),
            text: "spelling",
        })
    }

    #[test]
    fn test_read_while_acquired() {
        let frees = Rc::new(Cell::new(0));
        let tracked = counted(&frees);
        assert_eq!(tracked.get().map(|c| c.text), Ok("spelling"));
        assert!(!tracked.is_released());
    }

    #[test]
    fn test_read_after_release_fails() {
        let frees = Rc::new(Cell::new(0));
        let mut tracked = counted(&frees);
        tracked.release();
        assert_eq!(
            tracked.get().map(|c| c.text),
            Err(LifecycleError::UseAfterDispose {
                class: HandleClass::String
            })
        );
    }

    #[test]
    fn test_released_exactly_once() {
        let frees = Rc::new(Cell::new(0));
        {
            let mut tracked = counted(&frees);
            tracked.release();
            tracked.release();
        }
        assert_eq!(frees.get(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let frees = Rc::new(Cell::new(0));
        drop(counted(&frees));
        assert_eq!(frees.get(), 1);
    }
}
