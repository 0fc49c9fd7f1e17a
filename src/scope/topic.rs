use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::ScopeId;
use crate::error::{NavError, NavResult};

/// Registry-owned storage behind a topic
pub(crate) struct TopicCell<T> {
    value: RefCell<T>,
}

impl<T> TopicCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }
}

/// Client handle to a shared topic.
///
/// The registry owns the payload; a handle only observes it. Once the scope
/// the topic is bound to ends, every access returns [`NavError::TopicGone`].
/// Handles obtained for the same (scope, id) refer to the same payload, see
/// [`Topic::ptr_eq`].
pub struct Topic<T> {
    cell: Weak<TopicCell<T>>,
    scope: ScopeId,
    id: String,
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            scope: self.scope,
            id: self.id.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("scope", &self.scope)
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<T> Topic<T> {
    pub(crate) fn from_cell(cell: &Rc<TopicCell<T>>, scope: ScopeId, id: &str) -> Self {
        Self {
            cell: Rc::downgrade(cell),
            scope,
            id: id.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// False once the owning scope has ended
    pub fn is_alive(&self) -> bool {
        self.cell.strong_count() > 0
    }

    /// Whether both handles point at the same registry-owned payload
    pub fn ptr_eq(&self, other: &Topic<T>) -> bool {
        self.is_alive() && Weak::ptr_eq(&self.cell, &other.cell)
    }

    fn cell(&self) -> NavResult<Rc<TopicCell<T>>> {
        self.cell
            .upgrade()
            .ok_or_else(|| NavError::TopicGone(self.id.clone()))
    }

    /// Read the payload. Must not be nested inside [`Topic::update`] on the same topic.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> NavResult<R> {
        let cell = self.cell()?;
        let value = cell.value.borrow();
        Ok(f(&value))
    }

    /// Mutate the payload in place
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> NavResult<R> {
        let cell = self.cell()?;
        let mut value = cell.value.borrow_mut();
        Ok(f(&mut value))
    }

    pub fn set(&self, value: T) -> NavResult<()> {
        self.update(|slot| *slot = value)
    }

    pub fn get(&self) -> NavResult<T>
    where
        T: Clone,
    {
        self.read(T::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_dies_with_cell() {
        let cell = Rc::new(TopicCell::new(5u32));
        let topic = Topic::from_cell(&cell, ScopeId::App, "counter");

        assert_eq!(topic.get(), Ok(5));
        topic.update(|v| *v += 1).unwrap();
        assert_eq!(topic.get(), Ok(6));

        drop(cell);
        assert!(!topic.is_alive());
        assert_eq!(topic.get(), Err(NavError::TopicGone("counter".into())));
    }

    #[test]
    fn test_ptr_eq_distinguishes_cells() {
        let a = Rc::new(TopicCell::new(0u8));
        let b = Rc::new(TopicCell::new(0u8));

        let a1 = Topic::from_cell(&a, ScopeId::App, "x");
        let a2 = a1.clone();
        let b1 = Topic::from_cell(&b, ScopeId::App, "x");

        assert!(a1.ptr_eq(&a2));
        assert!(!a1.ptr_eq(&b1));
    }
}
