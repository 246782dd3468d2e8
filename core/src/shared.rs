//! A reference-counted, copy-on-write handle.
//!
//! [Shared] is the storage behind every [crate::Value]. Cloning a handle only bumps an atomic
//! reference count; the payload is copied lazily, the first time a handle that isn't the sole
//! owner asks for mutable access (a _detach_). The handle itself is exactly one pointer wide.
//!
//! The uniqueness check and the copy are delegated to [Arc::make_mut], which decides with an
//! atomic compare-exchange. A detach racing with a concurrent clone on another thread can at
//! worst perform one unnecessary copy; it can never hand out a mutable reference to a payload
//! that another handle still observes.
use crate::metrics::increment;

use std::{fmt, ops::Deref, sync::Arc};

/// A copy-on-write, atomically reference-counted handle to a `T`.
pub struct Shared<T>(Arc<T>);

impl<T> Shared<T> {
    /// Moves `data` to the heap. The resulting handle is 1-reference counted.
    #[inline]
    pub fn new(data: T) -> Self {
        Shared(Arc::new(data))
    }

    /// Returns a shared reference to the payload. Never clones and never touches the reference
    /// count, so it's safe to call from several handles or threads at once.
    #[inline]
    pub fn get(&self) -> &T {
        &self.0
    }

    /// Same as [Arc::get_mut]: returns a mutable reference to the payload if `this` is the only
    /// handle pointing to it, or `None` otherwise. Never clones.
    #[inline]
    pub fn get_mut(this: &mut Self) -> Option<&mut T> {
        Arc::get_mut(&mut this.0)
    }

    /// The number of handles currently sharing the payload of `this`.
    #[inline]
    pub fn ref_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }

    /// Returns `true` if `this` and `other` point to the same payload.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Returns `true` if `this` is the only handle to its payload.
    #[inline]
    pub fn is_unique(this: &Self) -> bool {
        Self::ref_count(this) == 1
    }
}

impl<T: Clone> Shared<T> {
    /// Returns a mutable reference to the payload, detaching first if needed.
    ///
    /// If the payload is shared, `this` is re-pointed to a fresh 1-reference counted copy and the
    /// other handles keep the original. If `this` is already the sole owner, the payload is
    /// returned in place and nothing is allocated.
    pub fn make_mut(this: &mut Self) -> &mut T {
        if Self::is_unique(this) {
            increment!("shared::make_mut::no clone");
        } else {
            increment!("shared::make_mut::strong clone");
            log::trace!(
                "detaching payload shared by {} handles",
                Self::ref_count(this)
            );
        }

        Arc::make_mut(&mut this.0)
    }

    /// Allocates a fresh handle holding a copy of the payload. As opposed to [Clone::clone],
    /// which shares the payload, the result is always 1-reference counted.
    pub fn strong_clone(this: &Self) -> Self {
        Shared::new(T::clone(&this.0))
    }

    /// Extracts the payload, moving it out if `this` is the sole owner and cloning it otherwise.
    pub fn unwrap_or_clone(this: Self) -> T {
        Arc::unwrap_or_clone(this.0)
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        Shared(Arc::clone(&self.0))
    }

    fn clone_from(&mut self, source: &Self) {
        if !Self::ptr_eq(self, source) {
            self.0 = Arc::clone(&source.0);
        }
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Shared::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<T> From<T> for Shared<T> {
    fn from(data: T) -> Self {
        Shared::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        mem::size_of,
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    /// A payload counting how many times it has been cloned. Each test uses its own counter so
    /// that tests can run in parallel.
    struct Counted<'a> {
        value: u32,
        clones: &'a AtomicUsize,
    }

    impl Clone for Counted<'_> {
        fn clone(&self) -> Self {
            self.clones.fetch_add(1, Ordering::SeqCst);
            Counted {
                value: self.value,
                clones: self.clones,
            }
        }
    }

    #[test]
    fn handle_is_pointer_sized() {
        assert_eq!(size_of::<Shared<String>>(), size_of::<usize>());
        assert_eq!(size_of::<Option<Shared<String>>>(), size_of::<usize>());
    }

    #[test]
    fn ref_counting() {
        let shared = Shared::new(42u32);
        let copies: Vec<_> = (0..20).map(|_| shared.clone()).collect();

        assert_eq!(Shared::ref_count(&shared), 21);
        assert!(copies.iter().all(|copy| Shared::ptr_eq(copy, &shared)));

        drop(copies);
        assert_eq!(Shared::ref_count(&shared), 1);
    }

    #[test]
    fn make_mut_detaches_shared_payload() {
        let clones = AtomicUsize::new(0);
        let mut original = Shared::new(Counted {
            value: 1,
            clones: &clones,
        });
        let copy = original.clone();

        assert!(Shared::get_mut(&mut original).is_none());

        Shared::make_mut(&mut original).value = 2;

        assert_eq!(clones.load(Ordering::SeqCst), 1);
        assert_eq!(original.value, 2);
        assert_eq!(copy.value, 1);
        assert_eq!(Shared::ref_count(&original), 1);
        assert_eq!(Shared::ref_count(&copy), 1);
        assert!(!Shared::ptr_eq(&original, &copy));
    }

    #[test]
    fn make_mut_on_unique_payload_never_clones() {
        let clones = AtomicUsize::new(0);
        let mut shared = Shared::new(Counted {
            value: 0,
            clones: &clones,
        });

        for i in 0..10 {
            Shared::make_mut(&mut shared).value = i;
        }
        assert_eq!(clones.load(Ordering::SeqCst), 0);

        // Once the copy is gone the handle is unique again, so the next write is in place.
        let copy = shared.clone();
        drop(copy);
        Shared::make_mut(&mut shared).value = 100;

        assert_eq!(clones.load(Ordering::SeqCst), 0);
        assert_eq!(shared.value, 100);
    }

    #[test]
    fn a_single_detach_per_shared_payload() {
        let clones = AtomicUsize::new(0);
        let mut shared = Shared::new(Counted {
            value: 0,
            clones: &clones,
        });
        let _keep = shared.clone();

        Shared::make_mut(&mut shared).value = 1;
        Shared::make_mut(&mut shared).value = 2;
        Shared::make_mut(&mut shared).value = 3;

        assert_eq!(clones.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clone_from_self_is_a_no_op() {
        let mut shared = Shared::new(String::from("hello"));
        let alias = shared.clone();

        shared.clone_from(&alias);
        assert_eq!(Shared::ref_count(&shared), 2);

        let other = Shared::new(String::from("world"));
        shared.clone_from(&other);
        assert_eq!(Shared::ref_count(&alias), 1);
        assert_eq!(Shared::ref_count(&other), 2);
        assert_eq!(shared.get(), "world");
    }

    #[test]
    fn unwrap_or_clone_moves_out_unique_payload() {
        let clones = AtomicUsize::new(0);
        let shared = Shared::new(Counted {
            value: 7,
            clones: &clones,
        });
        let copy = shared.clone();

        let first = Shared::unwrap_or_clone(shared);
        assert_eq!(clones.load(Ordering::SeqCst), 1);

        let second = Shared::unwrap_or_clone(copy);
        assert_eq!(clones.load(Ordering::SeqCst), 1);
        assert_eq!(first.value, second.value);
    }

    #[test]
    fn strong_clone_copies_the_payload() {
        let clones = AtomicUsize::new(0);
        let shared = Shared::new(Counted {
            value: 3,
            clones: &clones,
        });
        let _copy = shared.clone();

        let fresh = Shared::strong_clone(&shared);

        assert_eq!(clones.load(Ordering::SeqCst), 1);
        assert!(!Shared::ptr_eq(&fresh, &shared));
        assert_eq!(Shared::ref_count(&fresh), 1);
        assert_eq!(Shared::ref_count(&shared), 2);
        assert_eq!(fresh.value, 3);
    }

    #[test]
    fn copies_dropped_across_threads() {
        let shared = Shared::new(vec![1u64, 2, 3]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let copy = shared.clone();
                thread::spawn(move || {
                    let mut local = copy.clone();
                    Shared::make_mut(&mut local).push(4);
                    assert_eq!(copy.len(), 3);
                    local.len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4);
        }

        assert_eq!(*shared, vec![1, 2, 3]);
        assert_eq!(Shared::ref_count(&shared), 1);
    }
}
