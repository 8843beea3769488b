use std::{
    fmt,
    sync::{Arc, Mutex},
};

type Slot<T> = Arc<Mutex<Option<Box<dyn FnOnce(&T) + Send>>>>;

/// A callback that runs at most once, no matter how many clones of it exist.
///
/// Configuration snapshots are cloned freely between render passes; every
/// clone points at the same slot, so whichever fires first consumes it.
pub struct OneShot<T: ?Sized> {
    slot: Slot<T>,
}

impl<T: ?Sized> OneShot<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Some(Box::new(callback)))),
        }
    }

    /// Run the callback if it has not run yet. Returns whether it ran.
    pub fn fire(&self, arg: &T) -> bool {
        let callback = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };

        // Lock released before the call so the callback may clone `self`
        match callback {
            Some(callback) => {
                callback(arg);
                true
            }
            None => false,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

impl<T: ?Sized> Clone for OneShot<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: ?Sized> fmt::Debug for OneShot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShot")
            .field("spent", &self.is_spent())
            .finish()
    }
}
