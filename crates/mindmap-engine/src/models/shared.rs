use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{MapEvent, MindMap};

type Listener = Arc<dyn Fn(&MapEvent) + Send + Sync>;

/// Handle returned by [`SharedMindMap::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A [`MindMap`] behind one lock, shared between threads.
///
/// All reads and writes go through [`lock`](Self::lock). Change events
/// recorded while the guard is held are delivered to listeners after the
/// lock is released, so a listener may lock the map again.
#[derive(Clone)]
pub struct SharedMindMap {
    inner: Arc<Inner>,
}

struct Inner {
    map: Mutex<MindMap>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl SharedMindMap {
    pub fn new(map: MindMap) -> Self {
        Self {
            inner: Arc::new(Inner {
                map: Mutex::new(map),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    pub fn lock(&self) -> MapGuard<'_> {
        let guard = self
            .inner
            .map
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        MapGuard {
            guard: Some(guard),
            inner: &self.inner,
        }
    }

    /// Run `f` under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut MindMap) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    pub fn add_listener(&self, listener: impl Fn(&MapEvent) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Take the map out, or give back this handle when it is still shared.
    pub fn try_unwrap(self) -> Result<MindMap, Self> {
        Arc::try_unwrap(self.inner)
            .map(|inner| inner.map.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(|inner| Self { inner })
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SharedMindMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMindMap")
            .field("listeners", &self.listeners().len())
            .finish_non_exhaustive()
    }
}

/// Exclusive access to a shared map. Dropping it releases the lock and then
/// notifies listeners.
pub struct MapGuard<'a> {
    guard: Option<MutexGuard<'a, MindMap>>,
    inner: &'a Inner,
}

impl Deref for MapGuard<'_> {
    type Target = MindMap;

    fn deref(&self) -> &MindMap {
        match &self.guard {
            Some(guard) => guard,
            None => unreachable!("map guard used after release"),
        }
    }
}

impl DerefMut for MapGuard<'_> {
    fn deref_mut(&mut self) -> &mut MindMap {
        match &mut self.guard {
            Some(guard) => guard,
            None => unreachable!("map guard used after release"),
        }
    }
}

impl Drop for MapGuard<'_> {
    fn drop(&mut self) {
        let Some(mut guard) = self.guard.take() else {
            return;
        };
        let events = guard.take_events();
        drop(guard);
        if events.is_empty() {
            return;
        }

        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for event in &events {
            for listener in &listeners {
                listener(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    #[test]
    fn listeners_receive_events_after_unlock() {
        let shared = SharedMindMap::new(MindMap::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let observer = shared.clone();
        let log = Arc::clone(&seen);
        shared.add_listener(move |event| {
            // Locking again must not deadlock.
            let count = observer.lock().topic_count();
            log.lock().unwrap().push((*event, count));
        });

        {
            let mut map = shared.lock();
            let root = map.root();
            map.add_child(root, "child").unwrap();
            map.set_text(root, "root").unwrap();
            assert!(seen.lock().unwrap().is_empty());
        }

        let root = shared.lock().root();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (MapEvent::StructureChanged, 2),
                (MapEvent::TopicChanged(root), 2)
            ]
        );
    }

    #[test]
    fn removed_listener_is_silent() {
        let shared = SharedMindMap::new(MindMap::new());
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let id = shared.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        shared.with(|map| map.set_attribute("a", Some("1")).unwrap());
        assert!(shared.remove_listener(id));
        assert!(!shared.remove_listener(id));
        shared.with(|map| map.set_attribute("a", Some("2")).unwrap());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_writers_see_a_consistent_tree() {
        let shared = SharedMindMap::new(MindMap::new());
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let mut map = shared.lock();
                        let root = map.root();
                        map.add_child(root, format!("{n}-{i}")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let map = shared.try_unwrap().unwrap();
        assert_eq!(map.topic_count(), 101);
        let root = map.root();
        for child in map.topic(root).unwrap().children() {
            assert_eq!(map.topic(*child).unwrap().parent(), Some(root));
        }
    }
}
