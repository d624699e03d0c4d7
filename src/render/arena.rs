use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::artboard::catalog::ArtboardCatalog;
use crate::event::RiveEvent;
use crate::runtime::NativeArtboard;
use crate::state_machine::StateMachineBridge;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
/// Generation-indexed handle to an artboard slot.
pub struct ArtboardId {
    index: u32,
    generation: u32,
}

impl ArtboardId {
    /// Slot index.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at allocation time.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
/// Identity of one `AnimationFile`.
pub struct FileId(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
/// Artboard lifecycle.
pub enum Lifecycle {
    /// No native instance; queries return defaults.
    #[default]
    Uninitialized,
    /// Initialization was issued and has not run yet.
    Initializing,
    /// Native instance and catalog are present.
    Initialized,
}

/// Native artboard instance and everything sharing its lifecycle.
pub struct ArtboardInstance {
    /// File the instance was cloned from.
    pub file: FileId,
    /// Import generation of that file.
    pub file_generation: u64,
    /// Owned native artboard.
    pub native: Box<dyn NativeArtboard>,
    /// Bound state machine, if any.
    pub state_machine: Option<StateMachineBridge>,
    /// Names discovered at initialization.
    pub catalog: ArtboardCatalog,
}

#[derive(Default)]
struct Slot {
    generation: u32,
    occupied: bool,
    lifecycle: Lifecycle,
    instance: Option<ArtboardInstance>,
    pending_events: Vec<RiveEvent>,
}

/// Registry of artboard instances and live files, guarded by the [`ThreadLock`].
#[derive(Default)]
pub struct InstanceArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live_files: HashMap<FileId, u64>,
}

impl InstanceArena {
    /// Reserve a slot in the `Uninitialized` state.
    pub fn allocate(&mut self) -> ArtboardId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.occupied = true;
            return ArtboardId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            occupied: true,
            ..Slot::default()
        });
        ArtboardId {
            index,
            generation: 0,
        }
    }

    /// Release a slot; `id` and every copy of it become stale.
    pub fn free(&mut self, id: ArtboardId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.instance = None;
            slot.pending_events.clear();
            slot.lifecycle = Lifecycle::Uninitialized;
            slot.occupied = false;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    fn slot(&self, id: ArtboardId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.occupied && s.generation == id.generation)
    }

    fn slot_mut(&mut self, id: ArtboardId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.occupied && s.generation == id.generation)
    }

    /// `true` while `id` refers to an allocated slot.
    pub fn contains(&self, id: ArtboardId) -> bool {
        self.slot(id).is_some()
    }

    /// Lifecycle of `id`; stale ids report `Uninitialized`.
    pub fn lifecycle(&self, id: ArtboardId) -> Lifecycle {
        self.slot(id).map_or(Lifecycle::Uninitialized, |s| s.lifecycle)
    }

    /// Mark `id` as having an initialization in flight.
    ///
    /// Any previous instance is dropped, so queries answer with defaults until the
    /// new one is installed.
    pub fn begin_initialize(&mut self, id: ArtboardId) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.instance = None;
                slot.pending_events.clear();
                slot.lifecycle = Lifecycle::Initializing;
                true
            }
            None => false,
        }
    }

    /// Store a fully built instance, replacing any previous one.
    pub fn install(&mut self, id: ArtboardId, instance: ArtboardInstance) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.instance = Some(instance);
                slot.pending_events.clear();
                slot.lifecycle = Lifecycle::Initialized;
                true
            }
            None => false,
        }
    }

    /// Drop the instance and its state machine together.
    pub fn reset(&mut self, id: ArtboardId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.instance = None;
            slot.pending_events.clear();
            slot.lifecycle = Lifecycle::Uninitialized;
        }
    }

    /// Initialized instance for `id`.
    pub fn instance(&self, id: ArtboardId) -> Option<&ArtboardInstance> {
        self.slot(id)?.instance.as_ref()
    }

    /// Mutable initialized instance for `id`.
    pub fn instance_mut(&mut self, id: ArtboardId) -> Option<&mut ArtboardInstance> {
        self.slot_mut(id)?.instance.as_mut()
    }

    /// Stash events for dispatch on a later tick.
    pub fn stash_events(&mut self, id: ArtboardId, events: Vec<RiveEvent>) {
        if let Some(slot) = self.slot_mut(id) {
            slot.pending_events.extend(events);
        }
    }

    /// Take stashed events.
    pub fn take_stashed_events(&mut self, id: ArtboardId) -> Vec<RiveEvent> {
        self.slot_mut(id)
            .map(|s| std::mem::take(&mut s.pending_events))
            .unwrap_or_default()
    }

    /// Record `generation` as the live import of `file`.
    pub fn register_file(&mut self, file: FileId, generation: u64) {
        self.live_files.insert(file, generation);
    }

    /// `true` when `generation` is the live import of `file`.
    pub fn file_is_live(&self, file: FileId, generation: u64) -> bool {
        self.live_files.get(&file) == Some(&generation)
    }

    /// Reset every instance built from `file` at `generation`. Returns how many.
    pub fn invalidate_file_generation(&mut self, file: FileId, generation: u64) -> usize {
        self.invalidate_where(|i| i.file == file && i.file_generation == generation)
    }

    /// Forget `file` and reset every instance built from any of its imports.
    pub fn retire_file(&mut self, file: FileId) -> usize {
        self.live_files.remove(&file);
        self.invalidate_where(|i| i.file == file)
    }

    fn invalidate_where(&mut self, pred: impl Fn(&ArtboardInstance) -> bool) -> usize {
        let mut count = 0;
        for slot in self.slots.iter_mut().filter(|s| s.occupied) {
            if slot.instance.as_ref().is_some_and(&pred) {
                slot.instance = None;
                slot.pending_events.clear();
                slot.lifecycle = Lifecycle::Uninitialized;
                count += 1;
            }
        }
        count
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.occupied).count()
    }

    /// `true` when no slot is allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Default)]
/// Renderer-wide lock over the [`InstanceArena`].
///
/// Every artboard and state-machine mutation, and every render-target submit, holds
/// this lock, so it is the single cross-context synchronization point.
pub struct ThreadLock(Arc<Mutex<InstanceArena>>);

impl ThreadLock {
    /// New lock over an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is held. A poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, InstanceArena> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` when both handles guard the same arena.
    pub fn same_as(&self, other: &ThreadLock) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/arena.rs"]
mod tests;
