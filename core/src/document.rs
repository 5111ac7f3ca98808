//! Mesh document: the set of meshes a scene shows, keyed by integer id.
//!
//! The document owns each mesh behind a shared lock so GPU-side consumers
//! can read it while the UI thread edits it. Membership changes are
//! broadcast to every subscriber as [`DocumentEvent`]s over a
//! `crossbeam_channel`; subscribers drain them at their own pace.

use std::collections::BTreeMap;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Mutex, RwLock};

use crate::mesh::MeshModel;

/// Identifier of a mesh inside a document.
pub type MeshId = u32;

/// A mesh shared between the document and its consumers.
pub type SharedMesh = Arc<RwLock<MeshModel>>;

/// Membership notification emitted by a [`MeshDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentEvent {
    MeshAdded(MeshId),
    MeshRemoved(MeshId),
}

/// A set of meshes keyed by id.
///
/// # Example
///
/// ```ignore
/// let doc = MeshDocument::new();
/// let events = doc.subscribe();
/// let id = doc.add_mesh(generate_cube(1.0));
/// assert_eq!(events.try_recv(), Ok(DocumentEvent::MeshAdded(id)));
/// ```
#[derive(Debug, Default)]
pub struct MeshDocument {
    meshes: RwLock<BTreeMap<MeshId, SharedMesh>>,
    next_id: Mutex<MeshId>,
    subscribers: Mutex<Vec<Sender<DocumentEvent>>>,
}

impl MeshDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh under a fresh id and notify subscribers.
    pub fn add_mesh(&self, mesh: MeshModel) -> MeshId {
        let id = {
            let mut meshes = self.meshes.write();
            let mut next = self.next_id.lock();
            while meshes.contains_key(&*next) {
                *next = next.wrapping_add(1);
            }
            let id = *next;
            *next = next.wrapping_add(1);
            meshes.insert(id, Arc::new(RwLock::new(mesh)));
            id
        };
        log::debug!("MeshDocument: added mesh {id}");
        self.broadcast(DocumentEvent::MeshAdded(id));
        id
    }

    /// Insert a mesh under a caller-chosen id.
    ///
    /// Returns `false` and leaves the document untouched if `id` is taken.
    pub fn insert_mesh(&self, id: MeshId, mesh: MeshModel) -> bool {
        {
            let mut meshes = self.meshes.write();
            if meshes.contains_key(&id) {
                return false;
            }
            meshes.insert(id, Arc::new(RwLock::new(mesh)));
        }
        log::debug!("MeshDocument: inserted mesh {id}");
        self.broadcast(DocumentEvent::MeshAdded(id));
        true
    }

    /// Remove a mesh and notify subscribers. Returns the removed mesh, if any.
    pub fn remove_mesh(&self, id: MeshId) -> Option<SharedMesh> {
        let removed = self.meshes.write().remove(&id);
        if removed.is_some() {
            log::debug!("MeshDocument: removed mesh {id}");
            self.broadcast(DocumentEvent::MeshRemoved(id));
        }
        removed
    }

    /// Look up a mesh by id.
    pub fn get_mesh(&self, id: MeshId) -> Option<SharedMesh> {
        self.meshes.read().get(&id).cloned()
    }

    /// Ids of all meshes, in ascending order.
    pub fn mesh_ids(&self) -> Vec<MeshId> {
        self.meshes.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.meshes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.read().is_empty()
    }

    /// Subscribe to membership events emitted from now on.
    pub fn subscribe(&self) -> Receiver<DocumentEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    fn broadcast(&self, event: DocumentEvent) {
        // Dropped receivers are pruned on the next send.
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event).is_ok());
    }
}
