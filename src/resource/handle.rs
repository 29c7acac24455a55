//! Shared handles to resources.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::clients::Transport;
use crate::resource::{Reference, Resource, ResourceError, ResourceIdentifier};
use crate::store::ResourceStore;

/// A shared, mutable reference to a [`Resource`].
///
/// A store hands out at most one handle per `(type, id)`, so every part of
/// the program sees the same object. Handles are cheap to clone and are not
/// `Send`: a store and its resources live on one thread.
///
/// # Panics
///
/// [`read`](Self::read) and [`write`](Self::write) follow `RefCell` rules:
/// writing while another borrow is alive panics. Methods on this type take
/// their borrows one at a time and never hold one across an `.await`.
#[derive(Clone)]
pub struct ResourceHandle(Rc<RefCell<Resource>>);

impl ResourceHandle {
    /// Wraps a resource.
    #[must_use]
    pub fn new(resource: Resource) -> Self {
        Self(Rc::new(RefCell::new(resource)))
    }

    /// Borrows the resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource is currently borrowed for writing.
    #[must_use]
    pub fn read(&self) -> Ref<'_, Resource> {
        self.0.borrow()
    }

    /// Borrows the resource for modification.
    ///
    /// # Panics
    ///
    /// Panics if the resource is currently borrowed.
    #[must_use]
    pub fn write(&self) -> RefMut<'_, Resource> {
        self.0.borrow_mut()
    }

    /// Borrows the resource for modification, or returns `None` while any
    /// other borrow is alive.
    #[must_use]
    pub fn try_write(&self) -> Option<RefMut<'_, Resource>> {
        self.0.try_borrow_mut().ok()
    }

    /// Returns `true` when both handles point at the same resource.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Returns a copy of the resource's identifier.
    #[must_use]
    pub fn identifier(&self) -> ResourceIdentifier {
        self.read().identifier().clone()
    }

    /// Returns the resource type.
    #[must_use]
    pub fn type_name(&self) -> String {
        self.read().type_name().to_string()
    }

    /// Returns the resource id (empty until saved).
    #[must_use]
    pub fn id(&self) -> String {
        self.read().id().to_string()
    }

    /// Returns `true` once the server has assigned an id.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.read().is_saved()
    }

    /// Returns `true` when there is anything to save.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.read().is_modified()
    }

    /// Returns the target of to-one relationship `name`, loading it on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names, and
    /// propagates any error from [`ResourceStore::find`] other than a `404`.
    pub async fn related<T: Transport>(
        &self,
        name: &str,
        store: &ResourceStore<T>,
    ) -> Result<Option<ResourceHandle>, ResourceError> {
        let reference = self.read().to_one(name)?.reference().cloned();
        let identifier = match reference {
            None => return Ok(None),
            Some(Reference::Resolved(handle)) => return Ok(Some(handle)),
            Some(Reference::Unresolved(identifier)) => identifier,
        };

        let resolved = store.find(identifier.type_name(), identifier.id(), None).await?;
        if let Some(handle) = &resolved {
            self.write()
                .to_one_mut(name)?
                .resolve_with(&identifier, handle.clone());
        }
        Ok(resolved)
    }

    /// Returns the ids of to-many relationship `name` without loading anything.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names.
    pub fn related_keys(&self, name: &str) -> Result<Vec<String>, ResourceError> {
        Ok(self.read().to_many(name)?.keys())
    }

    /// Returns member `id` of to-many relationship `name`, loading it on
    /// first access.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceHandle::related`].
    pub async fn related_member<T: Transport>(
        &self,
        name: &str,
        id: &str,
        store: &ResourceStore<T>,
    ) -> Result<Option<ResourceHandle>, ResourceError> {
        let reference = {
            let resource = self.read();
            resource
                .to_many(name)?
                .collection()
                .and_then(|collection| collection.reference(id))
                .cloned()
        };
        let identifier = match reference {
            None => return Ok(None),
            Some(Reference::Resolved(handle)) => return Ok(Some(handle)),
            Some(Reference::Unresolved(identifier)) => identifier,
        };

        let resolved = store.find(identifier.type_name(), identifier.id(), None).await?;
        if let Some(handle) = &resolved {
            if let Some(collection) = self.write().to_many_mut(name)?.collection_mut() {
                collection.resolve_with(&identifier, handle.clone());
            }
        }
        Ok(resolved)
    }

    /// Returns every member of to-many relationship `name` in order, loading
    /// unresolved ones. Members the server no longer has are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceHandle::related`].
    pub async fn related_many<T: Transport>(
        &self,
        name: &str,
        store: &ResourceStore<T>,
    ) -> Result<Vec<ResourceHandle>, ResourceError> {
        let mut resources = Vec::new();
        for id in self.related_keys(name)? {
            match self.related_member(name, &id, store).await? {
                Some(handle) => resources.push(handle),
                None => tracing::warn!("Skipping {} member {}: not found on the server", name, id),
            }
        }
        Ok(resources)
    }

    /// Saves this resource and, first, every auto-saved related resource.
    ///
    /// Related resources are saved depth-first; each resource is visited
    /// once, so cycles are safe. A resource is sent only when it is modified
    /// or one of its auto-saved targets was just sent. Earlier saves are not
    /// undone when a later one fails.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`ResourceStore::save`].
    pub async fn save<T: Transport>(&self, store: &ResourceStore<T>) -> Result<(), ResourceError> {
        let mut sent = HashSet::new();
        for step in self.save_plan() {
            let dependency_sent = step.dependencies.iter().any(|key| sent.contains(key));
            if step.handle.is_modified() || dependency_sent {
                store.save(&step.handle).await?;
                sent.insert(step.handle.key());
            }
        }
        Ok(())
    }

    fn save_plan(&self) -> Vec<SaveStep> {
        fn visit(handle: &ResourceHandle, visited: &mut HashSet<usize>, plan: &mut Vec<SaveStep>) {
            if !visited.insert(handle.key()) {
                return;
            }
            let targets = handle.read().auto_save_targets();
            for target in &targets {
                visit(target, visited, plan);
            }
            plan.push(SaveStep {
                handle: handle.clone(),
                dependencies: targets.iter().map(ResourceHandle::key).collect(),
            });
        }

        let mut plan = Vec::new();
        visit(self, &mut HashSet::new(), &mut plan);
        plan
    }

    /// Deletes this resource on the server and evicts it from the store.
    ///
    /// Does nothing for a resource that was never saved.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`ResourceStore::delete`].
    pub async fn delete<T: Transport>(&self, store: &ResourceStore<T>) -> Result<(), ResourceError> {
        if !self.is_saved() {
            return Ok(());
        }
        store.delete(self).await
    }
}

struct SaveStep {
    handle: ResourceHandle,
    dependencies: Vec<usize>,
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(resource) => f
                .debug_tuple("ResourceHandle")
                .field(resource.identifier())
                .finish(),
            Err(_) => f.write_str("ResourceHandle(<borrowed>)"),
        }
    }
}
