//! Entry point tying a data-access service to container handles.
//!
//! ```ignore
//! let store = DataStore::new(service);
//! let timers = store.typed_container::<Timer>();
//! let raw = store.container("timers");
//! ```

use crate::{
    collection::{Container, TypedContainer},
    document::Document,
    service::NoSqlDbService,
};

/// A data-access service plus handle factories for its containers.
#[derive(Debug)]
pub struct DataStore<S: NoSqlDbService> {
    service: S,
}

impl<S: NoSqlDbService> DataStore<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Gets a typed handle for the container named by `D::container_name()`.
    pub fn typed_container<'a, D: Document>(&'a self) -> TypedContainer<'a, S, D> {
        TypedContainer::new(&self.service)
    }

    /// Gets an untyped handle for the named container.
    pub fn container<'a>(&'a self, name: &str) -> Container<'a, S> {
        Container::new(name.to_string(), &self.service)
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn into_inner(self) -> S {
        self.service
    }
}
