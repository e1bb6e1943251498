//! Reversible document-store commands.
//!
//! [`InsertCommand`] and [`DeleteCommand`] mutate a [`DocumentCollection`]
//! and remember enough to reverse the mutation, so they can be grouped into a
//! [`compensate_saga::Transaction`]. [`MemoryCollection`] is an in-process
//! collection of JSON documents implementing the collaborator contract.

mod collection;
mod delete;
mod error;
mod insert;
mod memory;

#[cfg(test)]
pub(crate) mod mocks;

pub use collection::DocumentCollection;
pub use delete::DeleteCommand;
pub use error::StoreError;
pub use insert::InsertCommand;
pub use memory::{ID_FIELD, MemoryCollection};
