//! Target-independent pieces of LIST IT.
//!
//! Everything here compiles for both the wasm frontend and the native server:
//! the record types mirrored from the backend tables, the PostgREST query
//! builder, the route policy used by the middleware and the client-side guard,
//! session and cookie handling, form validation, and the cascade contracts for
//! deletes that span several tables.

pub mod cascade;
pub mod collections;
pub mod gotrue;
pub mod models;
pub mod mutation;
pub mod postgrest;
pub mod routes;
pub mod session;
pub mod tasks;
pub mod validation;

pub use models::{
    Collection, CollectionPatch, List, ListPatch, NewCollection, NewList, NewNote, NewTask, Note,
    NotePatch, Table, Task, TaskPatch, UserProfile,
};
pub use session::{AuthSession, AuthUser};
