//! Delete orders for records that own rows in other tables.
//!
//! The backend has no cascading foreign keys, so dependents are removed first
//! and the owner last. Steps run one after another; a failure part-way leaves
//! the earlier steps applied.

use crate::models::Table;
use crate::postgrest::{Filter, Query};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteStep {
    pub table: Table,
    pub filter: Filter,
}

impl DeleteStep {
    fn new(table: Table, filter: Filter) -> Self {
        Self { table, filter }
    }

    /// Request path for a PostgREST `DELETE`.
    pub fn path(&self) -> String {
        Query::table(self.table).filter(self.filter.clone()).path()
    }

    /// Steps filtering on an empty id set have nothing to delete.
    pub fn is_noop(&self) -> bool {
        self.filter.is_empty_set()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadePlan {
    steps: Vec<DeleteStep>,
}

impl CascadePlan {
    /// Tasks, then notes, then the collection row.
    pub fn collection(collection_id: &str) -> Self {
        Self {
            steps: vec![
                DeleteStep::new(Table::Task, Filter::eq("collection_id", collection_id)),
                DeleteStep::new(Table::Note, Filter::eq("collection_id", collection_id)),
                DeleteStep::new(Table::Collection, Filter::eq("id", collection_id)),
            ],
        }
    }

    /// Everything under a list, then the list row.
    pub fn list(list_id: &str, collection_ids: &[String]) -> Self {
        Self {
            steps: vec![
                DeleteStep::new(Table::Task, Filter::eq("list_id", list_id)),
                DeleteStep::new(Table::Task, Filter::in_list("collection_id", collection_ids.to_vec())),
                DeleteStep::new(Table::Note, Filter::in_list("collection_id", collection_ids.to_vec())),
                DeleteStep::new(Table::Collection, Filter::eq("list_id", list_id)),
                DeleteStep::new(Table::List, Filter::eq("id", list_id)),
            ],
        }
    }

    /// All rows of a user across the five tables. The auth user itself is
    /// removed by the caller after the plan has run.
    pub fn account(user_id: &str, list_ids: &[String], collection_ids: &[String]) -> Self {
        Self {
            steps: vec![
                DeleteStep::new(Table::Task, Filter::eq("user_id", user_id)),
                DeleteStep::new(Table::Task, Filter::in_list("collection_id", collection_ids.to_vec())),
                DeleteStep::new(Table::Note, Filter::in_list("collection_id", collection_ids.to_vec())),
                DeleteStep::new(Table::Collection, Filter::in_list("list_id", list_ids.to_vec())),
                DeleteStep::new(Table::List, Filter::eq("user_id", user_id)),
                DeleteStep::new(Table::Users, Filter::eq("id", user_id)),
            ],
        }
    }

    pub fn steps(&self) -> &[DeleteStep] {
        &self.steps
    }

    /// Steps that actually touch rows.
    pub fn effective_steps(&self) -> impl Iterator<Item = &DeleteStep> {
        self.steps.iter().filter(|s| !s.is_noop())
    }
}
