use std::collections::HashSet;

use leptos::prelude::*;

/// Ids of records with a write in flight. A second click on the same record
/// is dropped until the first write settles.
#[derive(Clone, Copy)]
pub(crate) struct InFlight(RwSignal<HashSet<String>>);

impl InFlight {
    pub fn new() -> Self {
        Self(RwSignal::new(HashSet::new()))
    }

    /// `false` when `id` is already busy.
    pub fn begin(self, id: &str) -> bool {
        let mut started = false;
        self.0.update(|ids| started = ids.insert(id.to_string()));
        started
    }

    pub fn finish(self, id: &str) {
        self.0.update(|ids| {
            ids.remove(id);
        });
    }

    /// Tracked, so buttons can disable themselves.
    pub fn contains(self, id: &str) -> bool {
        self.0.with(|ids| ids.contains(id))
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_on_same_id_is_refused() {
        let owner = Owner::new();
        owner.with(|| {
            let busy = InFlight::new();
            assert!(busy.begin("n1"));
            assert!(!busy.begin("n1"));
            assert!(busy.begin("n2"));
            assert!(busy.contains("n1"));

            busy.finish("n1");
            assert!(!busy.contains("n1"));
            assert!(busy.begin("n1"));
        });
    }
}
