use leptos::prelude::*;

use crate::storage::{load_flag, save_flag, SIDEBAR_OPEN_KEY};

#[derive(Clone, Copy)]
pub(crate) struct SidebarService {
    pub is_open: RwSignal<bool>,
}

impl SidebarService {
    pub fn new() -> Self {
        Self {
            is_open: RwSignal::new(load_flag(SIDEBAR_OPEN_KEY).unwrap_or(true)),
        }
    }

    pub fn toggle(self) {
        self.set(!self.is_open.get_untracked());
    }

    pub fn open(self) {
        self.set(true);
    }

    pub fn close(self) {
        self.set(false);
    }

    fn set(self, open: bool) {
        self.is_open.set(open);
        save_flag(SIDEBAR_OPEN_KEY, open);
    }
}
