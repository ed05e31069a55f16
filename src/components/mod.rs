pub mod collection_panel;
pub mod color_picker;
pub mod list_card;
pub mod modal;
pub mod navbar;
pub mod note_card;
pub mod sidebar;
pub mod task_item;
pub mod ui;
