//! Create/edit/delete dialogs. Each one validates locally, makes a single
//! backend write, hands the persisted record to its caller and closes; a
//! backend error keeps it open with the message inline.

mod collection;
mod delete_account;
mod delete_collection;
mod list;
mod note;

pub use collection::CollectionPopup;
pub use delete_account::DeleteAccountPopup;
pub use delete_collection::DeleteCollectionPopup;
pub use list::ListPopup;
pub use note::NotePopup;
