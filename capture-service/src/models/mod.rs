pub mod document;
pub mod item;
pub mod party;

pub use document::{Document, DocumentFields, DocumentKind, DocumentStatus};
pub use item::{Item, ItemDraft};
pub use party::{Party, PartyRole};
