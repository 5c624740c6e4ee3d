pub mod partner;

pub use partner::PartnerId;
