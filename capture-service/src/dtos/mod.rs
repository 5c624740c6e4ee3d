pub mod documents;

pub use documents::{
    DeleteParams, DeleteResponse, StatusResponse, SubmitParams, SubmitResponse,
};
