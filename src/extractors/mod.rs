//! Request extractors.

pub mod json_body;
pub mod return_type;

pub use json_body::JsonBody;
pub use return_type::{ResponseFormat, ReturnType};
