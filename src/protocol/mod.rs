//! Provider wire protocol: building requests from catalog data and reading
//! the responses back into outcomes.

pub mod extract;
pub mod interpret;
pub mod request;

pub use interpret::{interpret_check, interpret_clicks, interpret_create, transport_failure, RawResponse};
pub use request::{build_check, build_clicks, build_create};
