pub mod outcome;
pub mod record;

pub use outcome::{alias_of, AliasCheck, ErrorKind, Failure, ShortenOutcome};
pub use record::{ShortenRequest, ShortenedUrlRecord};
