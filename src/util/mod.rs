//! Shared utilities: interval-string parsing for the `agg` command and
//! feed-URL validation for `addfeed`.

mod duration;
mod url_validator;

pub use duration::{parse_duration, DurationError};
pub use url_validator::{validate_url, UrlValidationError};
