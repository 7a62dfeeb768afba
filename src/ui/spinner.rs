use std::fmt::{Display, Formatter};

/// The static loading indicator.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Spinner;

impl Display for Spinner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Loading...")
    }
}
