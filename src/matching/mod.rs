pub mod expansion;
pub mod matcher;
pub mod signature;

pub use expansion::{expand, expand_with_errors, PatternLibrary};
pub use matcher::{get_substitutions, validate_pattern, MatchResult, OperatorPattern};
pub use signature::{find_all_signatures, signature_of};
