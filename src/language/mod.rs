// Types representing the ChalkTalk and TexTalk languages

mod document;
mod error;
mod expression;
mod structure;

// Re-export all public symbols
pub use document::*;
pub use error::*;
pub use expression::*;
pub use structure::*;
