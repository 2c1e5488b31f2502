//! ChalkTalk is a language for writing formal mathematics in a shape
//! close to how it is written on paper. This crate parses ChalkTalk
//! documents, including the TexTalk expressions embedded in statements,
//! checks them, and rewrites statements into their declared written
//! forms.

pub mod language;
pub mod matching;
pub mod parsing;
pub mod problem;
pub mod regex;
pub mod validation;
