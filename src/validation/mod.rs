pub mod scope;
pub mod sections;
pub mod validator;

pub use scope::check_document;
pub use sections::identify_sections;
pub use validator::validate;
