pub mod cache;
pub mod dynamic;
pub mod extract;
pub mod file_scanner;
pub mod locales;
pub mod parsers;
pub mod placeholders;
pub mod reference;
pub mod sync;
pub mod validator;
