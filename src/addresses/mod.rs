pub mod error;
pub mod log_parser;
pub mod validator;
