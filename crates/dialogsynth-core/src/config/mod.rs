pub mod parser;
pub mod schema;
pub mod validator;

pub use parser::{parse_toml_file, parse_toml_str};
pub use schema::*;
pub use validator::validate_config;
