mod parser;
mod reader;

pub use parser::MAX_RECURSION;

pub(crate) use parser::{bytes_to_u64, parse_children, parse_object, value_from_object};
pub(crate) use reader::object_from_reader;
