pub mod builtin;
pub mod function;
pub mod schema;
pub mod serializer;
pub mod traits;

pub use function::FunctionTool;
pub use schema::{Attribute, ParamShape, ParamType};
pub use serializer::ToolSerialization;
pub use traits::Tool;
