mod coerce;
mod field;
mod instance;
mod schema;
mod serde_schema;
mod serialize;
mod validate;
mod value;

pub use coerce::*;
pub use field::*;
pub use instance::*;
pub use schema::*;
pub use serde_schema::*;
pub use serialize::*;
pub use validate::*;
pub use value::*;
