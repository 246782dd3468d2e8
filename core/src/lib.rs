//! Copy-on-write JSON values.
//!
//! A [Value] is a handle to a reference-counted payload: copying it is a reference count
//! increment, and the payload is only duplicated when a handle that shares it is mutated. Scalars
//! expose boolean, integer, float and string views, which are computed once at construction, so
//! that e.g. `Value::from("42").to_u64() == 42` and `Value::from(1.5).to_bytes() == b"1.5"`.
//!
//! ```
//! use cowjson_core::Value;
//!
//! let mut config = Value::null();
//! config["name"] = Value::from("server");
//! config["ports"].push_back(8080).unwrap();
//!
//! let snapshot = config.clone();
//! config["ports"].push_back(8081).unwrap();
//!
//! assert_eq!(snapshot["ports"].count(), 1);
//! assert_eq!(config["ports"].count(), 2);
//! assert_eq!(config["ports"][1].to_u16(), 8081);
//! ```
pub mod deserialize;
pub mod error;
mod metrics;
pub mod serialize;
pub mod shared;
pub mod value;

pub use deserialize::parse;
pub use error::{ParseError, ParseResult, ParseStatus, ValueError};
pub use serialize::{stringify, FormatFlags};
pub use shared::Shared;
pub use value::{coerce::FromValue, Kind, Value};
