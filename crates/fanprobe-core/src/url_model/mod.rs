//! URL modeling: scheme defaulting, host/port extraction and address formatting.

mod scheme;
mod target;

pub use scheme::add_scheme;
pub use target::{ip_port_string, Scheme, Target};
