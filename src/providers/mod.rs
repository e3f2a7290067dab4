pub mod oxr;
pub mod util;

pub use oxr::OxrClient;
