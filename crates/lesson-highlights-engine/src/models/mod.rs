pub mod collection;
pub mod highlight;

pub use collection::*;
pub use highlight::*;
