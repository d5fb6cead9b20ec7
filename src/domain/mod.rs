pub mod effective;
pub mod result;
pub mod scenario;
pub mod snapshot;
pub mod value;

pub use effective::*;
pub use result::*;
pub use scenario::*;
pub use snapshot::*;
pub use value::*;
