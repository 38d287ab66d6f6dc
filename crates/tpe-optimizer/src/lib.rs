pub mod space;
pub mod tpe;

pub use space::{Dimension, SearchSpace};
pub use tpe::{minimize, Trial};
