pub mod callable;
pub mod id_generator;
pub mod sink;

pub use callable::{Callable, ParamType};
pub use id_generator::IdGenerator;
pub use sink::Sink;
