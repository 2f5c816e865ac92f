pub mod input_types;
pub mod output_types;
pub mod interface;
pub mod agent_factory;
pub mod transformers;
pub mod backend;
pub mod demo;
pub mod openai_compatible;
pub mod tools;

#[cfg(test)]
pub mod testing;

pub use input_types::*;
pub use output_types::*;
pub use interface::*;
pub use agent_factory::*;
pub use backend::*;
