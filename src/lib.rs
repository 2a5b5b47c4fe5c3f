pub mod agents;
pub mod components;
pub mod objects;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub mod test;
