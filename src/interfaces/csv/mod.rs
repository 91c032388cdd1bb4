pub mod cart_reader;
pub mod cart_writer;

pub use cart_reader::{CartLine, CartReader};
pub use cart_writer::CartWriter;
