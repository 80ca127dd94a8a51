pub mod access;
pub mod chunk;
pub mod criteria;
pub mod path;
