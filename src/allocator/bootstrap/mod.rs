pub mod arena;

pub use arena::ReservedArena;
