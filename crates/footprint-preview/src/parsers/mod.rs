pub mod footprint;
pub mod sexpr;
