pub mod png;
pub mod renderer;
pub mod svg;
