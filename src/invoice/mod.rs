pub mod engine;
pub mod materializer;
pub mod render;
pub mod workflow;
