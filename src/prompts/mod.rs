pub mod context;
pub mod custom;
pub mod extraction;
pub mod styles;
pub mod vars;
pub mod writer;
