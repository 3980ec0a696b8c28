pub mod adapter;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod export;
pub mod onnx;
pub mod preferences;
pub mod preprocessing;
pub mod recognition;
pub mod storage;

pub use adapter::ModelAdapter;
pub use error::{Error, Result};
