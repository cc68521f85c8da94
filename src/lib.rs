pub mod carousel;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod review;
pub mod texture;
pub mod render {
    pub mod cards;
    pub mod viewer;
}

pub use error::{Error, Result};
