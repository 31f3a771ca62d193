pub mod store;
pub mod sweeper;

pub use store::PronounCache;
pub use sweeper::CacheSweeper;
