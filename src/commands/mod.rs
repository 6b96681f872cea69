pub mod blame;
pub mod link;
pub mod show;

pub use blame::*;
pub use link::*;
pub use show::*;
