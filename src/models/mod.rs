pub mod dashboard;
pub mod folder;
pub mod item;
pub mod user;

pub use dashboard::*;
pub use folder::*;
pub use item::*;
pub use user::*;
