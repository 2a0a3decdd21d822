pub mod dashboard;
pub mod favorites;
pub mod files;
pub mod folders;
pub mod images;
pub mod items;
pub mod links;
pub mod metrics;
pub mod notes;
pub mod pdfs;
pub mod users;

pub use dashboard::*;
pub use favorites::*;
pub use files::*;
pub use folders::*;
pub use images::*;
pub use items::*;
pub use links::*;
pub use self::metrics::*;
pub use notes::*;
pub use pdfs::*;
pub use users::*;
