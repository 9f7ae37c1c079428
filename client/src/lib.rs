mod app;
pub mod brush;
pub mod canvas;
pub mod coords;
mod cursor;
mod dom;
pub mod images;
mod net;
pub mod presence;
pub mod replicate;
pub mod state;
pub mod votes;

pub use app::run;
