mod help;
mod pane;
mod reader;
mod tabs;
mod worklist;

pub use help::*;
pub use pane::*;
pub use reader::*;
pub use tabs::*;
pub use worklist::*;
