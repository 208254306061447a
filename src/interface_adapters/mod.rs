// Interface adapters: sprite table view, wire protocol and network handling.

pub mod net;
pub mod protocol;
pub mod state;
pub mod view;

pub use view::SpriteTableView;
