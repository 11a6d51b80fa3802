mod fork;
mod process;
mod state;
mod table;

pub use self::fork::{create_from_pages, fork};
pub use self::process::{Id, Process};
pub use self::state::State;
pub use self::table::{ProcessTable, Table};
