// cidtree library - catalog browsing core for the terminal browser
// Everything except `ui` is terminal-free and can be driven from tests.

pub mod build;     // external catalog rebuild
pub mod catalog;   // groups -> titles -> tabs -> items, plus the JSON decoder
pub mod config;    // settings and preferences
pub mod playback;  // play mode + external player queue
pub mod search;    // substring search with wrap-around find-next
pub mod selection; // marked CIDs
pub mod session;   // the interactive state machine
pub mod tree;      // visible-row projection and cursor

#[cfg(feature = "tui")]
pub mod ui;        // terminal interface

// Export the stuff other modules actually use
pub use catalog::{CatalogError, Hierarchy};
pub use config::Config;
pub use playback::PlayMode;
pub use session::{Action, Effect, Mode, Session};
pub use tree::{NodeId, NodeKind, VisibleNode};
