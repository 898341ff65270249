//! Topic tree model of MMD mind maps with its parser and writer.
//!
//! ```
//! use mindmap_engine::{ExtraKind, MindMap};
//!
//! let mut map = MindMap::parse("---\n# Plans\n## Garden\n").unwrap();
//! let root = map.root();
//! let garden = map.topic(root).unwrap().children()[0];
//!
//! let link = map.make_link_to(garden).unwrap();
//! map.set_extra(root, link).unwrap();
//!
//! let reread = MindMap::parse(&map.write()).unwrap();
//! assert!(reread.content_eq(&map));
//! assert_eq!(reread.find_all_topics_for_extra_kind(ExtraKind::Topic).len(), 1);
//! ```

pub mod io;
pub mod models;
pub mod parsing;
pub mod writing;

// Re-export key types for easier usage
pub use models::*;
pub use parsing::{ParseError, parse_map};
pub use writing::{WriteOptions, write_map};
