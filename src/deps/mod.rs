//! Dependency tracking.
//!
//! | Type                | Role                                                   |
//! |---------------------|--------------------------------------------------------|
//! | `DependencySet`     | sorted dependency paths plus an "unresolved" sentinel  |
//! | `DependencyGraph`   | forward and reverse lookup between resources and deps |
//! | `DependencyTracker` | the persisted map, saved when dropped                  |

mod graph;
mod set;
mod tracker;

pub use graph::DependencyGraph;
pub use set::DependencySet;
pub use tracker::DependencyTracker;
