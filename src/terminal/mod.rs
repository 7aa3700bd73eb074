mod geometry;
mod resize;

pub use geometry::{GeometryAdapter, TerminalGeometry};
pub use resize::ResizeWatcher;
