//! UI layer for the workbench: app shell, chapter windows, palette, and
//! journal panels.

pub mod app;

pub use app::{AppPaths, WorkbenchApp};
