//! UI components.

pub mod dynamic_background;
