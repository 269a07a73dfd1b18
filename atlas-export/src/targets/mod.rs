//! Built-in render targets

pub mod html;
pub mod markup;
pub mod package;
pub mod pages;
pub mod text;
