pub mod document;
pub mod text;
pub mod util;
