pub mod font;
pub mod survey;
