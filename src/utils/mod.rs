pub mod hash;
pub mod html;
