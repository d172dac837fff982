pub mod color;
pub mod materials;
pub mod texture;
