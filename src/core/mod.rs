pub mod baker;
pub mod color_sampler;
pub mod mesh_flattener;
pub mod texel_triangle;
