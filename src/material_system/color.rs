use nalgebra::Vector4;

/// RGBA颜色，各通道为 [0.0, 1.0] 范围内的浮点数
pub type Color = Vector4<f32>;

/// 由 RGBA 通道构造颜色
pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Color {
    Color::new(r, g, b, a)
}

/// 由 8 位 RGBA 像素构造颜色
pub fn from_rgba8(pixel: [u8; 4]) -> Color {
    Color::new(
        pixel[0] as f32 / 255.0,
        pixel[1] as f32 / 255.0,
        pixel[2] as f32 / 255.0,
        pixel[3] as f32 / 255.0,
    )
}

/// 将颜色转换为 8 位 RGBA，超出范围的通道会被截断
pub fn to_rgba8(color: &Color) -> [u8; 4] {
    [
        channel_to_u8(color.x),
        channel_to_u8(color.y),
        channel_to_u8(color.z),
        channel_to_u8(color.w),
    ]
}

fn channel_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_conversion_clamps_out_of_range_channels() {
        let color = rgba(1.5, -0.2, 0.5, 1.0);
        assert_eq!(to_rgba8(&color), [255, 0, 128, 255]);
    }

    #[test]
    fn from_rgba8_maps_full_range() {
        let color = from_rgba8([255, 0, 0, 255]);
        assert_eq!(color, rgba(1.0, 0.0, 0.0, 1.0));
    }
}
