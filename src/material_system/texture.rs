use crate::material_system::color::{Color, from_rgba8};
use image::RgbaImage;
use log::warn;
use std::path::Path;
use std::sync::Arc;

/// 可按整数纹素坐标读取的二维纹理
///
/// 采样核心只依赖这个接口，不关心纹理来自图像文件还是纯色。
/// 坐标可能越界，越界时如何寻址由实现自行决定。
pub trait TextureSampler {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn get_pixel(&self, x: i32, y: i32) -> Color;
}

/// 纹素坐标越界时的寻址方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressMode {
    /// 平铺，坐标对尺寸取模
    #[default]
    Repeat,
    /// 截断到边缘纹素
    Clamp,
}

impl AddressMode {
    pub fn from_name(name: &str) -> Result<Self, String> {
        match name.to_lowercase().as_str() {
            "repeat" => Ok(AddressMode::Repeat),
            "clamp" => Ok(AddressMode::Clamp),
            _ => Err(format!("未知的纹理寻址方式: {}", name)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AddressMode::Repeat => "repeat",
            AddressMode::Clamp => "clamp",
        }
    }

    fn resolve(&self, coord: i32, size: u32) -> u32 {
        let size = size.max(1) as i32;
        match self {
            AddressMode::Repeat => coord.rem_euclid(size) as u32,
            AddressMode::Clamp => coord.clamp(0, size - 1) as u32,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TextureData {
    Image(Arc<RgbaImage>),
    SolidColor(Color),
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub data: TextureData,
    pub width: u32,
    pub height: u32,
    pub address_mode: AddressMode,
    /// 为 true 时纹素 y = 0 对应图像最底一行（UV 原点在左下角）
    pub flip_v: bool,
}

impl Texture {
    pub fn from_image(img: RgbaImage) -> Self {
        Texture {
            width: img.width(),
            height: img.height(),
            data: TextureData::Image(Arc::new(img)),
            address_mode: AddressMode::default(),
            flip_v: true,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Option<Self> {
        match image::open(path.as_ref()) {
            Ok(img) => Some(Self::from_image(img.to_rgba8())),
            Err(e) => {
                warn!("无法加载纹理 {:?}: {}", path.as_ref(), e);
                None
            }
        }
    }

    pub fn solid_color(color: Color) -> Self {
        Texture {
            data: TextureData::SolidColor(color),
            width: 1,
            height: 1,
            address_mode: AddressMode::default(),
            flip_v: true,
        }
    }

    pub fn with_sampling(mut self, address_mode: AddressMode, flip_v: bool) -> Self {
        self.address_mode = address_mode;
        self.flip_v = flip_v;
        self
    }

    pub fn get_type_description(&self) -> &'static str {
        match &self.data {
            TextureData::Image(_) => "图像纹理",
            TextureData::SolidColor(_) => "单色纹理",
        }
    }
}

impl TextureSampler for Texture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get_pixel(&self, x: i32, y: i32) -> Color {
        match &self.data {
            TextureData::Image(img) => {
                let px = self.address_mode.resolve(x, self.width);
                let mut py = self.address_mode.resolve(y, self.height);
                if self.flip_v {
                    py = self.height - 1 - py;
                }
                from_rgba8(img.get_pixel(px, py).0)
            }
            TextureData::SolidColor(color) => *color,
        }
    }
}

/// 加载纹理，失败时返回 None 并记录警告
pub fn load_texture<P: AsRef<Path>>(
    path: P,
    address_mode: AddressMode,
    flip_v: bool,
) -> Option<Texture> {
    Texture::from_file(path).map(|t| t.with_sampling(address_mode, flip_v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material_system::color::rgba;
    use image::Rgba;

    fn checker() -> Texture {
        // 图像第0行: 红 绿；第1行: 蓝 白
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        Texture::from_image(img)
    }

    #[test]
    fn flip_v_reads_bottom_row_first() {
        let tex = checker();
        assert_eq!(tex.get_pixel(0, 0), rgba(0.0, 0.0, 1.0, 1.0));
        assert_eq!(tex.get_pixel(1, 1), rgba(0.0, 1.0, 0.0, 1.0));

        let tex = checker().with_sampling(AddressMode::Repeat, false);
        assert_eq!(tex.get_pixel(0, 0), rgba(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn repeat_wraps_and_clamp_saturates() {
        let tex = checker().with_sampling(AddressMode::Repeat, false);
        assert_eq!(tex.get_pixel(2, 0), tex.get_pixel(0, 0));
        assert_eq!(tex.get_pixel(-1, 0), tex.get_pixel(1, 0));

        let tex = checker().with_sampling(AddressMode::Clamp, false);
        assert_eq!(tex.get_pixel(5, 0), tex.get_pixel(1, 0));
        assert_eq!(tex.get_pixel(-3, 1), tex.get_pixel(0, 1));
    }

    #[test]
    fn solid_color_ignores_coordinates() {
        let color = rgba(0.2, 0.4, 0.6, 1.0);
        let tex = Texture::solid_color(color);
        assert_eq!(tex.width(), 1);
        assert_eq!(tex.get_pixel(-7, 42), color);
    }

    #[test]
    fn address_mode_names_round_trip() {
        for mode in [AddressMode::Repeat, AddressMode::Clamp] {
            assert_eq!(AddressMode::from_name(mode.name()).unwrap(), mode);
        }
        assert!(AddressMode::from_name("mirror").is_err());
    }
}
