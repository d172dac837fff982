use crate::core::texel_triangle::{Texel, TexelTriangle};
use crate::material_system::color::Color;
use crate::material_system::texture::TextureSampler;
use nalgebra::Vector4;
use std::collections::HashSet;

/// 默认细分层数：3 层共 3 + 9 + 27 个子三角形重心
pub const DEFAULT_TESSELLATION_STEPS: u32 = 3;

/// 允许配置的最大细分层数，超过后采样数按 3^n 膨胀
pub const MAX_TESSELLATION_STEPS: u32 = 8;

/// 三角形平均颜色采样器
///
/// 对三角形在纹素空间中的覆盖区域做递归重心采样：先取三个顶点和重心，
/// 再反复以重心为扇心把每个三角形一分为三并采样子三角形重心。
/// 采样点数只取决于细分层数，与三角形覆盖的纹素面积无关。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleColorSampler {
    max_tessellation_steps: u32,
}

impl Default for TriangleColorSampler {
    fn default() -> Self {
        Self::new(DEFAULT_TESSELLATION_STEPS)
    }
}

impl TriangleColorSampler {
    pub fn new(max_tessellation_steps: u32) -> Self {
        TriangleColorSampler {
            max_tessellation_steps,
        }
    }

    /// 去重前的采样点总数：4 + 3 + 9 + ... + 3^steps
    pub fn max_sample_count(&self) -> usize {
        4 + (1..=self.max_tessellation_steps)
            .map(|step| 3usize.pow(step))
            .sum::<usize>()
    }

    /// 收集三角形的采样纹素，按首次出现的顺序去重
    pub fn collect_texels(&self, triangle: &TexelTriangle) -> Vec<Texel> {
        let mut seen = HashSet::with_capacity(self.max_sample_count());
        let mut unique = Vec::with_capacity(self.max_sample_count());
        let mut push = |texel: Texel| {
            if seen.insert(texel) {
                unique.push(texel);
            }
        };

        for texel in triangle.vertex_texels() {
            push(texel);
        }
        push(triangle.centroid_texel());

        let mut current = vec![*triangle];
        for _ in 0..self.max_tessellation_steps {
            let mut next = Vec::with_capacity(current.len() * 3);
            for tri in &current {
                for child in tri.tessellate() {
                    push(child.centroid_texel());
                    next.push(child);
                }
            }
            current = next;
        }

        unique
    }

    /// 估算三角形覆盖区域的平均颜色
    ///
    /// 每个不重复的纹素权重相同（不按面积加权）。累加在 f64 中进行，
    /// 因此单色纹理返回的颜色与纹素颜色逐位相同。
    pub fn estimate_average_color<T>(&self, texture: &T, triangle: &TexelTriangle) -> Color
    where
        T: TextureSampler + ?Sized,
    {
        let texels = self.collect_texels(triangle);

        let sum = texels
            .iter()
            .fold(Vector4::<f64>::zeros(), |acc, texel| {
                acc + texture.get_pixel(texel.x, texel.y).cast::<f64>()
            });

        // 至少包含三个顶点纹素，不会为空
        (sum / texels.len() as f64).cast::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material_system::color::rgba;
    use nalgebra::{Point2, Vector2};

    /// 测试用的网格纹理，越界时截断到边缘
    struct GridTexture {
        width: u32,
        height: u32,
        pixels: Vec<Color>,
    }

    impl GridTexture {
        fn filled(width: u32, height: u32, color: Color) -> Self {
            GridTexture {
                width,
                height,
                pixels: vec![color; (width * height) as usize],
            }
        }

        fn set(&mut self, x: u32, y: u32, color: Color) {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    impl TextureSampler for GridTexture {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn get_pixel(&self, x: i32, y: i32) -> Color {
            let x = x.clamp(0, self.width as i32 - 1) as u32;
            let y = y.clamp(0, self.height as i32 - 1) as u32;
            self.pixels[(y * self.width + x) as usize]
        }
    }

    fn tri(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> TexelTriangle {
        TexelTriangle::new(
            Point2::new(a.0, a.1),
            Point2::new(b.0, b.1),
            Point2::new(c.0, c.1),
        )
    }

    /// 独立的参考实现：显式递归枚举全部采样点，再去重
    fn reference_samples(triangle: &TexelTriangle, steps: u32) -> Vec<Texel> {
        fn recurse(t: &TexelTriangle, depth: u32, out: &mut Vec<Texel>) {
            if depth == 0 {
                return;
            }
            let children = t.tessellate();
            for child in &children {
                out.push(child.centroid_texel());
            }
            for child in &children {
                recurse(child, depth - 1, out);
            }
        }

        let mut all = triangle.vertex_texels().to_vec();
        all.push(triangle.centroid_texel());
        recurse(triangle, steps, &mut all);

        let mut unique: Vec<Texel> = Vec::new();
        for texel in all {
            if !unique.contains(&texel) {
                unique.push(texel);
            }
        }
        unique
    }

    #[test]
    fn max_sample_count_grows_by_powers_of_three() {
        assert_eq!(TriangleColorSampler::new(0).max_sample_count(), 4);
        assert_eq!(TriangleColorSampler::new(1).max_sample_count(), 7);
        assert_eq!(TriangleColorSampler::default().max_sample_count(), 43);
    }

    #[test]
    fn large_triangle_uses_every_sample_at_default_depth() {
        let sampler = TriangleColorSampler::default();
        let t = tri((0.0, 0.0), (4096.0, 0.0), (0.0, 4096.0));
        assert_eq!(sampler.collect_texels(&t).len(), 43);
    }

    #[test]
    fn unique_samples_never_exceed_budget() {
        let sampler = TriangleColorSampler::default();
        for t in [
            tri((0.0, 0.0), (2.0, 0.0), (0.0, 2.0)),
            tri((10.3, 4.7), (80.1, 12.9), (33.3, 99.9)),
            tri((5.0, 5.0), (5.2, 5.1), (4.9, 5.3)),
        ] {
            let texels = sampler.collect_texels(&t);
            assert!(texels.len() <= sampler.max_sample_count());
            let unique: HashSet<_> = texels.iter().collect();
            assert_eq!(unique.len(), texels.len());
        }
    }

    #[test]
    fn collected_texels_match_reference_enumeration() {
        for steps in 0..=4 {
            let sampler = TriangleColorSampler::new(steps);
            let t = tri((1.7, 2.2), (30.4, 5.9), (12.5, 40.1));
            let collected = sampler.collect_texels(&t);
            let reference = reference_samples(&t, steps);
            // 参考实现按深度优先遍历，只比较集合
            assert_eq!(collected.len(), reference.len());
            assert_eq!(
                collected.into_iter().collect::<HashSet<_>>(),
                reference.into_iter().collect::<HashSet<_>>()
            );
        }
    }

    #[test]
    fn uniform_texture_returns_exact_color() {
        let color = rgba(0.1, 0.7, 0.3, 0.9);
        let texture = GridTexture::filled(16, 16, color);
        let sampler = TriangleColorSampler::default();

        for t in [
            tri((0.0, 0.0), (15.0, 0.0), (0.0, 15.0)),
            tri((3.3, 1.1), (12.8, 9.4), (6.6, 14.2)),
        ] {
            assert_eq!(sampler.estimate_average_color(&texture, &t), color);
        }
    }

    #[test]
    fn degenerate_triangle_in_one_texel_returns_that_texel() {
        let mut texture = GridTexture::filled(8, 8, rgba(0.0, 0.0, 0.0, 1.0));
        let target = rgba(0.25, 0.5, 0.75, 1.0);
        texture.set(3, 4, target);

        let sampler = TriangleColorSampler::default();
        let t = tri((3.1, 4.2), (2.9, 3.8), (3.2, 4.1));
        assert_eq!(sampler.collect_texels(&t), vec![Texel::new(3, 4)]);
        assert_eq!(sampler.estimate_average_color(&texture, &t), target);

        // 共线的零面积三角形照常采样
        let line = tri((3.0, 4.0), (3.0, 4.0), (3.0, 4.0));
        assert_eq!(line.area(), 0.0);
        assert_eq!(sampler.estimate_average_color(&texture, &line), target);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let mut texture = GridTexture::filled(32, 32, rgba(0.3, 0.3, 0.3, 1.0));
        for i in 0..32 {
            texture.set(i, (i * 7) % 32, rgba(i as f32 / 31.0, 0.1, 0.9, 1.0));
        }
        let sampler = TriangleColorSampler::default();
        let t = tri((0.5, 1.5), (30.2, 4.4), (14.9, 29.7));

        let first = sampler.estimate_average_color(&texture, &t);
        for _ in 0..10 {
            let again = sampler.estimate_average_color(&texture, &t);
            assert_eq!(first.map(f32::to_bits), again.map(f32::to_bits));
        }
    }

    #[test]
    fn red_corner_blends_with_blue() {
        let red = rgba(1.0, 0.0, 0.0, 1.0);
        let blue = rgba(0.0, 0.0, 1.0, 1.0);
        let mut texture = GridTexture::filled(2, 2, blue);
        texture.set(0, 0, red);

        let uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
        ];
        let t = TexelTriangle::from_uvs(&uvs, texture.width(), texture.height());
        let sampler = TriangleColorSampler::default();
        let color = sampler.estimate_average_color(&texture, &t);

        // 参考集合：逐一统计落在红色纹素上的不重复采样
        let samples = reference_samples(&t, DEFAULT_TESSELLATION_STEPS);
        let red_count = samples
            .iter()
            .filter(|s| s.x.clamp(0, 1) == 0 && s.y.clamp(0, 1) == 0)
            .count();
        let expected_red = red_count as f32 / samples.len() as f32;

        assert!((color.x - expected_red).abs() < 1e-6);
        assert!((color.z - (1.0 - expected_red)).abs() < 1e-6);
        assert_eq!(color.y, 0.0);
        assert_eq!(color.w, 1.0);
        // 同时包含红色与蓝色
        assert!(color.x > 0.0 && color.z > 0.0);
    }
}
