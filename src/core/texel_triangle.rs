use nalgebra::{Point2, Vector2};

/// 纹理中的一个像素坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texel {
    pub x: i32,
    pub y: i32,
}

impl Texel {
    pub fn new(x: i32, y: i32) -> Self {
        Texel { x, y }
    }

    /// 四舍五入到最近的纹素，两个轴独立处理，恰好 .5 时取偶数
    pub fn nearest(point: &Point2<f32>) -> Self {
        Texel::new(
            point.x.round_ties_even() as i32,
            point.y.round_ties_even() as i32,
        )
    }
}

/// 纹素空间中的三角形（坐标以像素为单位，而非归一化 UV）
///
/// 构造后不可变，细分总是产生新的三角形。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexelTriangle {
    a: Point2<f32>,
    b: Point2<f32>,
    c: Point2<f32>,
    centroid: Point2<f32>,
}

impl TexelTriangle {
    pub fn new(a: Point2<f32>, b: Point2<f32>, c: Point2<f32>) -> Self {
        let centroid = Point2::from((a.coords + b.coords + c.coords) / 3.0);
        TexelTriangle { a, b, c, centroid }
    }

    /// 由 UV 坐标按纹理尺寸缩放得到纹素空间三角形
    pub fn from_uvs(uvs: &[Vector2<f32>; 3], width: u32, height: u32) -> Self {
        let scale = Vector2::new(width as f32, height as f32);
        let [a, b, c] = (*uvs).map(|uv| Point2::from(uv.component_mul(&scale)));
        Self::new(a, b, c)
    }

    pub fn vertices(&self) -> [Point2<f32>; 3] {
        [self.a, self.b, self.c]
    }

    pub fn centroid(&self) -> Point2<f32> {
        self.centroid
    }

    /// 以重心为扇心分成三个子三角形: (A,M,B), (B,M,C), (C,M,A)
    pub fn tessellate(&self) -> [TexelTriangle; 3] {
        let m = self.centroid();
        [
            TexelTriangle::new(self.a, m, self.b),
            TexelTriangle::new(self.b, m, self.c),
            TexelTriangle::new(self.c, m, self.a),
        ]
    }

    /// 面积（平方纹素）
    pub fn area(&self) -> f32 {
        (0.5 * determinant(&(self.b - self.a), &(self.c - self.a))).abs()
    }

    pub fn vertex_texels(&self) -> [Texel; 3] {
        self.vertices().map(|p| Texel::nearest(&p))
    }

    pub fn centroid_texel(&self) -> Texel {
        Texel::nearest(&self.centroid())
    }
}

/// 两个二维向量的行列式（叉积的 z 分量）
fn determinant(u: &Vector2<f32>, v: &Vector2<f32>) -> f32 {
    u.x * v.y - u.y * v.x
}
