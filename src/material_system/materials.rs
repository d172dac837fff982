use crate::material_system::color::{Color, rgba};
use crate::material_system::texture::Texture;
use nalgebra::{Point3, Vector2};

/// 表示材质属性，烘焙只关心其漫反射纹理
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub texture: Option<Texture>,
    /// MTL 中的 Kd，纹理缺失时可作为回退颜色
    pub diffuse: Color,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Material {
            name: name.to_string(),
            texture: None,
            diffuse: rgba(0.8, 0.8, 0.8, 1.0),
        }
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }
}

/// 子网格：共享同一材质的一段连续三角形索引
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMesh {
    /// 在网格索引列表中的起始位置
    pub index_start: usize,
    pub index_count: usize,
    pub material_id: Option<usize>,
}

impl SubMesh {
    pub fn index_range(&self) -> std::ops::Range<usize> {
        self.index_start..self.index_start + self.index_count
    }
}

/// 烘焙核心读取网格所需的最小接口
pub trait MeshSource {
    fn name(&self) -> &str;
    fn positions(&self) -> &[Point3<f32>];
    fn texcoords(&self) -> &[Vector2<f32>];
    fn indices(&self) -> &[u32];
    fn submeshes(&self) -> &[SubMesh];
}

/// 带共享顶点的输入网格
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Point3<f32>>,
    pub texcoords: Vec<Vector2<f32>>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
}

impl Mesh {
    /// 追加一段几何并登记为新的子网格，索引会按已有顶点数偏移
    pub fn append_submesh(
        &mut self,
        positions: &[Point3<f32>],
        texcoords: &[Vector2<f32>],
        indices: &[u32],
        material_id: Option<usize>,
    ) {
        let base = self.positions.len() as u32;
        let index_start = self.indices.len();

        self.positions.extend_from_slice(positions);
        self.texcoords.extend_from_slice(texcoords);
        self.indices.extend(indices.iter().map(|&i| i + base));
        self.submeshes.push(SubMesh {
            index_start,
            index_count: indices.len(),
            material_id,
        });
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl MeshSource for Mesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    fn texcoords(&self) -> &[Vector2<f32>] {
        &self.texcoords
    }

    fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }
}

#[derive(Debug, Clone)]
pub struct ModelData {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_submesh_offsets_indices_and_ranges() {
        let mut mesh = Mesh {
            name: "quad".to_string(),
            ..Default::default()
        };
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let texcoords = [Vector2::zeros(); 3];

        mesh.append_submesh(&positions, &texcoords, &[0, 1, 2], Some(0));
        mesh.append_submesh(&positions, &texcoords, &[2, 1, 0], Some(1));

        assert_eq!(mesh.indices, vec![0, 1, 2, 5, 4, 3]);
        assert_eq!(mesh.submeshes[1].index_range(), 3..6);
        assert_eq!(mesh.submeshes[1].material_id, Some(1));
        assert_eq!(mesh.triangle_count(), 2);
    }
}
