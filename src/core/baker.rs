use crate::core::color_sampler::TriangleColorSampler;
use crate::core::mesh_flattener::flatten_mesh;
use crate::core::texel_triangle::TexelTriangle;
use crate::io::bake_settings::BakeSettings;
use crate::material_system::color::Color;
use crate::material_system::materials::{Material, MeshSource, ModelData, SubMesh};
use crate::material_system::texture::{Texture, TextureSampler};
use log::{Level, debug, error, info, log_enabled};
use nalgebra::{Point3, Vector2};
use rayon::prelude::*;
use std::time::Instant;

/// 烘焙结果：逐三角形纯色的展开网格
#[derive(Debug, Clone)]
pub struct ColoredMesh {
    pub name: String,
    pub positions: Vec<Point3<f32>>,
    pub indices: Vec<u32>,
    /// 每个顶点一个颜色，同一三角形的三个顶点颜色相同
    pub colors: Vec<Color>,
    /// 渲染该网格所用的无光照顶点色材质名
    pub material_name: String,
}

impl ColoredMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// 整个模型的烘焙报告
#[derive(Debug, Default)]
pub struct BakeReport {
    pub baked: Vec<ColoredMesh>,
    /// (网格名, 错误信息)
    pub failures: Vec<(String, String)>,
}

impl BakeReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 网格烘焙器：校验输入、展开顶点并为每个三角形采样平均颜色
#[derive(Debug, Clone)]
pub struct MeshBaker {
    pub sampler: TriangleColorSampler,
    pub use_multithreading: bool,
    pub unlit_material: String,
}

impl MeshBaker {
    pub fn new(sampler: TriangleColorSampler, unlit_material: &str) -> Self {
        MeshBaker {
            sampler,
            use_multithreading: true,
            unlit_material: unlit_material.to_string(),
        }
    }

    pub fn from_settings(settings: &BakeSettings) -> Self {
        let mut baker = Self::new(
            TriangleColorSampler::new(settings.max_tessellation_steps),
            &settings.unlit_material,
        );
        baker.use_multithreading = settings.use_multithreading;
        baker
    }

    /// 烘焙模型中的所有网格
    ///
    /// 单个网格失败只会中止该网格，其余网格照常烘焙。
    pub fn bake_model(&self, model: &ModelData) -> BakeReport {
        let start = Instant::now();
        let mut report = BakeReport::default();

        for mesh in &model.meshes {
            match self.bake_mesh(mesh, &model.materials) {
                Ok(colored) => report.baked.push(colored),
                Err(e) => {
                    error!("网格 '{}' 烘焙失败: {}", mesh.name(), e);
                    report.failures.push((mesh.name().to_string(), e));
                }
            }
        }

        info!(
            "模型 '{}' 烘焙完成: {} 个成功, {} 个失败, 耗时 {:?}",
            model.name,
            report.baked.len(),
            report.failures.len(),
            start.elapsed()
        );
        report
    }

    /// 烘焙单个网格，输入不合法时返回带网格/子网格上下文的错误，不产生部分结果
    pub fn bake_mesh<M>(&self, mesh: &M, materials: &[Material]) -> Result<ColoredMesh, String>
    where
        M: MeshSource + ?Sized,
    {
        let start = Instant::now();
        let name = mesh.name();
        let positions = mesh.positions();
        let texcoords = mesh.texcoords();
        let indices = mesh.indices();

        if texcoords.len() != positions.len() {
            return Err(format!(
                "网格 '{}' 的纹理坐标数量 ({}) 与顶点数量 ({}) 不一致",
                name,
                texcoords.len(),
                positions.len()
            ));
        }

        let flat = flatten_mesh(positions, indices).map_err(|e| format!("网格 '{}': {}", name, e))?;
        validate_submeshes(name, mesh.submeshes(), indices.len())?;

        let mut colors = Vec::with_capacity(flat.positions.len());
        for (submesh_index, submesh) in mesh.submeshes().iter().enumerate() {
            let texture = submesh_texture(name, submesh_index, submesh, materials)?;
            let submesh_indices = &indices[submesh.index_range()];
            let triangle_colors = self.sample_submesh(texture, texcoords, submesh_indices);

            if log_enabled!(Level::Debug) {
                // 退化三角形照常采样，这里只做统计
                let degenerate = submesh_indices
                    .chunks_exact(3)
                    .map(|tri| texel_triangle(texture, texcoords, tri))
                    .filter(|t| t.area() == 0.0)
                    .count();
                debug!(
                    "网格 '{}' 子网格 {}: {} 个三角形 ({} 个退化), 纹理 {}x{}",
                    name,
                    submesh_index,
                    triangle_colors.len(),
                    degenerate,
                    texture.width(),
                    texture.height()
                );
            }

            for color in triangle_colors {
                colors.extend_from_slice(&[color; 3]);
            }
        }

        info!(
            "网格 '{}' 烘焙完成: {} 个三角形, {} 个顶点, 耗时 {:?}",
            name,
            flat.triangle_count(),
            flat.positions.len(),
            start.elapsed()
        );

        Ok(ColoredMesh {
            name: name.to_string(),
            positions: flat.positions,
            indices: flat.indices,
            colors,
            material_name: self.unlit_material.clone(),
        })
    }

    /// 为一段三角形索引逐个采样平均颜色，结果顺序与三角形顺序一致
    fn sample_submesh<T>(&self, texture: &T, texcoords: &[Vector2<f32>], indices: &[u32]) -> Vec<Color>
    where
        T: TextureSampler + Sync + ?Sized,
    {
        let sample = |tri: &[u32]| {
            let triangle = texel_triangle(texture, texcoords, tri);
            self.sampler.estimate_average_color(texture, &triangle)
        };

        if self.use_multithreading {
            indices.par_chunks_exact(3).map(sample).collect()
        } else {
            indices.chunks_exact(3).map(sample).collect()
        }
    }
}

/// 将三角形的 UV 按纹理尺寸映射到纹素空间
fn texel_triangle<T>(texture: &T, texcoords: &[Vector2<f32>], tri: &[u32]) -> TexelTriangle
where
    T: TextureSampler + ?Sized,
{
    let uvs = [
        texcoords[tri[0] as usize],
        texcoords[tri[1] as usize],
        texcoords[tri[2] as usize],
    ];
    TexelTriangle::from_uvs(&uvs, texture.width(), texture.height())
}

/// 子网格必须从0开始首尾相接、按三角形对齐，并恰好覆盖全部索引
fn validate_submeshes(name: &str, submeshes: &[SubMesh], index_count: usize) -> Result<(), String> {
    if submeshes.is_empty() && index_count > 0 {
        return Err(format!("网格 '{}' 没有子网格，无法确定材质", name));
    }

    let mut expected_start = 0;
    for (i, submesh) in submeshes.iter().enumerate() {
        if submesh.index_start != expected_start {
            return Err(format!(
                "网格 '{}' 子网格 {} 起始索引为 {}，应为 {}",
                name, i, submesh.index_start, expected_start
            ));
        }
        if submesh.index_count % 3 != 0 {
            return Err(format!(
                "网格 '{}' 子网格 {} 的索引数量 {} 不是3的倍数",
                name, i, submesh.index_count
            ));
        }
        expected_start = expected_start
            .checked_add(submesh.index_count)
            .ok_or_else(|| {
                format!(
                    "网格 '{}' 子网格 {} 的索引数量 {} 超出范围",
                    name, i, submesh.index_count
                )
            })?;
    }

    if expected_start != index_count {
        return Err(format!(
            "网格 '{}' 的子网格共覆盖 {} 个索引，但网格有 {} 个",
            name, expected_start, index_count
        ));
    }
    Ok(())
}

fn submesh_texture<'a>(
    name: &str,
    submesh_index: usize,
    submesh: &SubMesh,
    materials: &'a [Material],
) -> Result<&'a Texture, String> {
    let material_id = submesh.material_id.ok_or_else(|| {
        format!("网格 '{}' 子网格 {} 没有材质", name, submesh_index)
    })?;
    let material = materials.get(material_id).ok_or_else(|| {
        format!(
            "网格 '{}' 子网格 {} 引用了不存在的材质 {}",
            name, submesh_index, material_id
        )
    })?;
    let texture = material.texture.as_ref().ok_or_else(|| {
        format!(
            "网格 '{}' 子网格 {} 的材质 '{}' 没有二维纹理",
            name, submesh_index, material.name
        )
    })?;

    if texture.width() == 0 || texture.height() == 0 {
        return Err(format!(
            "网格 '{}' 子网格 {} 的材质 '{}' 纹理尺寸为 {}x{}",
            name,
            submesh_index,
            material.name,
            texture.width(),
            texture.height()
        ));
    }
    Ok(texture)
}
