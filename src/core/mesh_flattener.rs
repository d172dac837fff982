use nalgebra::Point3;

/// 展开后的网格：三角形之间不再共享顶点
#[derive(Debug, Clone, Default)]
pub struct FlatMesh {
    pub positions: Vec<Point3<f32>>,
    pub indices: Vec<u32>,
}

impl FlatMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// 复制每个三角形的三个顶点，并按顺序重新编号
///
/// 第 i 个三角形拥有顶点 3i, 3i+1, 3i+2，位置按原索引顺序拷贝，几何不变。
pub fn flatten_mesh(positions: &[Point3<f32>], indices: &[u32]) -> Result<FlatMesh, String> {
    if indices.len() % 3 != 0 {
        return Err(format!(
            "三角形索引数量必须是3的倍数，实际为 {}",
            indices.len()
        ));
    }

    let mut flat_positions = Vec::with_capacity(indices.len());
    for (i, &index) in indices.iter().enumerate() {
        let position = positions.get(index as usize).ok_or_else(|| {
            format!(
                "三角形 {} 引用了越界的顶点索引 {} (顶点数 {})",
                i / 3,
                index,
                positions.len()
            )
        })?;
        flat_positions.push(*position);
    }

    Ok(FlatMesh {
        positions: flat_positions,
        indices: (0..indices.len() as u32).collect(),
    })
}
