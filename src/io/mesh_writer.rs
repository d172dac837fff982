use crate::core::baker::ColoredMesh;
use crate::io::bake_settings::{BakeSettings, OutputFormat};
use crate::material_system::color::to_rgba8;
use log::{info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 将网格名转换为安全的文件名，仅保留字母、数字、'_' 和 '-'
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "mesh".to_string()
    } else {
        stem
    }
}

/// 生成本次输出中未被占用的文件名，冲突时追加 `_1`、`_2` ...
pub fn unique_file_stem(name: &str, used_stems: &mut HashSet<String>) -> String {
    let base = sanitize_file_stem(name);
    let mut stem = base.clone();
    let mut suffix = 1;
    while used_stems.contains(&stem) {
        stem = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    if stem != base {
        warn!("网格 '{}' 的文件名 '{}' 已被占用，改用 '{}'", name, base, stem);
    }
    used_stems.insert(stem.clone());
    stem
}

/// 按设置写出烘焙后的网格，返回写出的网格文件路径
///
/// `used_stems` 记录本次已写出的文件名，同名或清理后同名的网格不会互相覆盖。
pub fn save_colored_mesh(
    mesh: &ColoredMesh,
    settings: &BakeSettings,
    used_stems: &mut HashSet<String>,
) -> Result<PathBuf, String> {
    let output_dir = Path::new(&settings.output_dir);
    std::fs::create_dir_all(output_dir)
        .map_err(|e| format!("创建输出目录 '{}' 失败: {}", settings.output_dir, e))?;

    let stem = format!(
        "{}{}",
        settings.output_prefix,
        unique_file_stem(&mesh.name, used_stems)
    );
    let path = output_dir.join(format!("{}.{}", stem, settings.format.extension()));

    match settings.format {
        OutputFormat::Obj => {
            let mtl_name = if settings.write_material {
                let mtl_name = format!("{}.mtl", stem);
                write_mtl(&output_dir.join(&mtl_name), &mesh.material_name)?;
                Some(mtl_name)
            } else {
                None
            };
            write_obj(&path, mesh, mtl_name.as_deref())?;
        }
        OutputFormat::Ply => write_ply(&path, mesh)?,
    }

    info!(
        "网格 '{}' 已保存到 {} ({} 个三角形)",
        mesh.name,
        path.display(),
        mesh.triangle_count()
    );
    Ok(path)
}

fn create_writer(path: &Path) -> Result<BufWriter<File>, String> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| format!("创建文件 '{}' 失败: {}", path.display(), e))
}

fn header_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 写出带顶点色扩展的 OBJ：每个顶点一行 "v x y z r g b"
pub fn write_obj(path: &Path, mesh: &ColoredMesh, mtl_name: Option<&str>) -> Result<(), String> {
    let mut w = create_writer(path)?;
    let io_err = |e: std::io::Error| format!("写入 '{}' 失败: {}", path.display(), e);

    writeln!(w, "# texture_baker 顶点色网格 生成于 {}", header_timestamp()).map_err(io_err)?;
    writeln!(
        w,
        "# {} 个顶点, {} 个三角形",
        mesh.positions.len(),
        mesh.triangle_count()
    )
    .map_err(io_err)?;
    if let Some(mtl_name) = mtl_name {
        writeln!(w, "mtllib {}", mtl_name).map_err(io_err)?;
    }
    writeln!(w, "o {}", sanitize_file_stem(&mesh.name)).map_err(io_err)?;

    for (p, c) in mesh.positions.iter().zip(&mesh.colors) {
        writeln!(w, "v {} {} {} {} {} {}", p.x, p.y, p.z, c.x, c.y, c.z).map_err(io_err)?;
    }

    if mtl_name.is_some() {
        writeln!(w, "usemtl {}", mesh.material_name).map_err(io_err)?;
    }
    for tri in mesh.indices.chunks_exact(3) {
        // OBJ 索引从1开始
        writeln!(w, "f {} {} {}", tri[0] + 1, tri[1] + 1, tri[2] + 1).map_err(io_err)?;
    }

    w.flush().map_err(io_err)
}

/// 写出声明无光照顶点色材质的 MTL
pub fn write_mtl(path: &Path, material_name: &str) -> Result<(), String> {
    let mut w = create_writer(path)?;
    let io_err = |e: std::io::Error| format!("写入 '{}' 失败: {}", path.display(), e);

    writeln!(w, "# texture_baker 无光照顶点色材质").map_err(io_err)?;
    writeln!(w, "newmtl {}", material_name).map_err(io_err)?;
    writeln!(w, "Kd 1 1 1").map_err(io_err)?;
    // illum 0: 只使用颜色，不做光照
    writeln!(w, "illum 0").map_err(io_err)?;

    w.flush().map_err(io_err)
}

/// 写出 ASCII PLY，顶点色为 8 位 RGBA
pub fn write_ply(path: &Path, mesh: &ColoredMesh) -> Result<(), String> {
    let mut w = create_writer(path)?;
    let io_err = |e: std::io::Error| format!("写入 '{}' 失败: {}", path.display(), e);

    writeln!(w, "ply").map_err(io_err)?;
    writeln!(w, "format ascii 1.0").map_err(io_err)?;
    writeln!(w, "comment texture_baker 生成于 {}", header_timestamp()).map_err(io_err)?;
    writeln!(w, "comment material {}", mesh.material_name).map_err(io_err)?;
    writeln!(w, "element vertex {}", mesh.positions.len()).map_err(io_err)?;
    for property in [
        "float x",
        "float y",
        "float z",
        "uchar red",
        "uchar green",
        "uchar blue",
        "uchar alpha",
    ] {
        writeln!(w, "property {}", property).map_err(io_err)?;
    }
    writeln!(w, "element face {}", mesh.triangle_count()).map_err(io_err)?;
    writeln!(w, "property list uchar uint vertex_indices").map_err(io_err)?;
    writeln!(w, "end_header").map_err(io_err)?;

    for (p, c) in mesh.positions.iter().zip(&mesh.colors) {
        let [r, g, b, a] = to_rgba8(c);
        writeln!(w, "{} {} {} {} {} {} {}", p.x, p.y, p.z, r, g, b, a).map_err(io_err)?;
    }
    for tri in mesh.indices.chunks_exact(3) {
        writeln!(w, "3 {} {} {}", tri[0], tri[1], tri[2]).map_err(io_err)?;
    }

    w.flush().map_err(io_err)
}
