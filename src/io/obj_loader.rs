use crate::io::bake_settings::BakeSettings;
use crate::material_system::color::Color;
use crate::material_system::materials::{Material, Mesh, ModelData};
use crate::material_system::texture::{Texture, load_texture};
use log::{debug, info, warn};
use nalgebra::{Point3, Vector2};
use std::path::Path;

/// 从文件路径中提取基本文件名（不含扩展名）
fn get_basename_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 主要功能：加载 OBJ 模型及其材质纹理
///
/// 相邻且同名的 tobj 模型（同一物体按 usemtl 拆开的部分）合并为一个网格，
/// 每部分成为一个子网格。
pub fn load_obj_model<P: AsRef<Path>>(
    obj_path: P,
    settings: &BakeSettings,
) -> Result<ModelData, String> {
    let obj_path_ref = obj_path.as_ref();
    info!("加载 OBJ 文件: {:?}", obj_path_ref);

    let obj_basename = get_basename_from_path(obj_path_ref);
    let base_path = obj_path_ref.parent().unwrap_or_else(|| Path::new("."));

    // 检查命令行/配置指定的纹理
    let override_texture: Option<Texture> = match &settings.texture {
        Some(tex_path) => {
            debug!("使用指定的纹理覆盖材质: {}", tex_path);
            let texture = load_texture(tex_path, settings.address_mode, settings.flip_v)
                .ok_or_else(|| format!("无法加载指定的纹理: {}", tex_path))?;
            Some(texture)
        }
        None => None,
    };

    let load_options = tobj::LoadOptions {
        triangulate: true,  // 将所有面转换为三角形
        single_index: true, // 位置与纹理坐标共用同一套索引
        ignore_points: true,
        ignore_lines: true,
    };

    let (models, materials_result) =
        tobj::load_obj(obj_path_ref, &load_options).map_err(|e| format!("加载 OBJ 失败: {}", e))?;

    let mtl_materials = match materials_result {
        Ok(mats) => {
            info!("从 MTL 加载了 {} 个材质", mats.len());
            mats
        }
        Err(e) => {
            warn!("加载材质失败: {}", e);
            Vec::new()
        }
    };

    let mut materials: Vec<Material> = mtl_materials
        .into_iter()
        .map(|mat| convert_material(mat, base_path, override_texture.as_ref(), settings))
        .collect();

    // 没有任何材质时，用覆盖纹理或回退颜色创建默认材质
    if materials.is_empty() {
        if let Some(texture) = &override_texture {
            debug!("未找到 MTL 材质，创建带指定纹理的默认材质");
            materials.push(Material::new("default").with_texture(texture.clone()));
        } else if settings.fallback_to_diffuse {
            debug!("未找到 MTL 材质，创建纯色默认材质");
            let material = Material::new("default");
            let texture = Texture::solid_color(material.diffuse);
            materials.push(material.with_texture(texture));
        }
    }

    let mut meshes: Vec<Mesh> = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let mesh_name = if model.name.is_empty() || model.name == "unnamed_object" {
            obj_basename.clone()
        } else {
            model.name.clone()
        };

        if mesh.indices.is_empty() {
            debug!("跳过没有索引的网格 '{}'", mesh_name);
            continue;
        }

        let positions: Vec<Point3<f32>> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0], p[1], p[2]))
            .collect();
        let texcoords: Vec<Vector2<f32>> = mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| Vector2::new(t[0], t[1]))
            .collect();

        if texcoords.is_empty() {
            warn!("网格 '{}' 缺少纹理坐标，无法烘焙", mesh_name);
        }

        let material_id = resolve_material_id(&mesh_name, mesh.material_id, materials.len());

        // 同一物体的相邻部分合并为子网格
        match meshes.last_mut() {
            Some(last) if last.name == mesh_name => {
                last.append_submesh(&positions, &texcoords, &mesh.indices, material_id);
            }
            _ => {
                let mut new_mesh = Mesh {
                    name: mesh_name,
                    ..Default::default()
                };
                new_mesh.append_submesh(&positions, &texcoords, &mesh.indices, material_id);
                meshes.push(new_mesh);
            }
        }
    }

    for mesh in &meshes {
        debug!(
            "处理网格 '{}': {} 个顶点, {} 个三角形, {} 个子网格",
            mesh.name,
            mesh.positions.len(),
            mesh.triangle_count(),
            mesh.submeshes.len()
        );
    }

    if meshes.is_empty() {
        return Err("OBJ 文件中没有可处理的网格".to_string());
    }

    let model_data = ModelData {
        meshes,
        materials,
        name: obj_basename,
    };

    info!(
        "创建模型 '{}' 成功: {} 个网格, {} 个材质",
        model_data.name,
        model_data.meshes.len(),
        model_data.materials.len()
    );
    Ok(model_data)
}

fn convert_material(
    mat: tobj::Material,
    base_path: &Path,
    override_texture: Option<&Texture>,
    settings: &BakeSettings,
) -> Material {
    let mut material = Material::new(&mat.name);
    if let Some([r, g, b]) = mat.diffuse {
        material.diffuse = Color::new(r, g, b, mat.dissolve.unwrap_or(1.0));
    }

    // 优先使用指定的覆盖纹理
    material.texture = if let Some(texture) = override_texture {
        if let Some(tex_name) = &mat.diffuse_texture {
            debug!(
                "指定的纹理覆盖了材质 '{}' 中的纹理 '{}'",
                mat.name, tex_name
            );
        }
        Some(texture.clone())
    } else {
        mat.diffuse_texture.as_ref().and_then(|tex_name| {
            let texture_path = base_path.join(tex_name);
            let texture = load_texture(&texture_path, settings.address_mode, settings.flip_v);
            if let Some(t) = &texture {
                debug!(
                    "纹理 '{}': 类型={}, 尺寸={}x{}",
                    tex_name,
                    t.get_type_description(),
                    t.width,
                    t.height
                );
            }
            texture
        })
    };

    if material.texture.is_none() && settings.fallback_to_diffuse {
        warn!(
            "材质 '{}' 没有可用纹理，使用漫反射颜色 {:?}",
            material.name, material.diffuse
        );
        material.texture = Some(Texture::solid_color(material.diffuse));
    }

    material
}

/// 无效材质 ID 回退为 0（若存在材质）
fn resolve_material_id(
    mesh_name: &str,
    material_id: Option<usize>,
    material_count: usize,
) -> Option<usize> {
    match material_id {
        Some(id) if id < material_count => Some(id),
        _ if material_count == 0 => None,
        Some(id) => {
            warn!(
                "网格 '{}' 有无效的材质 ID {}。分配默认材质 ID 0",
                mesh_name, id
            );
            Some(0)
        }
        None => Some(0),
    }
}
