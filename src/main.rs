use log::{error, info};
use std::collections::HashSet;
use std::time::Instant;

mod core;
mod io;
mod material_system;

use crate::core::baker::MeshBaker;
use crate::io::bake_settings::BakeSettings;
use crate::io::mesh_writer::save_colored_mesh;
use crate::io::obj_loader::load_obj_model;
use crate::io::simple_cli::{CliAction, SimpleCli};

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match SimpleCli::process()? {
        CliAction::Bake(settings) => run(&settings),
        CliAction::ExampleWritten(path) => {
            println!("示例配置已写入 {}，修改 [files] obj 后使用 --config 运行", path);
            Ok(())
        }
    }
}

/// 完整流程：加载模型 -> 烘焙所有网格 -> 保存成功的网格
fn run(settings: &BakeSettings) -> Result<(), String> {
    settings.validate()?;
    let start_time = Instant::now();

    // --- 加载模型 ---
    let obj_path = settings
        .obj
        .as_deref()
        .ok_or("错误: 未指定OBJ文件路径")?;
    let load_start = Instant::now();
    let model_data = load_obj_model(obj_path, settings)?;
    info!("模型加载耗时 {:?}", load_start.elapsed());

    // --- 烘焙 ---
    let baker = MeshBaker::from_settings(settings);
    info!("采样设置: {}", settings.get_sampling_description());
    let report = baker.bake_model(&model_data);

    // --- 保存 ---
    let mut used_stems = HashSet::new();
    for mesh in &report.baked {
        save_colored_mesh(mesh, settings, &mut used_stems)?;
    }

    info!("总耗时 {:?}", start_time.elapsed());

    if !report.is_success() {
        for (name, e) in &report.failures {
            error!("  {}: {}", name, e);
        }
        return Err(format!(
            "{} 个网格烘焙失败，已保存 {} 个成功的网格",
            report.failures.len(),
            report.baked.len()
        ));
    }

    info!("完成。");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::bake_settings::OutputFormat;
    use image::{Rgba, RgbaImage};
    use std::fs;
    use std::path::Path;

    const TRIANGLE_OBJ: &str = "\
mtllib tri.mtl
o tri
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
usemtl checker
f 1/1 2/2 3/3
";

    /// 2x2 纹理：纹素 (0,0) 为红色，其余为蓝色
    fn write_scene(dir: &Path, mtl: &str) -> String {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.save(dir.join("checker.png")).unwrap();
        fs::write(dir.join("tri.mtl"), mtl).unwrap();

        let obj = dir.join("tri.obj");
        fs::write(&obj, TRIANGLE_OBJ).unwrap();
        obj.to_string_lossy().into_owned()
    }

    fn settings_for(dir: &Path, obj: String) -> BakeSettings {
        BakeSettings {
            obj: Some(obj),
            output_dir: dir.join("out").to_string_lossy().into_owned(),
            // 图像第0行即纹素 y = 0
            flip_v: false,
            ..Default::default()
        }
    }

    #[test]
    fn single_triangle_blends_red_and_blue() {
        let dir = tempfile::tempdir().unwrap();
        let obj = write_scene(dir.path(), "newmtl checker\nmap_Kd checker.png\n");
        let settings = settings_for(dir.path(), obj);

        run(&settings).unwrap();

        // 不重复纹素为 (0,0) (2,0) (0,2) (1,1) (1,0) (0,1)，
        // 平铺寻址下前三个都落在红色纹素上，因此红蓝各占一半
        let content = fs::read_to_string(dir.path().join("out").join("tri.obj")).unwrap();
        let vertex_lines: Vec<&str> = content.lines().filter(|l| l.starts_with("v ")).collect();
        assert_eq!(
            vertex_lines,
            vec![
                "v 0 0 0 0.5 0 0.5",
                "v 1 0 0 0.5 0 0.5",
                "v 0 1 0 0.5 0 0.5"
            ]
        );
        assert!(dir.path().join("out").join("tri.mtl").exists());
    }

    #[test]
    fn ply_output_from_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let obj = write_scene(dir.path(), "newmtl checker\nmap_Kd checker.png\n");
        let settings = BakeSettings {
            format: OutputFormat::Ply,
            ..settings_for(dir.path(), obj)
        };

        run(&settings).unwrap();
        let content = fs::read_to_string(dir.path().join("out").join("tri.ply")).unwrap();
        assert!(content.contains("element vertex 3"));
        assert!(content.contains("0 0 0 128 0 128 255"));
    }

    #[test]
    fn separated_objects_with_same_name_are_all_written() {
        let dir = tempfile::tempdir().unwrap();
        write_scene(dir.path(), "newmtl checker\nmap_Kd checker.png\n");
        let obj = dir.path().join("parts.obj");
        fs::write(
            &obj,
            "mtllib tri.mtl\n\
v 0 0 0\nv 1 0 0\nv 0 1 0\n\
vt 0 0\nvt 1 0\nvt 0 1\n\
o arm\nusemtl checker\nf 1/1 2/2 3/3\n\
o body\nusemtl checker\nf 1/1 2/2 3/3\n\
o arm\nusemtl checker\nf 1/1 2/2 3/3\n",
        )
        .unwrap();
        let settings = settings_for(dir.path(), obj.to_string_lossy().into_owned());

        run(&settings).unwrap();

        let out = dir.path().join("out");
        for stem in ["arm", "body", "arm_1"] {
            assert!(out.join(format!("{}.obj", stem)).exists(), "缺少 {}.obj", stem);
            assert!(out.join(format!("{}.mtl", stem)).exists(), "缺少 {}.mtl", stem);
        }
    }

    #[test]
    fn material_without_texture_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let obj = write_scene(dir.path(), "newmtl checker\nKd 1 0 0\n");
        let settings = settings_for(dir.path(), obj);

        let err = run(&settings).unwrap_err();
        assert!(err.contains("1 个网格烘焙失败"));
        assert!(!dir.path().join("out").join("tri.obj").exists());
    }
}
