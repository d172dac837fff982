use crate::core::color_sampler::MAX_TESSELLATION_STEPS;
use crate::io::bake_settings::{BakeSettings, OutputFormat};
use crate::material_system::texture::AddressMode;
use log::warn;
use std::path::Path;
use toml::Value;

/// TOML配置管理器 - 统一处理所有配置的读写
pub struct TomlConfigLoader;

impl TomlConfigLoader {
    /// 从TOML文件加载完整配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<BakeSettings, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("读取配置文件失败: {}", e))?;

        Self::load_from_content(&content)
    }

    /// 从TOML内容字符串加载配置
    pub fn load_from_content(content: &str) -> Result<BakeSettings, String> {
        let toml_value: Value =
            toml::from_str(content).map_err(|e| format!("解析TOML失败: {}", e))?;

        Self::parse_toml_to_settings(toml_value)
    }

    /// 保存配置到TOML文件
    pub fn save_to_file<P: AsRef<Path>>(settings: &BakeSettings, path: P) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings);
        std::fs::write(path, toml_content).map_err(|e| format!("写入配置文件失败: {}", e))
    }

    /// 生成示例配置文件
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let settings = BakeSettings {
            obj: Some("obj/textured/model.obj".to_string()),
            ..Default::default()
        };

        Self::save_to_file(&settings, path).map_err(|e| format!("创建示例配置失败: {}", e))
    }

    // ===== TOML -> BakeSettings 转换 =====

    fn parse_toml_to_settings(toml: Value) -> Result<BakeSettings, String> {
        let mut settings = BakeSettings::default();

        // [files] 部分
        if let Some(files) = toml.get("files").and_then(|v| v.as_table()) {
            Self::parse_files_section(&mut settings, files)?;
        }

        // [sampling] 部分
        if let Some(sampling) = toml.get("sampling").and_then(|v| v.as_table()) {
            Self::parse_sampling_section(&mut settings, sampling)?;
        }

        // [texture] 部分
        if let Some(texture) = toml.get("texture").and_then(|v| v.as_table()) {
            Self::parse_texture_section(&mut settings, texture)?;
        }

        // [output] 部分
        if let Some(output) = toml.get("output").and_then(|v| v.as_table()) {
            Self::parse_output_section(&mut settings, output)?;
        }

        Ok(settings)
    }

    fn parse_files_section(settings: &mut BakeSettings, files: &toml::Table) -> Result<(), String> {
        if let Some(obj) = files.get("obj").and_then(|v| v.as_str()) {
            settings.obj = Some(obj.to_string());
        }
        if let Some(texture) = files.get("texture").and_then(|v| v.as_str()) {
            settings.texture = Some(texture.to_string());
        }
        if let Some(output_dir) = files.get("output_dir").and_then(|v| v.as_str()) {
            settings.output_dir = output_dir.to_string();
        }
        if let Some(output_prefix) = files.get("output_prefix").and_then(|v| v.as_str()) {
            settings.output_prefix = output_prefix.to_string();
        }
        Ok(())
    }

    fn parse_sampling_section(
        settings: &mut BakeSettings,
        sampling: &toml::Table,
    ) -> Result<(), String> {
        if let Some(steps) = sampling
            .get("max_tessellation_steps")
            .and_then(|v| v.as_integer())
        {
            if (0..=MAX_TESSELLATION_STEPS as i64).contains(&steps) {
                settings.max_tessellation_steps = steps as u32;
            } else {
                warn!(
                    "无效的细分层数 {}, 必须在0-{}之间，使用默认值{}",
                    steps, MAX_TESSELLATION_STEPS, settings.max_tessellation_steps
                );
            }
        }
        if let Some(use_multithreading) = sampling
            .get("use_multithreading")
            .and_then(|v| v.as_bool())
        {
            settings.use_multithreading = use_multithreading;
        }
        Ok(())
    }

    fn parse_texture_section(
        settings: &mut BakeSettings,
        texture: &toml::Table,
    ) -> Result<(), String> {
        if let Some(address_mode) = texture.get("address_mode").and_then(|v| v.as_str()) {
            settings.address_mode = AddressMode::from_name(address_mode)?;
        }
        if let Some(flip_v) = texture.get("flip_v").and_then(|v| v.as_bool()) {
            settings.flip_v = flip_v;
        }
        if let Some(fallback) = texture
            .get("fallback_to_diffuse")
            .and_then(|v| v.as_bool())
        {
            settings.fallback_to_diffuse = fallback;
        }
        Ok(())
    }

    fn parse_output_section(
        settings: &mut BakeSettings,
        output: &toml::Table,
    ) -> Result<(), String> {
        if let Some(format) = output.get("format").and_then(|v| v.as_str()) {
            settings.format = OutputFormat::from_name(format)?;
        }
        if let Some(unlit_material) = output.get("unlit_material").and_then(|v| v.as_str()) {
            settings.unlit_material = unlit_material.to_string();
        }
        if let Some(write_material) = output.get("write_material").and_then(|v| v.as_bool()) {
            settings.write_material = write_material;
        }
        Ok(())
    }

    // ===== BakeSettings -> TOML 转换 =====

    fn settings_to_toml(settings: &BakeSettings) -> String {
        let mut content = String::new();

        // 文件头注释
        content.push_str("# 🔥 纹理烘焙工具配置文件\n");
        content.push_str(&format!(
            "# 生成于 {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        // [files] 部分
        content.push_str("[files]\n");
        if let Some(obj) = &settings.obj {
            content.push_str(&format!("obj = {}\n", toml_string(obj)));
        } else {
            content.push_str("# obj = \"path/to/your/model.obj\"  # 取消注释并设置OBJ文件路径\n");
        }
        if let Some(texture) = &settings.texture {
            content.push_str(&format!("texture = {}\n", toml_string(texture)));
        } else {
            content.push_str("# texture = \"path/to/texture.png\"  # 可选：覆盖MTL文件中的纹理\n");
        }
        content.push_str(&format!("output_dir = {}\n", toml_string(&settings.output_dir)));
        content.push_str(&format!(
            "output_prefix = {}\n",
            toml_string(&settings.output_prefix)
        ));
        content.push('\n');

        // [sampling] 部分
        content.push_str("[sampling]\n");
        content.push_str(&format!(
            "max_tessellation_steps = {}  # 0-{}\n",
            settings.max_tessellation_steps, MAX_TESSELLATION_STEPS
        ));
        content.push_str(&format!(
            "use_multithreading = {}\n",
            settings.use_multithreading
        ));
        content.push('\n');

        // [texture] 部分
        content.push_str("[texture]\n");
        content.push_str(&format!(
            "address_mode = \"{}\"  # repeat 或 clamp\n",
            settings.address_mode.name()
        ));
        content.push_str(&format!("flip_v = {}\n", settings.flip_v));
        content.push_str(&format!(
            "fallback_to_diffuse = {}\n",
            settings.fallback_to_diffuse
        ));
        content.push('\n');

        // [output] 部分
        content.push_str("[output]\n");
        content.push_str(&format!(
            "format = \"{}\"  # obj 或 ply\n",
            settings.format.extension()
        ));
        content.push_str(&format!(
            "unlit_material = {}\n",
            toml_string(&settings.unlit_material)
        ));
        content.push_str(&format!("write_material = {}\n", settings.write_material));

        content
    }
}

/// 将字符串转换为带转义的TOML字符串字面量
fn toml_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
