use crate::io::bake_settings::{BakeSettings, OutputFormat};
use crate::io::config_loader::TomlConfigLoader;
use clap::Parser;
use log::info;

/// 🔥 **极简CLI** - 配置文件为主，命令行参数覆盖个别字段
#[derive(Parser, Debug)]
#[command(name = "texture_baker", version)]
#[command(about = "🎨 将带纹理的OBJ网格烘焙为逐三角形顶点色网格")]
pub struct SimpleCli {
    /// 📁 配置文件路径（TOML格式）
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// 输入OBJ文件，覆盖配置文件
    #[arg(long)]
    pub obj: Option<String>,

    /// 覆盖所有材质的纹理文件
    #[arg(long)]
    pub texture: Option<String>,

    /// 输出目录
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// 输出格式：obj 或 ply
    #[arg(long)]
    pub format: Option<String>,

    /// 递归重心细分层数
    #[arg(long)]
    pub steps: Option<u32>,

    /// 禁用多线程采样
    #[arg(long)]
    pub single_thread: bool,

    /// 📋 使用示例配置（创建模板文件后退出）
    #[arg(long)]
    pub use_example_config: bool,
}

/// CLI处理结果
pub enum CliAction {
    /// 执行烘焙
    Bake(BakeSettings),
    /// 已写出示例配置，无需烘焙
    ExampleWritten(String),
}

impl SimpleCli {
    /// 🔥 **处理CLI参数并返回烘焙设置**
    pub fn process() -> Result<CliAction, String> {
        Self::parse().into_action()
    }

    pub fn into_action(self) -> Result<CliAction, String> {
        if self.use_example_config {
            let example_path = "example_bake_config.toml";
            TomlConfigLoader::create_example_config(example_path)?;
            info!("✅ 已创建示例配置: {}", example_path);
            return Ok(CliAction::ExampleWritten(example_path.to_string()));
        }

        let settings = if let Some(config_path) = &self.config {
            info!("📁 加载配置文件: {}", config_path);
            TomlConfigLoader::load_from_file(config_path)
                .map_err(|e| format!("配置文件加载失败: {}", e))?
        } else {
            info!("💡 未指定配置文件，使用默认设置");
            BakeSettings::default()
        };

        self.apply_overrides(settings).map(CliAction::Bake)
    }

    /// 命令行参数优先于配置文件
    fn apply_overrides(&self, mut settings: BakeSettings) -> Result<BakeSettings, String> {
        if let Some(obj) = &self.obj {
            settings.obj = Some(obj.clone());
        }
        if let Some(texture) = &self.texture {
            settings.texture = Some(texture.clone());
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output_dir = output_dir.clone();
        }
        if let Some(format) = &self.format {
            settings.format = OutputFormat::from_name(format)?;
        }
        if let Some(steps) = self.steps {
            settings.max_tessellation_steps = steps;
        }
        if self.single_thread {
            settings.use_multithreading = false;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("bake.toml");
        std::fs::write(
            &config,
            "[files]\nobj = \"from_config.obj\"\noutput_dir = \"cfg_out\"\n[sampling]\nmax_tessellation_steps = 2\n",
        )
        .unwrap();

        let cli = SimpleCli::parse_from([
            "texture_baker",
            "--config",
            config.to_str().unwrap(),
            "--obj",
            "from_cli.obj",
            "--format",
            "ply",
            "--single-thread",
        ]);

        let CliAction::Bake(settings) = cli.into_action().unwrap() else {
            panic!("应当得到烘焙设置");
        };
        assert_eq!(settings.obj.as_deref(), Some("from_cli.obj"));
        assert_eq!(settings.output_dir, "cfg_out");
        assert_eq!(settings.max_tessellation_steps, 2);
        assert_eq!(settings.format, OutputFormat::Ply);
        assert!(!settings.use_multithreading);
    }

    #[test]
    fn defaults_without_config() {
        let cli = SimpleCli::parse_from(["texture_baker", "--steps", "1"]);
        let CliAction::Bake(settings) = cli.into_action().unwrap() else {
            panic!("应当得到烘焙设置");
        };
        assert_eq!(settings.max_tessellation_steps, 1);
        assert!(settings.obj.is_none());
    }

    #[test]
    fn invalid_format_flag_is_an_error() {
        let cli = SimpleCli::parse_from(["texture_baker", "--format", "stl"]);
        assert!(cli.into_action().is_err());
    }
}
