use crate::core::color_sampler::{
    DEFAULT_TESSELLATION_STEPS, MAX_TESSELLATION_STEPS, TriangleColorSampler,
};
use crate::material_system::texture::AddressMode;

/// 输出网格文件格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// 带顶点色扩展的 OBJ（"v x y z r g b"）
    #[default]
    Obj,
    /// ASCII PLY，包含 RGBA 顶点色
    Ply,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Result<Self, String> {
        match name.to_lowercase().as_str() {
            "obj" => Ok(OutputFormat::Obj),
            "ply" => Ok(OutputFormat::Ply),
            _ => Err(format!("未知的输出格式: {}", name)),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Obj => "obj",
            OutputFormat::Ply => "ply",
        }
    }
}

/// 🔥 **纯数据结构** - 所有可通过TOML配置的烘焙参数
#[derive(Debug, Clone)]
pub struct BakeSettings {
    // ===== 🔥 **文件路径设置** =====
    /// 输入OBJ文件的路径
    pub obj: Option<String>,
    /// 显式指定要使用的纹理文件，覆盖MTL设置
    pub texture: Option<String>,
    /// 输出目录
    pub output_dir: String,
    /// 输出文件名前缀，最终文件名为 前缀 + 网格名
    pub output_prefix: String,

    // ===== 🔥 **采样设置** =====
    /// 递归重心细分的层数，决定每个三角形的采样数量
    pub max_tessellation_steps: u32,
    /// 启用多线程采样
    pub use_multithreading: bool,

    // ===== 🔥 **纹理设置** =====
    /// 纹素坐标越界时的寻址方式
    pub address_mode: AddressMode,
    /// 纹素 y = 0 对应图像底部（OBJ 的 UV 原点在左下角）
    pub flip_v: bool,
    /// 材质缺少纹理时，用 MTL 中的漫反射颜色作为纯色纹理
    pub fallback_to_diffuse: bool,

    // ===== 🔥 **输出设置** =====
    pub format: OutputFormat,
    /// 输出网格使用的无光照顶点色材质名
    pub unlit_material: String,
    /// 为 OBJ 输出同时写出声明该材质的 MTL 文件
    pub write_material: bool,
}

impl Default for BakeSettings {
    fn default() -> Self {
        BakeSettings {
            obj: None,
            texture: None,
            output_dir: "output_baked".to_string(),
            output_prefix: String::new(),

            max_tessellation_steps: DEFAULT_TESSELLATION_STEPS,
            use_multithreading: true,

            address_mode: AddressMode::Repeat,
            flip_v: true,
            fallback_to_diffuse: false,

            format: OutputFormat::Obj,
            unlit_material: "opaque_color_unlit".to_string(),
            write_material: true,
        }
    }
}

impl BakeSettings {
    /// 验证烘焙参数
    pub fn validate(&self) -> Result<(), String> {
        if let Some(obj_path) = &self.obj {
            if !std::path::Path::new(obj_path).exists() {
                return Err(format!("错误: 找不到OBJ文件 '{}'", obj_path));
            }
        } else {
            return Err("错误: 未指定OBJ文件路径".to_string());
        }

        if let Some(texture) = &self.texture {
            if !std::path::Path::new(texture).exists() {
                return Err(format!("错误: 找不到纹理文件 '{}'", texture));
            }
        }

        if self.output_dir.trim().is_empty() {
            return Err("错误: 输出目录不能为空".to_string());
        }

        if self.max_tessellation_steps > MAX_TESSELLATION_STEPS {
            return Err(format!(
                "错误: 细分层数 {} 超出范围 0..={}",
                self.max_tessellation_steps, MAX_TESSELLATION_STEPS
            ));
        }

        if self.unlit_material.trim().is_empty()
            || self.unlit_material.chars().any(char::is_whitespace)
        {
            return Err(format!(
                "错误: 材质名 '{}' 不能为空或包含空白字符",
                self.unlit_material
            ));
        }

        Ok(())
    }

    pub fn get_sampling_description(&self) -> String {
        let budget = TriangleColorSampler::new(self.max_tessellation_steps).max_sample_count();
        format!(
            "{} 层细分, 每三角形最多 {} 个采样, {}",
            self.max_tessellation_steps,
            budget,
            if self.use_multithreading {
                "多线程"
            } else {
                "单线程"
            }
        )
    }
}
