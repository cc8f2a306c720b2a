//! Renderer configuration
//!
//! Options can be built in code or loaded from a TOML file. Embedded
//! shader bytecode is supplied programmatically and never serialized.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::render::vulkan::pipeline::ShaderSource;

/// Default path of the compiled vertex shader
pub const DEFAULT_VERTEX_SHADER_PATH: &str = "shaders/imgui.vert.spv";

/// Default path of the compiled fragment shader
pub const DEFAULT_FRAGMENT_SHADER_PATH: &str = "shaders/imgui.frag.spv";

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration is structurally valid but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Precompiled SPIR-V supplied by the embedding application
#[derive(Debug, Clone)]
pub struct PrecompiledShaders {
    /// Vertex shader bytecode
    pub vertex: Vec<u8>,
    /// Fragment shader bytecode
    pub fragment: Vec<u8>,
}

/// Options controlling renderer initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// RGBA clear color applied at the start of every frame
    pub clear_color: [f32; 4],
    /// Enable the Khronos validation layer
    pub enable_validation: bool,
    /// Index into the enumerated physical device list
    pub device_index: u32,
    /// Path to the compiled vertex shader
    pub vertex_shader_path: PathBuf,
    /// Path to the compiled fragment shader
    pub fragment_shader_path: PathBuf,
    /// Use embedded bytecode instead of the shader files
    pub use_precompiled_shaders: bool,
    /// Embedded bytecode, required when `use_precompiled_shaders` is set
    #[serde(skip)]
    pub precompiled_shaders: Option<PrecompiledShaders>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            enable_validation: false,
            device_index: 0,
            vertex_shader_path: PathBuf::from(DEFAULT_VERTEX_SHADER_PATH),
            fragment_shader_path: PathBuf::from(DEFAULT_FRAGMENT_SHADER_PATH),
            use_precompiled_shaders: false,
            precompiled_shaders: None,
        }
    }
}

impl RendererOptions {
    /// Load options from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let options: Self = toml::from_str(&contents)?;
        options.validate()?;
        Ok(options)
    }

    /// Set the clear color
    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Enable or disable validation layers
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    /// Pick the physical device by enumeration index
    pub fn with_device_index(mut self, index: u32) -> Self {
        self.device_index = index;
        self
    }

    /// Override both shader file paths
    pub fn with_shader_paths(
        mut self,
        vertex: impl Into<PathBuf>,
        fragment: impl Into<PathBuf>,
    ) -> Self {
        self.vertex_shader_path = vertex.into();
        self.fragment_shader_path = fragment.into();
        self
    }

    /// Use embedded bytecode instead of shader files
    pub fn with_precompiled_shaders(mut self, shaders: PrecompiledShaders) -> Self {
        self.use_precompiled_shaders = true;
        self.precompiled_shaders = Some(shaders);
        self
    }

    /// Check the options for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_precompiled_shaders && self.precompiled_shaders.is_none() {
            return Err(ConfigError::Invalid(
                "use_precompiled_shaders is set but no bytecode was supplied".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the configured vertex and fragment shader sources
    pub fn shader_sources(&self) -> Result<(ShaderSource, ShaderSource), ConfigError> {
        self.validate()?;
        if self.use_precompiled_shaders {
            let shaders = self
                .precompiled_shaders
                .as_ref()
                .expect("checked by validate");
            Ok((
                ShaderSource::Bytes(shaders.vertex.clone()),
                ShaderSource::Bytes(shaders.fragment.clone()),
            ))
        } else {
            Ok((
                ShaderSource::File(self.vertex_shader_path.clone()),
                ShaderSource::File(self.fragment_shader_path.clone()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_documented_shader_paths() {
        let options = RendererOptions::default();
        assert_eq!(
            options.vertex_shader_path,
            PathBuf::from(DEFAULT_VERTEX_SHADER_PATH)
        );
        assert_eq!(
            options.fragment_shader_path,
            PathBuf::from(DEFAULT_FRAGMENT_SHADER_PATH)
        );
        assert_eq!(options.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(options.device_index, 0);
        assert!(!options.enable_validation);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let options: RendererOptions =
            toml::from_str("clear_color = [0.1, 0.2, 0.3, 1.0]\ndevice_index = 1\n").unwrap();
        assert_eq!(options.clear_color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(options.device_index, 1);
        assert_eq!(
            options.vertex_shader_path,
            PathBuf::from(DEFAULT_VERTEX_SHADER_PATH)
        );
    }

    #[test]
    fn precompiled_flag_without_bytes_is_invalid() {
        let options: RendererOptions =
            toml::from_str("use_precompiled_shaders = true\n").unwrap();
        assert!(matches!(options.validate(), Err(ConfigError::Invalid(_))));
        assert!(options.shader_sources().is_err());
    }

    #[test]
    fn precompiled_bytes_take_priority_over_paths() {
        let options = RendererOptions::default().with_precompiled_shaders(PrecompiledShaders {
            vertex: vec![1, 2, 3, 4],
            fragment: vec![5, 6, 7, 8],
        });
        let (vertex, fragment) = options.shader_sources().unwrap();
        assert!(matches!(vertex, ShaderSource::Bytes(ref bytes) if bytes == &[1, 2, 3, 4]));
        assert!(matches!(fragment, ShaderSource::Bytes(ref bytes) if bytes == &[5, 6, 7, 8]));
    }
}
