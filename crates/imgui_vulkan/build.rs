// Compiles the two UI shaders to SPIR-V when a Vulkan SDK is present.
// Without glslc the build continues; the renderer then expects
// precompiled bytecode or prebuilt .spv files at the configured paths.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADERS: [&str; 2] = ["shaders/imgui.vert", "shaders/imgui.frag"];

fn find_glslc() -> Option<PathBuf> {
    if let Ok(sdk) = env::var("VULKAN_SDK") {
        let candidate = if cfg!(target_os = "windows") {
            Path::new(&sdk).join("Bin").join("glslc.exe")
        } else {
            Path::new(&sdk).join("bin").join("glslc")
        };
        if candidate.exists() {
            return Some(candidate);
        }
    }

    // Fall back to a glslc on PATH
    let name = if cfg!(target_os = "windows") {
        "glslc.exe"
    } else {
        "glslc"
    };
    Command::new(name)
        .arg("--version")
        .status()
        .ok()
        .filter(|status| status.success())
        .map(|_| PathBuf::from(name))
}

fn needs_compile(source: &Path, output: &Path) -> bool {
    match (std::fs::metadata(source), std::fs::metadata(output)) {
        (Ok(src), Ok(dst)) => match (src.modified(), dst.modified()) {
            (Ok(src_time), Ok(dst_time)) => src_time > dst_time,
            _ => true,
        },
        _ => true,
    }
}

fn main() {
    println!("cargo:rerun-if-changed=shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    if env::var("SKIP_SHADERS").is_ok() {
        eprintln!("info: Skipping shader compilation (SKIP_SHADERS set)");
        return;
    }

    let Some(glslc) = find_glslc() else {
        eprintln!("warning: glslc not found, shader compilation skipped");
        eprintln!("hint: Install the Vulkan SDK and set VULKAN_SDK");
        return;
    };

    for shader in SHADERS {
        let source = PathBuf::from(shader);
        let output = source.with_extension(format!(
            "{}.spv",
            source.extension().and_then(|ext| ext.to_str()).unwrap_or("")
        ));

        if !needs_compile(&source, &output) {
            eprintln!("info: Shader {:?} is up to date", source.file_name());
            continue;
        }

        let status = Command::new(&glslc).arg(&source).arg("-o").arg(&output).status();
        match status {
            Ok(s) if s.success() => {
                eprintln!("info: Compiled {} -> {}", source.display(), output.display());
            }
            Ok(s) => {
                eprintln!(
                    "error: glslc failed for {} with exit code {}",
                    source.display(),
                    s.code().unwrap_or(-1)
                );
                panic!("Shader compilation failed");
            }
            Err(e) => {
                eprintln!("error: Failed to run glslc for {}: {}", source.display(), e);
                panic!("Failed to execute shader compiler");
            }
        }
    }
}
