//! GNU-style driver commands (gcc, gfortran, g77, Sun Studio drivers).

use std::path::Path;

use super::{is_library_path, ArchiveInput, CommandSpec, CompileInput, LinkInput, Toolchain};

/// GNU-style command conventions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GccToolchain;

impl Toolchain for GccToolchain {
    fn name(&self) -> &'static str {
        "gcc"
    }

    fn compile_command(&self, compiler: &Path, input: &CompileInput) -> CommandSpec {
        CommandSpec::new(compiler)
            .args(input.flags.iter().cloned())
            .arg("-c")
            .arg(input.source.display().to_string())
            .arg("-o")
            .arg(input.output.display().to_string())
    }

    fn archive_command(&self, ar: &Path, input: &ArchiveInput) -> CommandSpec {
        // Create archive with symbol index, replace files
        let mut cmd = CommandSpec::new(ar)
            .arg("rcs")
            .arg(input.output.display().to_string());

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        cmd
    }

    fn link_exe_command(&self, linker: &Path, input: &LinkInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(linker)
            .args(input.ldflags.iter().cloned())
            .arg("-o")
            .arg(input.output.display().to_string());

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        cmd.args(self.lib_flags(&input.lib_dirs, &input.libs))
            .args(input.ldflags_end.iter().cloned())
    }

    fn lib_flags(&self, lib_dirs: &[String], libs: &[String]) -> Vec<String> {
        let dirs = lib_dirs.iter().map(|dir| format!("-L{}", dir));
        let libs = libs.iter().map(|lib| {
            if is_library_path(lib) {
                lib.clone()
            } else {
                format!("-l{}", lib)
            }
        });
        dirs.chain(libs).collect()
    }

    fn static_lib_name(&self, name: &str) -> String {
        format!("lib{}.a", name)
    }
}
