//! Visual Studio tool commands (cl, link, lib).

use std::path::Path;

use super::{is_library_path, ArchiveInput, CommandSpec, CompileInput, LinkInput, Toolchain};

/// Visual Studio command conventions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsvcToolchain;

impl Toolchain for MsvcToolchain {
    fn name(&self) -> &'static str {
        "msvc"
    }

    fn compile_command(&self, compiler: &Path, input: &CompileInput) -> CommandSpec {
        CommandSpec::new(compiler)
            .arg("/nologo")
            .args(input.flags.iter().cloned())
            .arg("/c")
            .arg(input.source.display().to_string())
            .arg(format!("/Fo{}", input.output.display()))
    }

    fn archive_command(&self, ar: &Path, input: &ArchiveInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(ar)
            .arg("/nologo")
            .arg(format!("/OUT:{}", input.output.display()));

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        cmd
    }

    fn link_exe_command(&self, linker: &Path, input: &LinkInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(linker)
            .arg("/nologo")
            .args(input.ldflags.iter().cloned())
            .arg(format!("/OUT:{}", input.output.display()));

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        cmd.args(self.lib_flags(&input.lib_dirs, &input.libs))
            .args(input.ldflags_end.iter().cloned())
    }

    fn lib_flags(&self, lib_dirs: &[String], libs: &[String]) -> Vec<String> {
        let dirs = lib_dirs.iter().map(|dir| format!("/LIBPATH:{}", dir));
        let libs = libs.iter().map(|lib| {
            if is_library_path(lib) {
                lib.clone()
            } else {
                format!("{}.lib", lib)
            }
        });
        dirs.chain(libs).collect()
    }

    fn static_lib_name(&self, name: &str) -> String {
        format!("{}.lib", name)
    }
}
