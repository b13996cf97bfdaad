//! Compile and link small probe programs.
//!
//! Every step runs through the active [`BuildEnv`]: compilers, flags and
//! the link command are read from it, so a probe redirects linking simply
//! by changing `LINK` or `LINKCOM` inside a transaction.

use std::path::{Path, PathBuf};

use crate::core::{CompilerRole, Platform};
use crate::env::{keys, BuildEnv};
use crate::toolchain::{
    compile_toolchain, gnu_toolchain, native_toolchain, ArchiveInput, CompileInput, Language,
    LinkInput,
};
use crate::util::process::{CommandRunner, CommandSpec, ProbeResult};

use super::scratch::ScratchDir;

/// Result of a step that produces a file.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub result: ProbeResult,
    /// Object file or library; only meaningful when the step succeeded
    pub artifact: PathBuf,
}

impl BuildOutput {
    pub fn success(&self) -> bool {
        self.result.success
    }
}

/// Builds probe programs in a scratch directory.
pub struct BuildProbe<'r> {
    runner: &'r dyn CommandRunner,
    platform: Platform,
    scratch: ScratchDir,
}

impl<'r> BuildProbe<'r> {
    pub fn new(runner: &'r dyn CommandRunner, platform: Platform, scratch: ScratchDir) -> Self {
        BuildProbe {
            runner,
            platform,
            scratch,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn runner(&self) -> &'r dyn CommandRunner {
        self.runner
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Compile `source` as `lang` into an object file.
    pub fn try_compile(&mut self, env: &BuildEnv, source: &str, lang: Language) -> BuildOutput {
        let stem = self.scratch.next_stem();
        let src = self
            .scratch
            .path()
            .join(format!("{}.{}", stem, lang.source_extension()));
        let obj = self
            .scratch
            .path()
            .join(format!("{}.{}", stem, self.platform.object_extension()));

        let role = lang.compiler_role();
        let Some(compiler) = env.compiler(role) else {
            return BuildOutput {
                result: ProbeResult::not_run(format!("no {} compiler configured", role)),
                artifact: obj,
            };
        };

        if let Err(e) = std::fs::write(&src, source) {
            tracing::debug!("failed to write {}: {}", src.display(), e);
            return BuildOutput {
                result: ProbeResult::not_run(e.to_string()),
                artifact: obj,
            };
        }

        let input = CompileInput {
            source: src,
            output: obj.clone(),
            flags: env.tokens(keys::flags(role)),
        };
        let cmd =
            compile_toolchain(&self.platform, lang).compile_command(Path::new(compiler), &input);

        BuildOutput {
            result: self.run(&cmd),
            artifact: obj,
        }
    }

    /// Compile `source` and link it into an executable.
    ///
    /// Returns the link-stage result, or the compile result when compiling
    /// failed.
    pub fn try_link(&mut self, env: &BuildEnv, source: &str, lang: Language) -> ProbeResult {
        let compiled = self.try_compile(env, source, lang);
        if !compiled.success() {
            return compiled.result;
        }
        self.link_objects(env, &[compiled.artifact])
    }

    /// Link existing objects into an executable.
    pub fn link_objects(&mut self, env: &BuildEnv, objects: &[PathBuf]) -> ProbeResult {
        let stem = self.scratch.next_stem();
        let mut target = self.scratch.path().join(stem);
        let exe_ext = self.platform.exe_extension();
        if !exe_ext.is_empty() {
            target.set_extension(exe_ext);
        }

        let cmd = match env.get_str(keys::LINKCOM).filter(|t| !t.trim().is_empty()) {
            Some(template) => expand_link_template(env, template, &target, objects),
            None => self.default_link_command(env, &target, objects),
        };

        match cmd {
            Some(cmd) => self.run(&cmd),
            None => ProbeResult::not_run("no linker configured"),
        }
    }

    /// Archive objects into a static library and return its path.
    pub fn archive(&mut self, env: &BuildEnv, objects: &[PathBuf]) -> BuildOutput {
        let toolchain = native_toolchain(&self.platform);
        let name = self.scratch.next_stem();
        let library = self.scratch.path().join(toolchain.static_lib_name(&name));

        // `ar rcs` adds to an existing archive; a persistent scratch
        // directory can hold one from an earlier run.
        if let Err(e) = std::fs::remove_file(&library) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return BuildOutput {
                    result: ProbeResult::not_run(format!(
                        "failed to remove stale {}: {}",
                        library.display(),
                        e
                    )),
                    artifact: library,
                };
            }
        }

        let default_ar = if self.platform.ms_tools { "lib" } else { "ar" };
        let ar = env
            .get_str(keys::AR)
            .filter(|s| !s.is_empty())
            .unwrap_or(default_ar);

        let input = ArchiveInput {
            objects: objects.to_vec(),
            output: library.clone(),
        };
        let cmd = toolchain.archive_command(Path::new(ar), &input);

        BuildOutput {
            result: self.run(&cmd),
            artifact: library,
        }
    }

    fn default_link_command(
        &self,
        env: &BuildEnv,
        target: &Path,
        objects: &[PathBuf],
    ) -> Option<CommandSpec> {
        let linker = env
            .get_str(keys::LINK)
            .filter(|s| !s.is_empty())
            .or_else(|| env.compiler(CompilerRole::C))?;

        let input = LinkInput {
            objects: objects.to_vec(),
            output: target.to_path_buf(),
            lib_dirs: env.tokens(keys::LIBPATH),
            libs: env.tokens(keys::LIBS),
            ldflags: env.tokens(keys::LINKFLAGS),
            ldflags_end: env.tokens(keys::LINKFLAGSEND),
        };

        Some(native_toolchain(&self.platform).link_exe_command(Path::new(linker), &input))
    }

    fn run(&self, cmd: &CommandSpec) -> ProbeResult {
        let result = match self.runner.run(cmd) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("{}: {}", cmd.display_command(), e);
                return ProbeResult::not_run(e.to_string());
            }
        };

        if !result.success {
            tracing::debug!(
                "`{}` failed with status {}",
                cmd.display_command(),
                result.exit_status
            );
            for line in &result.output {
                tracing::debug!("  {}", line);
            }
        }

        result
    }
}

/// Expand a `LINKCOM` template.
///
/// Whole tokens are substituted: `$TARGET` by the output, `$SOURCES` by
/// the objects, `$_LIBFLAGS` by GNU-style library flags from `LIBPATH` and
/// `LIBS`, and `$KEY` by the tokens of that key (nothing when unset). A
/// program key such as `$F77` is always a single token.
pub fn expand_link_template(
    env: &BuildEnv,
    template: &str,
    target: &Path,
    objects: &[PathBuf],
) -> Option<CommandSpec> {
    let mut tokens = Vec::new();

    for word in template.split_whitespace() {
        match word {
            "$TARGET" => tokens.push(target.display().to_string()),
            "$SOURCES" => tokens.extend(objects.iter().map(|o| o.display().to_string())),
            "$_LIBFLAGS" => tokens.extend(
                gnu_toolchain().lib_flags(&env.tokens(keys::LIBPATH), &env.tokens(keys::LIBS)),
            ),
            word => match word.strip_prefix('$') {
                Some(key) if keys::PROGRAMS.contains(&key) => {
                    if let Some(program) = env.get_str(key).filter(|p| !p.trim().is_empty()) {
                        tokens.push(program.trim().to_string());
                    }
                }
                Some(key) => tokens.extend(env.tokens(key)),
                None => tokens.push(word.to_string()),
            },
        }
    }

    CommandSpec::from_tokens(tokens)
}
