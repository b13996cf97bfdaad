//! Canned compiler outputs and a simulated toolchain.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::{Case, ManglingScheme};
use crate::util::process::{CommandRunner, CommandSpec, ProbeResult, ProcessError};

/// Mock compiler outputs for testing identification and link parsing.
pub mod compiler_outputs {
    use super::super::MockProcessOutput;

    /// `gcc -v` output (printed on stderr).
    pub fn gcc_verbose(version: &str) -> MockProcessOutput {
        MockProcessOutput::with_output(
            0,
            "",
            format!(
                "Using built-in specs.\n\
                 COLLECT_GCC=gcc\n\
                 Target: x86_64-linux-gnu\n\
                 Thread model: posix\n\
                 gcc version {version} (GCC) \n"
            ),
        )
    }

    /// `f90 -V` output of the Sun Studio Fortran compiler.
    pub fn sun_fortran_banner(version: &str) -> MockProcessOutput {
        MockProcessOutput::with_output(
            0,
            "",
            format!("f90: Sun Fortran 95 {version} SunOS_i386 2007/05/03\n"),
        )
    }

    /// Verbose link output of gfortran 12.
    pub fn gfortran_link_verbose() -> Vec<String> {
        [
            "Using built-in specs.",
            "COLLECT_GCC=gfortran",
            "Target: x86_64-linux-gnu",
            "gcc version 12.2.0 (Debian 12.2.0-14)",
            " /usr/lib/gcc/x86_64-linux-gnu/12/collect2 -plugin /usr/lib/gcc/x86_64-linux-gnu/12/liblto_plugin.so \
             -dynamic-linker /lib64/ld-linux-x86-64.so.2 -o conftest /usr/lib/x86_64-linux-gnu/crt1.o \
             -L/usr/lib/gcc/x86_64-linux-gnu/12 -L/usr/lib/x86_64-linux-gnu conftest.o \
             -lgfortran -lm -lgcc_s -lgcc -lquadmath -lc -lgcc_s -lgcc /usr/lib/gcc/x86_64-linux-gnu/12/crtend.o",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Verbose link output of g77 3.4, including a `Driving:` line.
    pub fn g77_link_verbose() -> Vec<String> {
        [
            "Driving: g77 -v -o conftest conftest.o -lfrtbegin -lg2c -lm -shared-libgcc",
            "Reading specs from /usr/lib/gcc/x86_64-linux-gnu/3.4.6/specs",
            "Thread model: posix",
            "gcc version 3.4.6 (Debian 3.4.6-5)",
            " /usr/lib/gcc/x86_64-linux-gnu/3.4.6/collect2 --eh-frame-hdr -m elf_x86_64 \
             -dynamic-linker /lib64/ld-linux-x86-64.so.2 -o conftest \
             -L/usr/lib/gcc/x86_64-linux-gnu/3.4.6 -L/usr/lib64 conftest.o \
             -lfrtbegin -lg2c -lm -lgcc_s -lgcc -lc -lgcc_s -lgcc",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

#[derive(Debug, Default)]
struct FakeState {
    links: usize,
    commands: Vec<String>,
}

/// A simulated native toolchain.
///
/// Compiling writes a symbol table instead of an object file: C sources
/// define the `int name(void) {` functions and reference the `void
/// name(void);` declarations, Fortran sources define their subroutines
/// decorated with [`FakeToolchain::scheme`]. Linking succeeds when every
/// reference resolves and the entry requirement holds: `main` through the
/// C driver, [`FakeToolchain::entry`] (if any) through the Fortran driver.
#[derive(Debug)]
pub struct FakeToolchain {
    /// C compiler program name
    pub cc: String,
    /// Fortran compiler program name
    pub fortran: String,
    /// Archiver program name
    pub ar: String,
    /// Linker program name when it differs from the C compiler
    pub linker: Option<String>,
    /// Version reported by `-v`
    pub version: String,
    /// Decoration applied to Fortran subroutines
    pub scheme: ManglingScheme,
    /// Symbol the Fortran runtime needs when linking through its driver
    pub entry: Option<String>,
    /// Flag that makes the Fortran driver print `verbose_output`
    pub verbose_flag: String,
    pub verbose_output: Vec<String>,
    /// Fortran compiles fail
    pub broken_fortran: bool,
    state: Mutex<FakeState>,
}

impl FakeToolchain {
    fn new(cc: &str, fortran: &str, version: &str, scheme: ManglingScheme) -> Self {
        FakeToolchain {
            cc: cc.to_string(),
            fortran: fortran.to_string(),
            ar: "ar".to_string(),
            linker: None,
            version: version.to_string(),
            scheme,
            entry: None,
            verbose_flag: "-v".to_string(),
            verbose_output: Vec::new(),
            broken_fortran: false,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// gcc + gfortran 12: no dummy main, lowercase with one trailing underscore.
    pub fn gfortran() -> Self {
        let mut tc = FakeToolchain::new(
            "gcc",
            "gfortran",
            "12.2.0",
            ManglingScheme::new(false, false, Case::Lower),
        );
        tc.verbose_output = compiler_outputs::gfortran_link_verbose();
        tc
    }

    /// gcc + g77 3.4: needs `MAIN__`, doubles the underscore on compound names.
    pub fn g77() -> Self {
        let mut tc = FakeToolchain::new(
            "gcc",
            "g77",
            "3.4.6",
            ManglingScheme::new(false, true, Case::Lower),
        );
        tc.entry = Some("MAIN__".to_string());
        tc.verbose_output = compiler_outputs::g77_link_verbose();
        tc
    }

    /// A Windows runtime that wants the program to define `main`.
    pub fn windows_main() -> Self {
        let mut tc = FakeToolchain::new(
            "gcc",
            "gfortran",
            "12.2.0",
            ManglingScheme::new(true, false, Case::Upper),
        );
        tc.entry = Some("main".to_string());
        tc
    }

    /// Visual Studio C tools next to a GNU Fortran driver.
    pub fn ms_tools() -> Self {
        let mut tc = FakeToolchain::new(
            "cl",
            "gfortran",
            "12.2.0",
            ManglingScheme::new(false, false, Case::Lower),
        );
        tc.ar = "lib".to_string();
        tc.linker = Some("link".to_string());
        tc
    }

    pub fn with_scheme(mut self, scheme: ManglingScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_entry(mut self, entry: Option<&str>) -> Self {
        self.entry = entry.map(str::to_string);
        self
    }

    pub fn with_broken_fortran(mut self) -> Self {
        self.broken_fortran = true;
        self
    }

    /// Number of link steps run so far.
    pub fn link_count(&self) -> usize {
        self.state.lock().unwrap().links
    }

    /// Every command run so far.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    fn is_msvc(&self, program: &str) -> bool {
        program == "cl" || program == "link" || program == "lib"
    }

    fn knows(&self, program: &str) -> bool {
        program == self.cc
            || program == self.fortran
            || program == self.ar
            || self.linker.as_deref() == Some(program)
    }

    fn compile(&self, program: &str, args: &[String]) -> ProbeResult {
        let (source, object) = if self.is_msvc(program) {
            (
                arg_after(args, "/c"),
                args.iter().find_map(|a| a.strip_prefix("/Fo")).map(str::to_string),
            )
        } else {
            (arg_after(args, "-c"), arg_after(args, "-o"))
        };
        let (Some(source), Some(object)) = (source, object) else {
            return ProbeResult::from_exit(1, "fake: missing source or output");
        };

        if program == self.fortran && self.broken_fortran {
            return ProbeResult::from_exit(1, &format!("{}: internal compiler error", program));
        }

        let text = match std::fs::read_to_string(&source) {
            Ok(text) => text,
            Err(e) => return ProbeResult::from_exit(1, &format!("{}: {}", source, e)),
        };

        let symbols = if is_fortran_source(&source) {
            self.fortran_symbols(&text)
        } else {
            c_symbols(&text)
        };

        match std::fs::write(&object, symbols) {
            Ok(()) => ProbeResult::from_exit(0, ""),
            Err(e) => ProbeResult::from_exit(1, &format!("{}: {}", object, e)),
        }
    }

    fn fortran_symbols(&self, text: &str) -> String {
        let mut out = String::new();
        for line in text.lines() {
            let line = line.trim().to_ascii_lowercase();
            if let Some(rest) = line.strip_prefix("subroutine ") {
                let name = rest.split('(').next().unwrap_or(rest).trim();
                out.push_str(&format!("D {}\n", self.scheme.decorate(name)));
            } else if line.starts_with("program") {
                let entry = self.entry.as_deref().unwrap_or("main");
                out.push_str(&format!("D {}\n", entry));
            }
        }
        out
    }

    fn archive(&self, program: &str, args: &[String]) -> ProbeResult {
        let (output, inputs): (Option<String>, Vec<&String>) = if self.is_msvc(program) {
            (
                args.iter().find_map(|a| a.strip_prefix("/OUT:")).map(str::to_string),
                args.iter().filter(|a| !is_msvc_option(a)).collect(),
            )
        } else {
            (args.get(1).cloned(), args.iter().skip(2).collect())
        };
        let Some(output) = output else {
            return ProbeResult::from_exit(1, "fake: no archive name");
        };

        let mut contents = String::new();
        for input in inputs {
            match std::fs::read_to_string(input) {
                Ok(text) => contents.push_str(&text),
                Err(e) => return ProbeResult::from_exit(1, &format!("{}: {}", input, e)),
            }
        }

        match std::fs::write(&output, contents) {
            Ok(()) => ProbeResult::from_exit(0, ""),
            Err(e) => ProbeResult::from_exit(1, &format!("{}: {}", output, e)),
        }
    }

    fn link(&self, program: &str, args: &[String]) -> ProbeResult {
        self.state.lock().unwrap().links += 1;

        let output = if self.is_msvc(program) {
            args.iter().find_map(|a| a.strip_prefix("/OUT:")).map(str::to_string)
        } else {
            arg_after(args, "-o")
        };

        let mut defined = BTreeSet::new();
        let mut referenced = Vec::new();
        for input in args.iter().filter(|a| is_link_input(a)) {
            let text = match std::fs::read_to_string(input) {
                Ok(text) => text,
                Err(e) => return ProbeResult::from_exit(1, &format!("{}: {}", input, e)),
            };
            for line in text.lines() {
                match line.split_once(' ') {
                    Some(("D", sym)) => {
                        defined.insert(sym.to_string());
                    }
                    Some(("U", sym)) => referenced.push(sym.to_string()),
                    _ => {}
                }
            }
        }

        let entry = if program == self.fortran {
            self.entry.clone()
        } else {
            Some("main".to_string())
        };
        referenced.extend(entry);

        let missing: Vec<String> = referenced
            .iter()
            .filter(|sym| !defined.contains(*sym))
            .map(|sym| format!("undefined reference to `{}'", sym))
            .collect();
        if !missing.is_empty() {
            return ProbeResult::from_exit(1, &missing.join("\n"));
        }

        if let Some(output) = output {
            if let Err(e) = std::fs::write(&output, "fake executable\n") {
                return ProbeResult::from_exit(1, &format!("{}: {}", output, e));
            }
        }

        if program == self.fortran && args.contains(&self.verbose_flag) {
            ProbeResult::from_exit(0, &self.verbose_output.join("\n"))
        } else {
            ProbeResult::from_exit(0, "")
        }
    }
}

impl CommandRunner for FakeToolchain {
    fn run(&self, cmd: &CommandSpec) -> Result<ProbeResult, ProcessError> {
        self.state
            .lock()
            .unwrap()
            .commands
            .push(cmd.display_command());

        let program = program_name(&cmd.program);
        if !self.knows(&program) {
            return Err(ProcessError::Spawn {
                program: cmd.program.display().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            });
        }

        let args = &cmd.args;
        if program == self.ar {
            return Ok(self.archive(&program, args));
        }
        if args.len() == 1 && args[0] == "-v" && !self.is_msvc(&program) {
            let banner = compiler_outputs::gcc_verbose(&self.version);
            return Ok(banner.to_result());
        }
        if args.iter().any(|a| a == "-c" || a == "/c") {
            return Ok(self.compile(&program, args));
        }
        if args.iter().any(|a| a == "-o" || a.starts_with("/OUT:")) {
            return Ok(self.link(&program, args));
        }

        Ok(ProbeResult::from_exit(
            1,
            &format!("{}: unrecognized command line `{}`", program, args.join(" ")),
        ))
    }
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn arg_after(args: &[String], flag: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).cloned()
}

fn is_fortran_source(source: &str) -> bool {
    let ext = PathBuf::from(source)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    matches!(ext.as_deref(), Some("f" | "f77" | "f90" | "f95"))
}

/// `lib` options, as opposed to absolute POSIX object paths.
fn is_msvc_option(arg: &str) -> bool {
    arg == "/nologo" || arg.starts_with("/OUT:")
}

fn is_link_input(arg: &str) -> bool {
    !arg.starts_with('-')
        && !arg.starts_with("/OUT:")
        && [".o", ".obj", ".a", ".lib"].iter().any(|ext| arg.ends_with(ext))
}

fn c_symbols(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line
            .strip_prefix("int ")
            .or_else(|| line.strip_prefix("void "))
        else {
            continue;
        };
        let Some(idx) = rest.find('(') else {
            continue;
        };
        let name = rest[..idx].trim();
        if line.ends_with(';') {
            out.push_str(&format!("U {}\n", name));
        } else if line.contains('{') {
            out.push_str(&format!("D {}\n", name));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_symbols() {
        let src = "int MAIN__(void) { return 1; }\nvoid foobar_(void);\nint my_main(void) {\nfoobar_();\nreturn 0;\n}\n";
        assert_eq!(c_symbols(src), "D MAIN__\nU foobar_\nD my_main\n");
    }

    #[test]
    fn test_fortran_symbols() {
        let tc = FakeToolchain::g77();
        let src = "      subroutine foobar()\n      return\n      end\n      subroutine foo_bar()\n      return\n      end\n";
        assert_eq!(tc.fortran_symbols(src), "D foobar_\nD foo_bar__\n");
    }

    #[test]
    fn test_unknown_program_fails_to_spawn() {
        let tc = FakeToolchain::gfortran();
        let result = tc.run(&CommandSpec::new("ifort").arg("-v"));
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[test]
    fn test_identification_banner() {
        let tc = FakeToolchain::g77();
        let result = tc.run(&CommandSpec::new("g77").arg("-v")).unwrap();
        assert!(result.success);
        assert!(result.text().contains("gcc version 3.4.6"));
    }

    #[test]
    fn test_link_inputs() {
        assert!(is_link_input("conftest_1.o"));
        assert!(is_link_input("/tmp/x/libconftest_0.a"));
        assert!(!is_link_input("-lgfortran"));
        assert!(!is_link_input("/nologo"));
    }
}
