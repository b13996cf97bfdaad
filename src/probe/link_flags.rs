//! Implicit link flags from verbose driver output.
//!
//! A Fortran driver run with its verbose flag prints the real linker
//! command. The library search paths and libraries on it are what a C
//! linker needs to link Fortran objects.

use crate::core::Platform;

use super::ProbeError;

/// Prefix of the echo lines some drivers print before the real command.
const DRIVER_ECHO: &str = "Driving:";

/// Libraries and options that are never carried over.
fn is_ignored(token: &str, platform: &Platform) -> bool {
    let common = token.starts_with("-lang")
        || (token.starts_with("-lcrt") && token.ends_with(".o"))
        || token == "-lc"
        || token == "-lSystem"
        || token == "-libmil"
        || token.starts_with("-LIST:")
        || token.starts_with("-LNO:");
    if common {
        return true;
    }

    if platform.is_windows() {
        token.starts_with("-lfrt")
            || token.starts_with("-lmingw")
            || matches!(
                token,
                "-luser32"
                    | "-lkernel32"
                    | "-ladvapi32"
                    | "-lmsvcrt"
                    | "-lshell32"
                    | "-lmoldname"
            )
    } else {
        token.starts_with("-lgcc")
    }
}

fn path_list_separator(platform: &Platform) -> char {
    if platform.is_windows() {
        ';'
    } else {
        ':'
    }
}

fn is_driver_echo(line: &str) -> bool {
    line.trim_start().starts_with(DRIVER_ECHO)
}

/// Join lines ending in a backslash with the line that follows.
fn logical_lines(lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();

    for line in lines {
        match line.strip_suffix('\\') {
            Some(head) => {
                pending.push_str(head);
                pending.push(' ');
            }
            None => {
                pending.push_str(line);
                out.push(std::mem::take(&mut pending));
            }
        }
    }
    if !pending.is_empty() {
        out.push(pending);
    }

    out
}

/// Extract `-L`, `-R` and `-l` flags from verbose link output.
///
/// Order is preserved and nothing is deduplicated.
pub fn extract_link_flags(lines: &[String], platform: &Platform) -> Result<Vec<String>, ProbeError> {
    let mut flags = Vec::new();

    for line in logical_lines(lines) {
        if is_driver_echo(&line) {
            continue;
        }

        let tokens = shlex::split(&line).ok_or_else(|| ProbeError::MalformedLinkOutput {
            line: line.clone(),
            reason: "unbalanced quotes".to_string(),
        })?;

        let mut tokens = tokens.into_iter();
        while let Some(token) = tokens.next() {
            if is_ignored(&token, platform) {
                continue;
            }

            match token.as_str() {
                "-L" | "-Y" | "-R" | "-u" | "-z" => {
                    let arg = tokens.next().ok_or_else(|| ProbeError::MalformedLinkOutput {
                        line: line.clone(),
                        reason: format!("`{}` without an argument", token),
                    })?;

                    match token.as_str() {
                        "-R" => flags.push(format!("-R{}", arg)),
                        "-L" | "-Y" => {
                            let dirs = arg.strip_prefix("P,").unwrap_or(&arg);
                            flags.extend(
                                dirs.split(path_list_separator(platform))
                                    .filter(|d| !d.is_empty())
                                    .map(|d| format!("-L{}", d)),
                            );
                        }
                        // -u symbol, -z keyword
                        _ => {}
                    }
                }
                t if t.starts_with("-L") || t.starts_with("-R") || t.starts_with("-l") => {
                    flags.push(t.to_string());
                }
                _ => {}
            }
        }
    }

    Ok(flags)
}

/// Like [`extract_link_flags`], but unparseable output yields no flags.
pub fn implicit_link_flags(lines: &[String], platform: &Platform) -> Vec<String> {
    extract_link_flags(lines, platform).unwrap_or_else(|e| {
        tracing::warn!("{}", e);
        Vec::new()
    })
}

/// Whether verbose link output shows the libraries the driver links.
pub fn check_link_verbose(lines: &[String]) -> bool {
    lines
        .iter()
        .filter(|line| !is_driver_echo(line))
        .flat_map(|line| line.split_whitespace())
        .any(|token| token.ends_with(".a") || token.starts_with("-l"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::compiler_outputs;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_gfortran_output() {
        let flags =
            extract_link_flags(&compiler_outputs::gfortran_link_verbose(), &Platform::posix())
                .unwrap();
        assert_eq!(
            flags,
            vec![
                "-L/usr/lib/gcc/x86_64-linux-gnu/12",
                "-L/usr/lib/x86_64-linux-gnu",
                "-lgfortran",
                "-lm",
                "-lquadmath"
            ]
        );
    }

    #[test]
    fn test_g77_output_skips_driving_line() {
        let flags =
            extract_link_flags(&compiler_outputs::g77_link_verbose(), &Platform::posix()).unwrap();
        assert_eq!(
            flags,
            vec![
                "-L/usr/lib/gcc/x86_64-linux-gnu/3.4.6",
                "-L/usr/lib64",
                "-lfrtbegin",
                "-lg2c",
                "-lm"
            ]
        );
    }

    #[test]
    fn test_noise_is_ignored_and_order_kept() {
        let input = lines(&["ld -O2 -Wall -lgfortran -lgcc -lc foo.o -L/opt/lib -lm"]);
        let flags = extract_link_flags(&input, &Platform::posix()).unwrap();
        assert_eq!(flags, vec!["-lgfortran", "-L/opt/lib", "-lm"]);
    }

    #[test]
    fn test_separated_arguments() {
        let input = lines(&["ld -Y P,/usr/ccs/lib:/usr/lib -R /opt/SUNWspro/lib -u __main -z muldefs -lfsu"]);
        let flags = extract_link_flags(&input, &Platform::posix()).unwrap();
        assert_eq!(
            flags,
            vec!["-L/usr/ccs/lib", "-L/usr/lib", "-R/opt/SUNWspro/lib", "-lfsu"]
        );
    }

    #[test]
    fn test_continuation_lines() {
        let input = lines(&["collect2 -L/usr/lib \\", "  -lgfortran"]);
        let flags = extract_link_flags(&input, &Platform::posix()).unwrap();
        assert_eq!(flags, vec!["-L/usr/lib", "-lgfortran"]);
    }

    #[test]
    fn test_windows_ignore_list() {
        let input = lines(&[
            "collect2 -LC:/mingw/lib -lgfortran -lmingw32 -lmoldname -lkernel32 -luser32 -lgcc -lquadmath",
        ]);
        let flags = extract_link_flags(&input, &Platform::windows()).unwrap();
        // -lgcc is only ignored on POSIX
        assert_eq!(flags, vec!["-LC:/mingw/lib", "-lgfortran", "-lgcc", "-lquadmath"]);
    }

    #[test]
    fn test_vendor_options_ignored() {
        let input = lines(&["ld -LIST:all -LNO:opt=0 -lang-f77 -lcrt1.o -libmil -lSystem -lfui"]);
        let flags = extract_link_flags(&input, &Platform::posix()).unwrap();
        assert_eq!(flags, vec!["-lfui"]);
    }

    #[test]
    fn test_malformed_output() {
        let dangling = lines(&["ld foo.o -L"]);
        assert!(matches!(
            extract_link_flags(&dangling, &Platform::posix()),
            Err(ProbeError::MalformedLinkOutput { .. })
        ));

        let quotes = lines(&["ld \"-L/opt/lib -lm"]);
        assert!(extract_link_flags(&quotes, &Platform::posix()).is_err());
        assert!(implicit_link_flags(&quotes, &Platform::posix()).is_empty());
    }

    #[test]
    fn test_check_link_verbose() {
        assert!(check_link_verbose(&compiler_outputs::gfortran_link_verbose()));
        assert!(check_link_verbose(&lines(&["collect2 /usr/lib/libg2c.a"])));
        assert!(!check_link_verbose(&lines(&["Driving: g77 -v -lg2c"])));
        assert!(!check_link_verbose(&lines(&["Using built-in specs."])));
    }
}
