//! Turning compile commands into flag lists

use std::path::{Component, Path, PathBuf};

/// Flags whose value is a path, either joined (`-Ifoo`) or separate (`-I foo`)
const PATH_FLAGS: &[&str] = &["-isystem", "-I", "-iquote", "--sysroot="];

/// Split a shell command line into arguments using POSIX quoting rules
pub fn split_command(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_arg = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    current.push(c);
                }
            }
            '"' => {
                in_arg = true;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some(next @ ('"' | '\\' | '$' | '`')) => current.push(next),
                            Some(next) => {
                                current.push('\\');
                                current.push(next);
                            }
                            None => current.push('\\'),
                        },
                        _ => current.push(c),
                    }
                }
            }
            '\\' => {
                in_arg = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            _ => {
                in_arg = true;
                current.push(c);
            }
        }
    }

    if in_arg {
        args.push(current);
    }

    args
}

/// Launchers that run the real compiler named by the next argument
const COMPILER_LAUNCHERS: &[&str] = &["ccache", "sccache", "distcc", "icecc"];

/// Dependency-file flags whose value is the following argument
const DEPENDENCY_FLAGS: &[&str] = &["-MF", "-MT", "-MQ"];

/// Strip the compiler, `-c`, output and dependency-file flags, and the source file
pub fn extract_flags(
    arguments: &[String],
    source_file: &Path,
    working_directory: &Path,
) -> Vec<String> {
    let mut flags = Vec::with_capacity(arguments.len());
    let mut args = arguments.iter().peekable();

    // Leading non-flag arguments are the compiler, possibly behind a launcher
    if let Some(first) = args.next_if(|arg| !arg.starts_with('-')) {
        if is_launcher(first) {
            args.next_if(|arg| !arg.starts_with('-'));
        }
    }

    while let Some(arg) = args.next() {
        if arg == "-c" {
            continue;
        }

        if arg == "-o" || DEPENDENCY_FLAGS.contains(&arg.as_str()) {
            args.next();
            continue;
        }

        if arg.starts_with("-o") || DEPENDENCY_FLAGS.iter().any(|flag| arg.starts_with(flag)) {
            continue;
        }

        if !arg.starts_with('-') && same_file(arg, source_file, working_directory) {
            continue;
        }

        flags.push(arg.clone());
    }

    flags
}

fn is_launcher(arg: &str) -> bool {
    Path::new(arg)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| COMPILER_LAUNCHERS.contains(&name))
}

fn same_file(arg: &str, source_file: &Path, working_directory: &Path) -> bool {
    normalize_path(&working_directory.join(arg)) == normalize_path(source_file)
}

/// Rebase relative include and sysroot paths onto the compiler's working directory
pub fn make_relative_paths_absolute(
    flags: &[String],
    working_directory: &Path,
) -> Vec<String> {
    if working_directory.as_os_str().is_empty() {
        return flags.to_vec();
    }

    let mut new_flags = Vec::with_capacity(flags.len());
    let mut make_next_absolute = false;

    for flag in flags {
        let mut new_flag = flag.clone();

        if make_next_absolute {
            make_next_absolute = false;
            new_flag = working_directory.join(flag).to_string_lossy().into_owned();
        }

        for path_flag in PATH_FLAGS {
            if flag == path_flag {
                make_next_absolute = true;
                break;
            }

            if let Some(path) = flag.strip_prefix(path_flag) {
                new_flag = format!("{}{}", path_flag, working_directory.join(path).display());
                break;
            }
        }

        new_flags.push(new_flag);
    }

    new_flags
}

/// Resolve `.` and `..` components without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }

    normalized
}
