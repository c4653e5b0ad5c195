//! compile_commands.json parsing.
//!
//! CMake, Bear and most build systems can emit a compile_commands.json file
//! with the exact compilation command of every source file. The arguments
//! are turned into [`ParseSettings`] for libclang: the compiler name, the
//! source file itself and output-related flags are dropped.

use crate::config::ParseSettings;
use crate::BuildError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single compile command from compile_commands.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileCommand {
    /// The working directory for compilation.
    pub directory: PathBuf,

    /// The source file path.
    pub file: PathBuf,

    /// The full compilation command (shell-quoted).
    #[serde(default)]
    pub command: Option<String>,

    /// The compilation arguments (array form).
    #[serde(default)]
    pub arguments: Option<Vec<String>>,

    /// Output file (optional).
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Get the compilation arguments as a vector, compiler name included.
    pub fn get_args(&self) -> Vec<String> {
        if let Some(args) = &self.arguments {
            args.clone()
        } else if let Some(cmd) = &self.command {
            split_command(cmd)
        } else {
            Vec::new()
        }
    }

    /// Absolute path of the source file.
    pub fn source_path(&self) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            self.directory.join(&self.file)
        }
    }

    /// Arguments libclang should see for this file.
    ///
    /// Relative paths given to include flags are resolved against
    /// `directory` since libclang does not change its working directory.
    pub fn parse_args(&self) -> Vec<String> {
        let args = self.get_args();
        let file_name = self.file.to_string_lossy();
        let mut out = Vec::new();

        let mut i = 1;
        while i < args.len() {
            let arg = args[i].as_str();
            if arg == "-c" || arg == file_name || self.resolve(arg) == self.source_path() {
                i += 1;
            } else if arg == "-o" {
                i += 2;
            } else if is_joined_output(arg) {
                i += 1;
            } else if let Some(flag) = PATH_FLAGS.iter().find(|f| arg == **f) {
                if let Some(path) = args.get(i + 1) {
                    out.push(flag.to_string());
                    out.push(self.resolve(path).display().to_string());
                } else {
                    out.push(arg.to_string());
                }
                i += 2;
            } else if let Some((flag, path)) = split_joined_path(arg) {
                out.push(format!("{flag}{}", self.resolve(path).display()));
                i += 1;
            } else {
                out.push(arg.to_string());
                i += 1;
            }
        }

        out
    }

    fn resolve(&self, dir: &str) -> PathBuf {
        let path = Path::new(dir);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.directory.join(path)
        }
    }

    /// Extract preprocessor definitions from the arguments.
    pub fn get_defines(&self) -> Vec<String> {
        let args = self.get_args();
        let mut defines = Vec::new();

        let mut i = 0;
        while i < args.len() {
            if args[i] == "-D" && i + 1 < args.len() {
                defines.push(args[i + 1].clone());
                i += 2;
            } else if let Some(def) = args[i].strip_prefix("-D") {
                defines.push(def.to_string());
                i += 1;
            } else {
                i += 1;
            }
        }

        defines
    }

    /// Get the language standard from arguments (e.g., "-std=c11").
    pub fn get_std(&self) -> Option<String> {
        self.get_args()
            .iter()
            .find_map(|arg| arg.strip_prefix("-std=").map(str::to_string))
    }
}

/// Flags whose value is a path, longest prefix first.
const PATH_FLAGS: &[&str] = &[
    "-include-pch",
    "-idirafter",
    "-isystem",
    "-include",
    "-iquote",
    "-I",
];

/// `-o<path>`. Objective-C flags share the prefix.
fn is_joined_output(arg: &str) -> bool {
    arg.len() > 2 && arg.starts_with("-o") && !arg.starts_with("-obj")
}

/// `-I<path>` and friends.
fn split_joined_path(arg: &str) -> Option<(&'static str, &str)> {
    PATH_FLAGS.iter().find_map(|flag| {
        arg.strip_prefix(flag)
            .filter(|path| !path.is_empty() && !path.starts_with('-'))
            .map(|path| (*flag, path))
    })
}

/// Split a shell command line, honoring single quotes, double quotes and
/// backslash escapes.
fn split_command(cmd: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;
    let mut chars = cmd.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_arg = true;
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_arg = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }

    args
}

/// Collection of compile commands (from compile_commands.json).
#[derive(Debug, Clone)]
pub struct CompileCommands {
    commands: Vec<CompileCommand>,
}

impl CompileCommands {
    /// Load compile commands from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let commands = Self::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            commands = commands.commands.len(),
            "loaded compilation database"
        );
        Ok(commands)
    }

    /// Load `compile_commands.json` from a build directory.
    pub fn from_directory(dir: &Path) -> crate::Result<Self> {
        Self::from_file(&dir.join("compile_commands.json"))
    }

    /// Parse compile commands from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> crate::Result<Self> {
        let commands: Vec<CompileCommand> = serde_json::from_str(json)?;
        Ok(Self { commands })
    }

    /// Get all compile commands.
    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// Find the compile command for a specific source file.
    pub fn find_command(&self, source: &Path) -> Option<&CompileCommand> {
        self.commands
            .iter()
            .find(|cmd| cmd.file == source || cmd.source_path() == source || cmd.file.ends_with(source))
    }

    /// Resolve the parse settings for one source file.
    pub fn settings_for(&self, source: &Path) -> crate::Result<ParseSettings> {
        let cmd = self
            .find_command(source)
            .ok_or_else(|| BuildError::SourceNotFound(source.display().to_string()))?;
        Ok(ParseSettings {
            file: cmd.source_path(),
            args: cmd.parse_args(),
            flags: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_compile_commands() {
        let json = r#"[
            {
                "directory": "/home/user/project/build",
                "file": "/home/user/project/src/main.c",
                "command": "cc -I/usr/include -I../include -DDEBUG=1 -std=c11 -c /home/user/project/src/main.c"
            },
            {
                "directory": "/home/user/project/build",
                "file": "/home/user/project/src/utils.c",
                "arguments": ["cc", "-I/usr/include", "-DNDEBUG", "-c", "utils.c"]
            }
        ]"#;

        let cmds = CompileCommands::from_str(json).unwrap();

        assert_eq!(cmds.commands().len(), 2);

        let cmd0 = &cmds.commands()[0];
        assert_eq!(cmd0.get_std(), Some("c11".to_string()));
        assert_eq!(cmd0.get_defines(), vec!["DEBUG=1"]);
        assert_eq!(
            cmd0.parse_args(),
            vec![
                "-I/usr/include",
                "-I/home/user/project/build/../include",
                "-DDEBUG=1",
                "-std=c11",
            ]
        );
    }

    #[test]
    fn test_settings_drop_compiler_output_and_source() {
        let json = r#"[
            {
                "directory": "/build",
                "file": "/src/main.c",
                "arguments": ["clang", "-Wall", "-c", "/src/main.c", "-o", "main.o"]
            }
        ]"#;

        let cmds = CompileCommands::from_str(json).unwrap();
        let settings = cmds.settings_for(Path::new("/src/main.c")).unwrap();

        assert_eq!(settings.file, PathBuf::from("/src/main.c"));
        assert_eq!(settings.args, vec!["-Wall"]);
    }

    #[test]
    fn test_rebase_include_flags() {
        let json = r#"[
            {
                "directory": "/build",
                "file": "/src/main.c",
                "arguments": [
                    "cc", "-isystem", "sys", "-iquote../quoted", "-include", "config.h",
                    "-includeprefix.h", "-I", "/abs", "-Ilocal", "-c", "/src/main.c"
                ]
            }
        ]"#;

        let cmds = CompileCommands::from_str(json).unwrap();
        assert_eq!(
            cmds.commands()[0].parse_args(),
            vec![
                "-isystem",
                "/build/sys",
                "-iquote/build/../quoted",
                "-include",
                "/build/config.h",
                "-include/build/prefix.h",
                "-I",
                "/abs",
                "-I/build/local",
            ]
        );
    }

    #[test]
    fn test_output_flags_only_drop_output() {
        let json = r#"[
            {
                "directory": "/build",
                "file": "/src/main.m",
                "arguments": [
                    "clang", "-ObjC", "-objcmt-migrate-literals", "-omain.o", "-o", "main.o",
                    "-c", "/src/main.m"
                ]
            }
        ]"#;

        let cmds = CompileCommands::from_str(json).unwrap();
        assert_eq!(
            cmds.commands()[0].parse_args(),
            vec!["-ObjC", "-objcmt-migrate-literals"]
        );
    }

    #[test]
    fn test_find_command() {
        let json = r#"[
            {
                "directory": "/build",
                "file": "src/main.c",
                "command": "cc -c main.c"
            }
        ]"#;

        let cmds = CompileCommands::from_str(json).unwrap();

        assert!(cmds.find_command(Path::new("src/main.c")).is_some());
        assert!(cmds.find_command(Path::new("/build/src/main.c")).is_some());
        assert!(cmds.find_command(Path::new("src/other.c")).is_none());
        assert!(matches!(
            cmds.settings_for(Path::new("src/other.c")),
            Err(BuildError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_split_command_quotes() {
        assert_eq!(
            split_command(r#"cc -DNAME="a b" '-DQ=it'"s" -I\ dir  main.c"#),
            vec!["cc", "-DNAME=a b", "-DQ=its", "-I dir", "main.c"]
        );
        assert_eq!(split_command("cc -DEMPTY=\"\""), vec!["cc", "-DEMPTY="]);
    }

    #[test]
    fn test_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("compile_commands.json")).unwrap();
        write!(
            file,
            r#"[{{"directory": "/b", "file": "x.c", "arguments": ["cc", "-c", "x.c"]}}]"#
        )
        .unwrap();

        let cmds = CompileCommands::from_directory(dir.path()).unwrap();
        assert_eq!(cmds.commands().len(), 1);
    }
}
