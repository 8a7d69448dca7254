//! Configuration for the IDE helper generator.
//!
//! A TOML file with a `[generator]` table and a list of `[[classmap]]`
//! entries:
//!
//! ```toml
//! [generator]
//! output = "_ide_helper.php"
//! extension = "php"
//!
//! [[classmap]]
//! class = "Application"
//! path = ["Foundation", "Application.php"]
//! superclass = 'Illuminate\Foundation\Application'
//! subclass = "App"
//! ```
//!
//! The first of these that exists is used:
//!
//! 1. the file given with `--config`,
//! 2. `php-codeintel.toml` in the scanned root,
//! 3. `php-codeintel/config.toml` in the user's config directory,
//! 4. the built-in Laravel 4 facade map.

use std::path::{Path, PathBuf};

use etcetera::{BaseStrategy, choose_base_strategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// File name looked up in the scanned root.
pub const PROJECT_CONFIG_FILE: &str = "php-codeintel.toml";

const BUILTIN_CLASSMAP: &str = include_str!("../resources/laravel_classmap.toml");
const BUILTIN_NAME: &str = "<built-in>";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub classmap: Vec<ClassMapEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Where the helper file is written, relative to the working directory.
    pub output: PathBuf,
    /// Extension of the files to scan, without the dot.
    pub extension: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("_ide_helper.php"),
            extension: "php".to_string(),
        }
    }
}

/// One scanned class and the facade it is documented onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMapEntry {
    /// Short class name as found in the scanned file.
    pub class: String,
    /// `(folder suffix, file name)` the defining file must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<(String, String)>,
    /// Fully qualified class the facade stub extends.
    pub superclass: String,
    /// Name of the facade stub class.
    pub subclass: String,
}

impl ClassMapEntry {
    /// Whether `file` may define this entry's class.  Entries without a
    /// `path` accept any file.
    pub fn matches_file(&self, file: &Path) -> bool {
        let Some((folder, name)) = &self.path else {
            return true;
        };
        let parent = file
            .parent()
            .map(|p| p.to_string_lossy())
            .unwrap_or_default();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        parent.ends_with(folder.as_str()) && file_name == name.as_str()
    }
}

/// Where a [`Config`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Builtin,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Builtin => f.write_str(BUILTIN_NAME),
        }
    }
}

impl Config {
    /// The built-in Laravel 4 facade map.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CLASSMAP, Path::new(BUILTIN_NAME))
    }

    /// Parse TOML `text`; `origin` only names the source in errors.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| Error::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Pick the configuration for a run over `root`.
    ///
    /// An `explicit` path must exist; the other candidates are skipped when
    /// absent.
    pub fn discover(explicit: Option<&Path>, root: &Path) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            return Ok((Self::load_path(path)?, ConfigSource::File(path.to_path_buf())));
        }

        let project = root.join(PROJECT_CONFIG_FILE);
        if project.is_file() {
            return Ok((Self::load_path(&project)?, ConfigSource::File(project)));
        }

        match user_config_path() {
            Ok(user) if user.is_file() => {
                return Ok((Self::load_path(&user)?, ConfigSource::File(user)));
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "no user config directory"),
        }

        Ok((Self::builtin()?, ConfigSource::Builtin))
    }

    /// Entries for `class`, in file order.
    pub fn entries_for<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ClassMapEntry> {
        self.classmap.iter().filter(move |e| e.class == class)
    }
}

/// `<config dir>/php-codeintel/config.toml` for the current user.
pub fn user_config_path() -> Result<PathBuf> {
    let strategy = choose_base_strategy().map_err(|e| Error::ConfigDir(e.to_string()))?;
    Ok(strategy.config_dir().join("php-codeintel").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct TestWorkspace {
        dir: tempfile::TempDir,
    }

    impl TestWorkspace {
        fn new() -> Self {
            TestWorkspace {
                dir: tempfile::tempdir().expect("failed to create temp dir"),
            }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn write(&self, relative_path: &str, content: &str) -> PathBuf {
            let full_path = self.dir.path().join(relative_path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).expect("failed to create dirs");
            }
            fs::write(&full_path, content).expect("failed to write file");
            full_path
        }
    }

    #[test]
    fn test_builtin_map_parses() {
        let config = Config::builtin().expect("built-in map is valid TOML");
        assert_eq!(config.classmap.len(), 28);
        assert_eq!(config.generator, GeneratorConfig::default());

        let app = config.entries_for("Application").next().expect("App facade");
        assert_eq!(app.subclass, "App");
        assert_eq!(app.superclass, "Illuminate\\Foundation\\Application");
        assert_eq!(
            app.path,
            Some(("Foundation".to_string(), "Application.php".to_string()))
        );
    }

    #[test]
    fn test_request_feeds_two_facades() {
        let config = Config::builtin().expect("built-in map");
        let subclasses: Vec<_> = config
            .entries_for("Request")
            .map(|e| e.subclass.as_str())
            .collect();
        assert_eq!(subclasses, vec!["Input", "Request"]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse(
            "[[classmap]]\nclass = \"Foo\"\nsuperclass = 'App\\Foo'\nsubclass = \"FooFacade\"\n",
            Path::new("inline"),
        )
        .expect("valid");
        assert_eq!(config.generator.output, PathBuf::from("_ide_helper.php"));
        assert_eq!(config.generator.extension, "php");
        assert_eq!(config.classmap[0].path, None);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let err = Config::parse("[generator\n", Path::new("broken.toml")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_discover_prefers_explicit_then_project() {
        let ws = TestWorkspace::new();
        let project = ws.write(
            PROJECT_CONFIG_FILE,
            "[generator]\noutput = \"project.php\"\n",
        );
        let explicit = ws.write("custom.toml", "[generator]\noutput = \"custom.php\"\n");

        let (config, source) = Config::discover(Some(&explicit), ws.root()).expect("explicit");
        assert_eq!(config.generator.output, PathBuf::from("custom.php"));
        assert_eq!(source, ConfigSource::File(explicit));

        let (config, source) = Config::discover(None, ws.root()).expect("project");
        assert_eq!(config.generator.output, PathBuf::from("project.php"));
        assert_eq!(source, ConfigSource::File(project));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let ws = TestWorkspace::new();
        let err = Config::discover(Some(&ws.root().join("nope.toml")), ws.root()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_path_match_uses_folder_suffix_and_file_name() {
        let entry = ClassMapEntry {
            class: "Application".to_string(),
            path: Some(("Foundation".to_string(), "Application.php".to_string())),
            superclass: "Illuminate\\Foundation\\Application".to_string(),
            subclass: "App".to_string(),
        };
        assert!(entry.matches_file(Path::new(
            "/vendor/laravel/src/Illuminate/Foundation/Application.php"
        )));
        assert!(!entry.matches_file(Path::new("/src/Illuminate/Console/Application.php")));
        assert!(!entry.matches_file(Path::new("/src/Illuminate/Foundation/App.php")));

        let anywhere = ClassMapEntry { path: None, ..entry };
        assert!(anywhere.matches_file(Path::new("/tmp/x.php")));
    }
}
