//! Plugin registry for extension-based reader dispatch.
//!
//! The registry provides a centralized way to:
//! - Enumerate the reader plugins this crate ships
//! - Look a plugin up by name or file extension
//! - Create a reader for a path, confirmed by [`ImageInput::valid_file`]
//!
//! # Example
//!
//! ```ignore
//! use hdk_io::registry::PluginRegistry;
//!
//! let registry = PluginRegistry::global();
//! assert!(registry.supports_extension("rat"));
//!
//! let mut input = registry.create_for_path("beauty.pic".as_ref(), library)?;
//! let spec = input.open("beauty.pic".as_ref())?;
//! ```

use crate::img::ImgLibrary;
use crate::{HoudiniInput, ImageInput, IoError, IoResult, RatInput};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Boxed reader as handed out by the registry.
pub type BoxedInput = Box<dyn ImageInput + Send>;

/// Plugin entry in the registry.
#[derive(Clone)]
pub struct PluginInfo {
    /// Format name as reported by the reader.
    pub name: &'static str,
    /// File extensions without dots.
    pub extensions: &'static [&'static str],
    /// Creates a closed reader.
    pub create: fn(Arc<dyn ImgLibrary>) -> BoxedInput,
}

impl std::fmt::Debug for PluginInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInfo")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Central registry of reader plugins.
#[derive(Debug)]
pub struct PluginRegistry {
    plugins: HashMap<&'static str, Arc<PluginInfo>>,
    by_extension: HashMap<&'static str, &'static str>,
}

impl PluginRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Returns the global registry instance with built-in plugins.
    pub fn global() -> &'static PluginRegistry {
        static INSTANCE: OnceLock<PluginRegistry> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let mut registry = PluginRegistry::new();
            registry.register_builtin_plugins();
            registry
        })
    }

    /// Registers built-in plugins.
    ///
    /// The legacy reader goes first so the full reader owns `rat`.
    fn register_builtin_plugins(&mut self) {
        self.register(PluginInfo {
            name: "rat",
            extensions: &["rat"],
            create: |lib| Box::new(RatInput::new(lib)),
        });

        self.register(PluginInfo {
            name: "Houdini (pic/rat)",
            extensions: &["rat", "pic"],
            create: |lib| Box::new(HoudiniInput::new(lib)),
        });
    }

    /// Registers a plugin. Later registrations take over shared extensions.
    pub fn register(&mut self, info: PluginInfo) {
        let name = info.name;
        for &ext in info.extensions {
            self.by_extension.insert(ext, name);
        }
        self.plugins.insert(name, Arc::new(info));
    }

    /// Returns an iterator over registered plugin names.
    pub fn format_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }

    /// Returns plugin info by name.
    pub fn get(&self, name: &str) -> Option<&PluginInfo> {
        self.plugins.get(name).map(|arc| arc.as_ref())
    }

    /// Returns plugin info by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<&PluginInfo> {
        let ext_lower = ext.to_lowercase();
        self.by_extension
            .get(ext_lower.as_str())
            .and_then(|name| self.plugins.get(name))
            .map(|arc| arc.as_ref())
    }

    /// Checks if an extension is supported.
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.by_extension.contains_key(ext.to_lowercase().as_str())
    }

    /// Creates a reader by plugin name.
    pub fn create(&self, name: &str, library: Arc<dyn ImgLibrary>) -> Option<BoxedInput> {
        self.get(name).map(|info| (info.create)(library))
    }

    /// Creates a reader by file extension.
    pub fn create_by_extension(
        &self,
        ext: &str,
        library: Arc<dyn ImgLibrary>,
    ) -> Option<BoxedInput> {
        self.get_by_extension(ext).map(|info| (info.create)(library))
    }

    /// Creates a reader for `path`.
    ///
    /// Picks the plugin by extension, then checks the file with it.
    pub fn create_for_path(
        &self,
        path: &Path,
        library: Arc<dyn ImgLibrary>,
    ) -> IoResult<BoxedInput> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let input = self.create_by_extension(ext, library).ok_or_else(|| {
            IoError::UnsupportedFormat(format!("no reader for extension \"{ext}\""))
        })?;
        input.check_file(path)?;
        Ok(input)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
