//! Documentation pages
//!
//! Markdown pages looked up by name from a directory. Only the final path
//! component of a requested name is used, so lookups never leave the root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// Source of documentation pages
#[async_trait]
pub trait DocumentationSource: Send + Sync {
    /// Page contents, or `None` for blank names and unknown pages
    async fn get_page(&self, name: &str) -> Result<Option<String>>;
}

/// Pages stored as `{root}/{name}.md`
#[derive(Clone, Debug)]
pub struct FileDocumentation {
    root: PathBuf,
}

impl FileDocumentation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a page name to its file, stripping directory components
    pub fn page_path(&self, name: &str) -> Option<PathBuf> {
        if name.trim().is_empty() {
            return None;
        }
        let file_name = Path::new(name.trim()).file_name()?.to_str()?;
        Some(self.root.join(format!("{file_name}.md")))
    }
}

#[async_trait]
impl DocumentationSource for FileDocumentation {
    async fn get_page(&self, name: &str) -> Result<Option<String>> {
        let Some(path) = self.page_path(name) else {
            return Ok(None);
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(page = name, "Documentation page not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
