//! View template location.

use std::collections::HashSet;
use std::path::PathBuf;

/// Resolves candidate view names to concrete template files. View loading
/// and rendering happen outside the core; this contract only answers
/// "does this candidate exist, and where".
pub trait TemplateLocator: Send + Sync {
    fn resolve_view(&self, candidate: &str) -> Option<PathBuf>;
}

/// Looks candidates up as files beneath one or more root directories.
pub struct DirTemplateLocator {
    roots: Vec<PathBuf>,
    extension: String,
}

impl DirTemplateLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirTemplateLocator {
            roots: vec![root.into()],
            extension: "html".into(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn add_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }
}

impl TemplateLocator for DirTemplateLocator {
    fn resolve_view(&self, candidate: &str) -> Option<PathBuf> {
        for root in &self.roots {
            let path = root.join(format!("{candidate}.{}", self.extension));
            if path.is_file() {
                return Some(path);
            }
        }
        None
    }
}

/// Locator answering from a fixed name set; used by tests.
#[derive(Default)]
pub struct StaticTemplateLocator {
    known: HashSet<String>,
}

impl StaticTemplateLocator {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        StaticTemplateLocator {
            known: names.into_iter().map(str::to_string).collect(),
        }
    }
}

impl TemplateLocator for StaticTemplateLocator {
    fn resolve_view(&self, candidate: &str) -> Option<PathBuf> {
        self.known
            .contains(candidate)
            .then(|| PathBuf::from(format!("{candidate}.html")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_locator_answers_its_name_set() {
        let locator = StaticTemplateLocator::new(["widget/search", "displayview"]);
        assert!(locator.resolve_view("widget/search").is_some());
        assert!(locator.resolve_view("widget/edit").is_none());
    }
}
