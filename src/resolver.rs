//! Path Resolver
//!
//! Locates the markup and style companions of a component script by trying
//! naming-convention candidates in the script's directory.

use std::path::{Path, PathBuf};

const MARKUP_CANDIDATES: &[&str] = &["component.html", "html"];
const STYLE_CANDIDATES: &[&str] = &["component.css", "css", "component.scss", "scss"];

/// The script file and its two companions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTriple {
    pub script: PathBuf,
    pub markup: PathBuf,
    pub style: PathBuf,
}

impl ComponentTriple {
    /// Resolve the companions of `script` against the current directory contents
    pub fn resolve(script: impl Into<PathBuf>) -> Self {
        let script = script.into();
        let (markup, style) = resolve_companions(&script);
        Self {
            script,
            markup,
            style,
        }
    }
}

/// Base name shared by a component's files: `foo.component.ts` -> `foo`
pub fn base_name(script: &Path) -> String {
    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix(".component") {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => stem,
    }
}

/// Returns `(markup, style)` for `script`.
///
/// The first candidate that exists wins. When none exists the bare name
/// (`<base>.html`, `<base>.css`) is returned even though it is absent.
pub fn resolve_companions(script: &Path) -> (PathBuf, PathBuf) {
    let dir = script.parent().unwrap_or_else(|| Path::new(""));
    let base = base_name(script);

    let markup = probe(dir, &base, MARKUP_CANDIDATES)
        .unwrap_or_else(|| dir.join(format!("{}.html", base)));
    let style =
        probe(dir, &base, STYLE_CANDIDATES).unwrap_or_else(|| dir.join(format!("{}.css", base)));

    (markup, style)
}

fn probe(dir: &Path, base: &str, suffixes: &[&str]) -> Option<PathBuf> {
    suffixes
        .iter()
        .map(|suffix| dir.join(format!("{}.{}", base, suffix)))
        .find(|candidate| candidate.exists())
}
