use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::ResistError;
use crate::ResistResult;
use crate::config::ResistConfig;
use crate::engine::DirectiveResolution;
use crate::engine::SharedReference;

/// Options for controlling which documents are scanned.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
	/// Gitignore-style patterns to exclude from scanning.
	pub exclude_patterns: Vec<String>,
	/// Glob patterns restricting which files to include. Empty means every
	/// markdown document.
	pub include_set: GlobSet,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
}

impl ScanOptions {
	pub fn from_config(config: &ResistConfig) -> Self {
		Self {
			exclude_patterns: config.exclude.patterns.clone(),
			include_set: build_glob_set(&config.include.patterns),
			disable_gitignore: config.exclude.disable_gitignore,
		}
	}
}

/// Resolutions of every directive in one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
	pub file: PathBuf,
	pub directives: Vec<DirectiveResolution>,
}

/// Collect every markdown document under `root` that the configuration
/// selects, sorted by path.
pub fn collect_documents(root: &Path, config: &ResistConfig) -> ResistResult<Vec<PathBuf>> {
	collect_files(root, &ScanOptions::from_config(config))
}

/// Resolve the directives of each file in `files`. Files without directives
/// are left out of the report. When the reference data cannot be loaded no
/// directive produces a table and the report is empty.
pub fn resolve_files(
	reference: &SharedReference,
	files: &[PathBuf],
) -> ResistResult<Vec<DocumentReport>> {
	let mut reports = Vec::new();
	for file in files {
		let content = std::fs::read_to_string(file)?;
		let content = normalize_line_endings(&content);
		let directives = reference.resolve_document(&content)?;
		if directives.is_empty() {
			continue;
		}

		tracing::debug!(file = %file.display(), directives = directives.len(), "resolved document");
		reports.push(DocumentReport {
			file: file.clone(),
			directives,
		});
	}

	Ok(reports)
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Build a `GlobSet` from a list of glob pattern strings. Invalid patterns
/// are skipped.
fn build_glob_set(patterns: &[String]) -> GlobSet {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		match Glob::new(pattern) {
			Ok(glob) => {
				builder.add(glob);
			}
			Err(error) => tracing::warn!(%pattern, %error, "ignoring invalid include pattern"),
		}
	}
	builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Build a `Gitignore` matcher from the `[exclude]` patterns. These follow
/// `.gitignore` syntax and are applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> ResistResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			ResistError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| ResistError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		if let Some(error) = builder.add(&gitignore_path) {
			tracing::warn!(path = %gitignore_path.display(), %error, "unreadable .gitignore");
		}
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn collect_files(root: &Path, options: &ScanOptions) -> ResistResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	let gitignore = if options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let exclude = build_exclude_matcher(root, &options.exclude_patterns)?;
	let walker = Walker {
		root,
		gitignore: &gitignore,
		exclude: &exclude,
		include_set: &options.include_set,
	};

	walker.walk(root, &mut files, &mut visited_dirs)?;
	files.sort();

	Ok(files)
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

struct Walker<'a> {
	root: &'a Path,
	gitignore: &'a Gitignore,
	exclude: &'a Gitignore,
	include_set: &'a GlobSet,
}

impl Walker<'_> {
	fn walk(
		&self,
		dir: &Path,
		files: &mut Vec<PathBuf>,
		visited_dirs: &mut HashSet<PathBuf>,
	) -> ResistResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !visited_dirs.insert(canonical) {
			return Err(ResistError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();

			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_directory_name(name) {
					continue;
				}
			}

			let is_dir = path.is_dir();
			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				self.walk(&path, files, visited_dirs)?;
			} else if is_markdown_file(&path) && self.is_included(&path) {
				files.push(path);
			}
		}

		Ok(())
	}

	fn is_included(&self, path: &Path) -> bool {
		if self.include_set.is_empty() {
			return true;
		}

		path.strip_prefix(self.root)
			.is_ok_and(|relative| self.include_set.is_match(relative))
	}
}

/// Check if a file is a markdown document that may hold directives.
pub fn is_markdown_file(path: &Path) -> bool {
	let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
		return false;
	};

	matches!(ext, "md" | "mdx" | "markdown")
}
