use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::BatchError;

/// One entry of the input file list: a file, or a directory filtered by masks.
///
/// Masks are regular expressions that must match the whole file name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSpec {
    pub path: PathBuf,
    /// Files of a directory to include (all when absent)
    pub mask: Option<String>,
    /// Files of a directory to leave out
    pub exclude_mask: Option<String>,
    /// Fail the resolution when this entry yields nothing
    pub required: bool,
    pub include_subfolders: bool,
}

impl FileSpec {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn mask<S: Into<String>>(mut self, mask: S) -> Self {
        self.mask = Some(mask.into());
        self
    }

    pub fn exclude_mask<S: Into<String>>(mut self, mask: S) -> Self {
        self.exclude_mask = Some(mask.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn include_subfolders(mut self, include: bool) -> Self {
        self.include_subfolders = include;
        self
    }
}

/// Compiles a file mask anchored on both ends.
fn compile_mask(mask: Option<&str>) -> Result<Option<Regex>, BatchError> {
    match mask.map(str::trim).filter(|mask| !mask.is_empty()) {
        None => Ok(None),
        Some(mask) => Regex::new(&format!("^(?:{})$", mask))
            .map(Some)
            .map_err(|e| BatchError::Configuration(format!("Invalid file mask '{}': {}", mask, e))),
    }
}

/// The files designated by a list of [`FileSpec`].
///
/// # Examples
///
/// ```no_run
/// use xbase_batch_rs::item::xbase::file_list::{FileInputList, FileSpec};
///
/// let files = FileInputList::resolve(&[
///     FileSpec::new("/data/exports")
///         .mask(r".*\.dbf")
///         .exclude_mask(r"tmp_.*")
///         .required(true),
///     FileSpec::new("/data/extra/customers.dbf"),
/// ])
/// .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct FileInputList {
    files: Vec<PathBuf>,
    non_existent_files: Vec<PathBuf>,
    non_accessible_files: Vec<PathBuf>,
}

impl FileInputList {
    /// Expands every spec without failing on missing entries.
    ///
    /// Required entries that yield nothing are recorded in
    /// [`non_existent_files`](Self::non_existent_files) or
    /// [`non_accessible_files`](Self::non_accessible_files).
    ///
    /// # Errors
    /// [`BatchError::Configuration`] when a mask is not a valid regular expression.
    pub fn create(specs: &[FileSpec]) -> Result<Self, BatchError> {
        let mut list = Self::default();

        for spec in specs {
            let mask = compile_mask(spec.mask.as_deref())?;
            let exclude = compile_mask(spec.exclude_mask.as_deref())?;
            list.add(spec, mask.as_ref(), exclude.as_ref());
        }

        Ok(list)
    }

    /// Expands every spec and fails when a required entry yields nothing.
    ///
    /// # Errors
    /// [`BatchError::Configuration`] listing the missing or unreadable required files.
    pub fn resolve(specs: &[FileSpec]) -> Result<Vec<PathBuf>, BatchError> {
        let list = Self::create(specs)?;

        if !list.non_existent_files.is_empty() || !list.non_accessible_files.is_empty() {
            let mut problems = Vec::new();
            if !list.non_existent_files.is_empty() {
                problems.push(format!(
                    "required files not found: {}",
                    join_paths(&list.non_existent_files)
                ));
            }
            if !list.non_accessible_files.is_empty() {
                problems.push(format!(
                    "required files not accessible: {}",
                    join_paths(&list.non_accessible_files)
                ));
            }
            return Err(BatchError::Configuration(problems.join("; ")));
        }

        Ok(list.files)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn non_existent_files(&self) -> &[PathBuf] {
        &self.non_existent_files
    }

    pub fn non_accessible_files(&self) -> &[PathBuf] {
        &self.non_accessible_files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn add(&mut self, spec: &FileSpec, mask: Option<&Regex>, exclude: Option<&Regex>) {
        let path = spec.path.as_path();

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                let missing = e.kind() == ErrorKind::NotFound;
                if spec.required {
                    if missing {
                        self.non_existent_files.push(path.to_path_buf());
                    } else {
                        self.non_accessible_files.push(path.to_path_buf());
                    }
                } else {
                    warn!("Skipping input {}: {}", path.display(), e);
                }
                return;
            }
        };

        if metadata.is_file() {
            debug!("Adding input file {}", path.display());
            self.files.push(path.to_path_buf());
            return;
        }

        let mut found = Vec::new();
        if let Err(e) = list_directory(path, mask, exclude, spec.include_subfolders, &mut found) {
            if spec.required {
                self.non_accessible_files.push(path.to_path_buf());
            } else {
                warn!("Skipping directory {}: {}", path.display(), e);
            }
            return;
        }

        if found.is_empty() {
            if spec.required {
                self.non_existent_files.push(path.to_path_buf());
            } else {
                warn!("No file matched in {}", path.display());
            }
            return;
        }

        found.sort();
        debug!("{} input files matched in {}", found.len(), path.display());
        self.files.extend(found);
    }
}

fn list_directory(
    dir: &Path,
    mask: Option<&Regex>,
    exclude: Option<&Regex>,
    recursive: bool,
    found: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let entry_path = entry.path();

        // Links to directories are not followed, they may lead back up the tree
        if file_type.is_symlink() && entry_path.is_dir() {
            debug!("Skipping linked directory {}", entry_path.display());
            continue;
        }

        if file_type.is_dir() {
            if recursive {
                list_directory(&entry_path, mask, exclude, recursive, found)?;
            }
            continue;
        }

        let name = entry_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let included = mask.is_none_or(|mask| mask.is_match(&name));
        let excluded = exclude.is_some_and(|exclude| exclude.is_match(&name));

        if included && !excluded {
            found.push(entry_path);
        }
    }

    Ok(())
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
