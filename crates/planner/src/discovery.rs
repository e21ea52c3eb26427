//! Finding plan files on disk.

use chrono::NaiveDateTime;
use spoolctl_config::AppConfig;
use spoolctl_core::PlanError;
use spoolctl_core::plan::PlanFile;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A plan file and where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredPlan {
    pub path: PathBuf,
    pub plan: PlanFile,
}

impl DiscoveredPlan {
    pub fn save(&self) -> Result<(), PlanError> {
        self.plan.save(&self.path)
    }
}

/// Directories searched for plans: `cwd`, then `plans_dir`, then (optionally) `pause_dir`.
pub fn search_dirs(config: &AppConfig, cwd: Option<&Path>, include_paused: bool) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = cwd.map(Path::to_path_buf).into_iter().collect();
    dirs.extend(config.plans_dir.clone());
    if include_paused {
        dirs.extend(config.pause_dir.clone());
    }
    dirs
}

/// Load every `*.toml` plan with at least one project from `dirs`.
///
/// A file reached through two directories is loaded once. Files that fail to
/// parse are skipped with a warning.
pub fn discover(dirs: &[PathBuf]) -> Vec<DiscoveredPlan> {
    let mut seen = HashSet::new();
    let mut plans = Vec::new();

    for dir in dirs {
        let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.clone());
        let Ok(entries) = std::fs::read_dir(&dir) else {
            debug!(dir = %dir.display(), "Skipping unreadable plan directory");
            continue;
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_toml_extension(p))
            .collect();
        paths.sort();

        for path in paths {
            let path = std::fs::canonicalize(&path).unwrap_or(path);
            if !seen.insert(path.clone()) {
                continue;
            }
            match PlanFile::load(&path) {
                Ok(plan) if !plan.projects.is_empty() => {
                    plans.push(DiscoveredPlan { path, plan });
                }
                Ok(_) => debug!(path = %path.display(), "Ignoring TOML file without projects"),
                Err(e) => warn!("{e}"),
            }
        }
    }
    plans
}

fn has_toml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// Move a plan file into `pause_dir`, keeping its file name.
pub fn pause_plan(path: &Path, pause_dir: Option<&Path>) -> Result<PathBuf, PlanError> {
    let dir = pause_dir.ok_or(PlanError::DirNotConfigured("pause_dir"))?;
    let name = path.file_name().unwrap_or(path.as_os_str());
    relocate_file(path, &dir.join(name))
}

/// Move a finished plan into `archive_dir` as `<stem>-<YYYYmmddHHMMSS>.<ext>`.
///
/// Returns `Ok(None)` and leaves the file alone when a project is still open.
pub fn archive_plan(
    discovered: &DiscoveredPlan,
    archive_dir: Option<&Path>,
    at: NaiveDateTime,
) -> Result<Option<PathBuf>, PlanError> {
    let dir = archive_dir.ok_or(PlanError::DirNotConfigured("archive_dir"))?;
    if !discovered.plan.is_finished() {
        return Ok(None);
    }
    let path = &discovered.path;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}-{}", at.format("%Y%m%d%H%M%S"));
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    relocate_file(path, &dir.join(name)).map(Some)
}

fn relocate_file(from: &Path, to: &Path) -> Result<PathBuf, PlanError> {
    let err = |e: std::io::Error| PlanError::Relocate {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        reason: e.to_string(),
    };
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(err)?;
    }
    std::fs::rename(from, to).map_err(err)?;
    debug!(from = %from.display(), to = %to.display(), "Moved plan file");
    Ok(to.to_path_buf())
}

/// Short display form: `./x.toml`, `<plans>/x.toml`, `<paused>/x.toml`, `<archive>/x.toml`.
pub fn display_path(path: &Path, config: &AppConfig, cwd: Option<&Path>) -> String {
    let canonical = |p: &Path| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    let path = canonical(path);

    let prefixes = [
        (config.pause_dir.as_deref(), "<paused>"),
        (cwd, "."),
        (config.plans_dir.as_deref(), "<plans>"),
        (config.archive_dir.as_deref(), "<archive>"),
    ];
    for (dir, label) in prefixes {
        let Some(dir) = dir else { continue };
        if let Ok(rel) = path.strip_prefix(canonical(dir)) {
            return format!("{label}/{}", rel.display());
        }
    }
    path.display().to_string()
}
