//! Directory and file naming for one planning run.
//!
//! ```text
//! <output_dir>/<label>/
//!   <label>_<i>.dag, <label>_<i>.sub, <label>_<i>_examine.sub
//!   SkyTemplateCount_<label>_<i>.txt
//!   <label>_commands_<i>.log
//!   <label>_<i>_run/
//!     final_sft_<label>_<i>/        materialized data for the chosen window
//!     output_results_<label>_<i>/   search job outputs
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RunRequest;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct RunLayout {
    pub base_label: String,
    pub main_dir: PathBuf,
    pub run_dir: PathBuf,
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    pub dag_path: PathBuf,
    pub search_submit_path: PathBuf,
    pub examine_submit_path: PathBuf,
    pub template_report_path: PathBuf,
    pub commands_log_path: PathBuf,
}

impl RunLayout {
    /// Resolve paths for `request`. Paths are made absolute since they are
    /// handed to jobs running on other hosts.
    pub fn new(request: &RunRequest) -> Result<Self, AppError> {
        let root = std::path::absolute(&request.output_dir).map_err(|e| {
            AppError::config(format!(
                "Invalid output directory '{}': {e}",
                request.output_dir.display()
            ))
        })?;
        Ok(Self::under(&root, request))
    }

    fn under(root: &Path, request: &RunRequest) -> Self {
        let label = &request.output_label;
        let base = request.base_label();
        let main_dir = root.join(label);
        let run_dir = main_dir.join(format!("{base}_run"));

        Self {
            data_dir: run_dir.join(format!("final_sft_{base}")),
            results_dir: run_dir.join(format!("output_results_{base}")),
            dag_path: main_dir.join(format!("{base}.dag")),
            search_submit_path: main_dir.join(format!("{base}.sub")),
            examine_submit_path: main_dir.join(format!("{base}_examine.sub")),
            template_report_path: main_dir.join(format!("SkyTemplateCount_{base}.txt")),
            commands_log_path: main_dir.join(format!("{label}_commands_{}.log", request.iteration)),
            base_label: base,
            main_dir,
            run_dir,
        }
    }

    /// Glob over the materialized data handed to the search executable.
    pub fn data_files(&self) -> String {
        format!("{}/*", self.data_dir.display())
    }

    /// Create every directory of the layout (existing ones are reused).
    pub fn create_dirs(&self) -> Result<(), AppError> {
        for dir in [&self.main_dir, &self.run_dir, &self.data_dir, &self.results_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                AppError::output(format!("Failed to create directory '{}': {e}", dir.display()))
            })?;
        }
        Ok(())
    }

    pub fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::assemble::tests::request;

    #[test]
    fn names_follow_label_and_iteration() {
        let layout = RunLayout::under(Path::new("/out"), &request());
        assert_eq!(layout.main_dir, PathBuf::from("/out/J0534"));
        assert_eq!(layout.dag_path, PathBuf::from("/out/J0534/J0534_2.dag"));
        assert_eq!(layout.examine_submit_path, PathBuf::from("/out/J0534/J0534_2_examine.sub"));
        assert_eq!(
            layout.results_dir,
            PathBuf::from("/out/J0534/J0534_2_run/output_results_J0534_2")
        );
        assert_eq!(layout.data_files(), "/out/J0534/J0534_2_run/final_sft_J0534_2/*");
        assert_eq!(
            layout.commands_log_path,
            PathBuf::from("/out/J0534/J0534_commands_2.log")
        );
        assert_eq!(RunLayout::file_name(&layout.search_submit_path), "J0534_2.sub");
    }

    #[test]
    fn relative_output_dir_becomes_absolute() {
        let mut req = request();
        req.output_dir = PathBuf::from("relative/out");
        let layout = RunLayout::new(&req).unwrap();
        assert!(layout.main_dir.is_absolute());
    }

    #[test]
    fn creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::under(dir.path(), &request());
        layout.create_dirs().unwrap();
        layout.create_dirs().unwrap();
        assert!(layout.results_dir.is_dir());
        assert!(layout.data_dir.is_dir());
    }
}
