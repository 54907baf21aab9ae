//! Hand-off to the batch scheduler.

use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::AppError;
use crate::io::RunLayout;

pub const SUBMIT_PROGRAM: &str = "condor_submit_dag";

/// `condor_submit_dag -outfile_dir <log_dir> <dag>`, run from the DAG's directory.
pub fn submit_command(layout: &RunLayout, log_dir: &Path) -> Vec<String> {
    vec![
        SUBMIT_PROGRAM.to_string(),
        "-outfile_dir".to_string(),
        log_dir.display().to_string(),
        RunLayout::file_name(&layout.dag_path),
    ]
}

/// Submit the DAG. Never retried.
pub fn submit_dag(layout: &RunLayout, log_dir: &Path) -> Result<(), AppError> {
    let argv = submit_command(layout, log_dir);
    let status = Command::new(&argv[0])
        .args(&argv[1..])
        .current_dir(&layout.main_dir)
        .status()
        .map_err(|e| AppError::submission(format!("Failed to run {SUBMIT_PROGRAM}: {e}")))?;
    if !status.success() {
        return Err(AppError::submission(format!("{SUBMIT_PROGRAM} exited with {status}.")));
    }
    info!(dag = %layout.dag_path.display(), "submitted DAG");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_log_dir_and_dag() {
        let mut request = crate::graph::assemble::tests::request();
        request.output_dir = std::path::PathBuf::from("/out");
        let layout = RunLayout::new(&request).unwrap();
        assert_eq!(
            submit_command(&layout, Path::new("/logs")),
            vec!["condor_submit_dag", "-outfile_dir", "/logs", "J0534_2.dag"]
        );
    }

    #[test]
    fn missing_directory_is_submission_error() {
        let mut request = crate::graph::assemble::tests::request();
        request.output_dir = std::path::PathBuf::from("/nonexistent/followup-out");
        let layout = RunLayout::new(&request).unwrap();
        let err = submit_dag(&layout, Path::new("/logs")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Submission);
    }
}
