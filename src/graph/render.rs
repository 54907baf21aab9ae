//! Text rendering for the batch scheduler.
//!
//! Output is a Condor DAG plus two submit descriptors. Rendering is pure and
//! deterministic: identical graphs give byte-identical text.

use std::path::Path;

use crate::domain::JobGraph;

/// Render the DAG.
///
/// `search_submit` / `examine_submit` are the submit descriptor file names
/// (relative to the DAG's directory).
pub fn render_dag(graph: &JobGraph, search_submit: &str, examine_submit: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("# DAG for base_name = {}\n", graph.label));

    for job in &graph.search_jobs {
        out.push_str(&format!("JOB {} {search_submit}\n", job.id));
        out.push_str(&format!("VARS {} JobID=\"{}\" argList=\"{}\"\n", job.id, job.cell.index, job.args));
        out.push('\n');
    }

    let agg = &graph.aggregation;
    out.push_str(&format!("JOB {} {examine_submit}\n", agg.id));
    out.push_str(&format!("VARS {} JobID=\"0\" argList=\"{}\"\n", agg.id, agg.args));
    out.push('\n');

    let parents = graph.predecessors();
    if !parents.is_empty() {
        out.push_str(&format!("PARENT {} CHILD {}\n", parents.join(" "), agg.id));
    }
    out
}

/// Submit descriptor for the search jobs.
pub fn render_search_submit(executable: &Path, base_label: &str, log_dir: &Path) -> String {
    render_submit(
        "standard",
        executable,
        &format!("node_{base_label}_A.out.$(JobID)"),
        &format!("node_{base_label}_A.err.$(JobID)"),
        &log_dir.join(format!("{base_label}.log")),
    )
}

/// Submit descriptor for the aggregation (examine) job.
pub fn render_examine_submit(executable: &Path, base_label: &str, log_dir: &Path) -> String {
    render_submit(
        "vanilla",
        executable,
        &format!("node_examine_{base_label}.out.$(JobID)"),
        &format!("node_examine_{base_label}.err.$(JobID)"),
        &log_dir.join(format!("{base_label}.log")),
    )
}

fn render_submit(universe: &str, executable: &Path, output: &str, error: &str, log: &Path) -> String {
    let mut out = String::new();
    out.push_str(&format!("universe = {universe}\n"));
    out.push_str(&format!("executable = {}\n", executable.display()));
    out.push_str(&format!("output = {output}\n"));
    out.push_str(&format!("error = {error}\n"));
    out.push_str(&format!("log = {}\n", log.display()));
    out.push('\n');
    out.push_str("arguments = $(argList)\n");
    out.push_str("queue\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AggregationJob, Band, Edge, JobCell, ParameterRegion, SearchJob};

    fn tiny_graph(n: usize) -> JobGraph {
        let region = ParameterRegion {
            alpha: Band::point(0.0),
            delta: Band::point(0.0),
            f0: Band::point(100.0),
            f1: Band::point(0.0),
            f2: Band::point(0.0),
            f3: Band::point(0.0),
        };
        let search_jobs: Vec<SearchJob> = (0..n)
            .map(|i| SearchJob {
                id: format!("A{i}"),
                cell: JobCell {
                    index: i,
                    alpha_index: i,
                    delta_index: 0,
                    spindown_index: 0,
                    region,
                    result_basename: format!("t_0_result_{i}"),
                    loudest_basename: format!("t_0_loudest_{i}"),
                },
                args: format!("--Alpha {i}"),
            })
            .collect();
        let edges = search_jobs
            .iter()
            .map(|j| Edge {
                parent: j.id.clone(),
                child: "B0".to_string(),
            })
            .collect();
        JobGraph {
            label: "t_0".to_string(),
            search_jobs,
            aggregation: AggregationJob {
                id: "B0".to_string(),
                inputs: vec![],
                args: "-j 2".to_string(),
            },
            edges,
        }
    }

    #[test]
    fn dag_lists_jobs_vars_and_fan_in() {
        let dag = render_dag(&tiny_graph(2), "t_0.sub", "t_0_examine.sub");
        let expected = "\
# DAG for base_name = t_0
JOB A0 t_0.sub
VARS A0 JobID=\"0\" argList=\"--Alpha 0\"

JOB A1 t_0.sub
VARS A1 JobID=\"1\" argList=\"--Alpha 1\"

JOB B0 t_0_examine.sub
VARS B0 JobID=\"0\" argList=\"-j 2\"

PARENT A0 A1 CHILD B0
";
        assert_eq!(dag, expected);
    }

    #[test]
    fn submit_descriptors_reference_executables() {
        let search = render_search_submit(Path::new("/bin/search"), "t_0", Path::new("/logs"));
        assert!(search.starts_with("universe = standard\nexecutable = /bin/search\n"));
        assert!(search.contains("log = /logs/t_0.log\n"));
        assert!(search.ends_with("arguments = $(argList)\nqueue\n"));

        let examine = render_examine_submit(Path::new("/bin/examine"), "t_0", Path::new("/logs"));
        assert!(examine.starts_with("universe = vanilla\nexecutable = /bin/examine\n"));
        assert!(examine.contains("error = node_examine_t_0.err.$(JobID)\n"));
    }

    #[test]
    fn search_submit_text_is_exact() {
        let search = render_search_submit(Path::new("/bin/search"), "t_0", Path::new("/logs"));
        let expected = "\
universe = standard
executable = /bin/search
output = node_t_0_A.out.$(JobID)
error = node_t_0_A.err.$(JobID)
log = /logs/t_0.log

arguments = $(argList)
queue
";
        assert_eq!(search, expected);
    }
}
