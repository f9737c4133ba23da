#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{
        error::PipelineError,
        merger::{merge_tables, run_merge},
        table::Table,
        tests::fixtures::table,
    };

    fn sorted_rows(table: &Table) -> Vec<Vec<String>> {
        let mut rows = table.rows.clone();
        rows.sort();
        rows
    }

    fn parts() -> (Table, Table, Table) {
        (
            table(&["a", "b"], &[&["1", "x"], &["2", "y"]]),
            table(&["a", "b"], &[&["3", "z"]]),
            table(&["a", "b"], &[&["1", "x"], &["4", "w"]]),
        )
    }

    #[test]
    fn test_merge_is_associative_on_row_multisets() {
        let (a, b, c) = parts();

        let stepwise = merge_tables(&[merge_tables(&[a.clone(), b.clone()]), c.clone()]);
        let at_once = merge_tables(&[a.clone(), b.clone(), c.clone()]);
        let reordered = merge_tables(&[c, a, b]);

        assert_eq!(at_once.len(), 5);
        assert_eq!(sorted_rows(&stepwise), sorted_rows(&at_once));
        assert_eq!(sorted_rows(&reordered), sorted_rows(&at_once));
    }

    #[test]
    fn test_merge_header_union() {
        let merged = merge_tables(&[
            table(&["a", "b"], &[&["1", "2"]]),
            table(&["b", "c"], &[&["3", "4"]]),
        ]);

        assert_eq!(merged.headers, vec!["a", "b", "c"]);
        assert_eq!(merged.rows[0], vec!["1", "2", ""]);
        assert_eq!(merged.rows[1], vec!["", "3", "4"]);
    }

    #[test]
    fn test_run_merge_selects_by_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b, c) = parts();
        a.write_csv(&dir.path().join("one_combined.csv")).unwrap();
        b.write_csv(&dir.path().join("two_combined.csv")).unwrap();
        c.write_csv(&dir.path().join("three_base.csv")).unwrap();
        let output = dir.path().join("all.csv");

        let report = run_merge(dir.path(), &output, "_combined.csv").unwrap();
        assert_eq!(report.processed, 2);

        let merged = Table::read_csv(&output).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(sorted_rows(&merged), sorted_rows(&merge_tables(&[a, b])));
    }

    #[test]
    fn test_rerun_does_not_merge_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b, _) = parts();
        a.write_csv(&dir.path().join("one_combined.csv")).unwrap();
        b.write_csv(&dir.path().join("two_combined.csv")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let output = dir.path().join("sub").join("..").join("all_combined.csv");

        run_merge(dir.path(), &output, "_combined.csv").unwrap();
        let report = run_merge(dir.path(), &output, "_combined.csv").unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(Table::read_csv(&output).unwrap().len(), 3);
    }

    #[test]
    fn test_run_merge_without_matches_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("other.csv"), "a\n1\n").unwrap();
        let output = dir.path().join("all.csv");

        let report = run_merge(dir.path(), &output, "_flows.csv").unwrap();
        assert_eq!(report.processed, 0);
        assert!(!output.exists());
    }

    #[test]
    fn test_run_merge_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_merge(&dir.path().join("absent"), &dir.path().join("x.csv"), "_x.csv");
        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    }
}
