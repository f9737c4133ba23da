#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    use crate::{
        config::ExtractConfig,
        error::{ErrorKind, PipelineError},
        extractor::{find_captures, label_for, run_extract},
        table::Table,
        tests::fixtures::{column, sample_capture},
    };

    fn capture_tree(root: &Path) {
        for folder in ["Normal", "UnknownAttackXYZ"] {
            fs::create_dir_all(root.join(folder)).unwrap();
        }
        sample_capture(&root.join("Normal").join("normal_1.pcap"));
        sample_capture(&root.join("UnknownAttackXYZ").join("mystery.pcap"));
        fs::write(root.join("Normal").join("readme.txt"), "not a capture").unwrap();
    }

    #[test]
    fn test_label_for_uses_parent_folder() {
        let mut mapping = BTreeMap::new();
        mapping.insert("NormalDdos".to_string(), "ddos".to_string());

        assert_eq!(
            label_for(Path::new("/data/NormalDdos/a.pcap"), &mapping).unwrap(),
            "ddos"
        );
        assert!(matches!(
            label_for(Path::new("/data/UnknownAttackXYZ/a.pcap"), &mapping),
            Err(PipelineError::UnmappedLabel(folder)) if folder == "UnknownAttackXYZ"
        ));
    }

    #[test]
    fn test_find_captures_walks_recursively() {
        let root = tempfile::tempdir().unwrap();
        capture_tree(root.path());
        fs::create_dir_all(root.path().join("Normal").join("deeper")).unwrap();
        fs::write(root.path().join("Normal").join("deeper").join("x.PCAPNG"), b"").unwrap();

        let captures = find_captures(root.path(), &ExtractConfig::default().extensions).unwrap();
        let names: Vec<String> = captures
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["x.PCAPNG", "normal_1.pcap", "mystery.pcap"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_captures_ignores_symlinked_folders() {
        let root = tempfile::tempdir().unwrap();
        capture_tree(root.path());
        std::os::unix::fs::symlink(root.path(), root.path().join("Normal").join("loop")).unwrap();

        let captures = find_captures(root.path(), &ExtractConfig::default().extensions).unwrap();
        assert_eq!(captures.len(), 2);
    }

    #[test]
    fn test_unmapped_folder_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        capture_tree(root.path());

        let report = run_extract(root.path(), output.path(), &ExtractConfig::default()).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped_of(ErrorKind::UnmappedLabel), 1);
        assert!(output.path().join("normal_1_base.csv").exists());
        assert!(!output.path().join("mystery_base.csv").exists());
    }

    #[test]
    fn test_base_csv_contents() {
        let root = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        capture_tree(root.path());
        run_extract(root.path(), output.path(), &ExtractConfig::default()).unwrap();

        let base = Table::read_csv(&output.path().join("normal_1_base.csv")).unwrap();
        assert_eq!(
            base.headers,
            vec![
                "src-ip",
                "dst-ip",
                "src-port",
                "dst-port",
                "protocol",
                "stime",
                "dns-query",
                "dns-rejected",
                "dns-RD",
                "state",
                "service",
                "http-status-code",
                "src-ip-bytes",
                "dst-ip-bytes",
                "src2dst_packets",
                "dst2src_packets",
                "label"
            ]
        );
        assert_eq!(base.len(), 2);
        assert_eq!(column(&base, "dst-port"), vec!["53", "80"]);
        assert_eq!(column(&base, "dns-query"), vec!["example.com", ""]);
        assert_eq!(column(&base, "dns-RD"), vec!["1", "0"]);
        assert_eq!(column(&base, "state"), vec!["SF", "S0"]);
        assert_eq!(column(&base, "service"), vec!["dns", "http"]);
        assert_eq!(column(&base, "http-status-code"), vec!["-1", "-1"]);
        assert_eq!(column(&base, "dst2src_packets"), vec!["1", "0"]);
        assert_eq!(column(&base, "label"), vec!["normal", "normal"]);
    }

    #[test]
    fn test_existing_output_is_not_recomputed() {
        let root = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        capture_tree(root.path());
        fs::write(output.path().join("normal_1_base.csv"), "kept\n").unwrap();

        let report = run_extract(root.path(), output.path(), &ExtractConfig::default()).unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(report.already_done, 1);
        assert_eq!(
            fs::read_to_string(output.path().join("normal_1_base.csv")).unwrap(),
            "kept\n"
        );
    }

    #[test]
    fn test_unreadable_capture_is_counted() {
        let root = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("MITM")).unwrap();
        fs::write(root.path().join("MITM").join("broken.pcap"), b"not a pcap").unwrap();

        let report = run_extract(root.path(), output.path(), &ExtractConfig::default()).unwrap();
        assert_eq!(report.skipped_of(ErrorKind::Io), 1);
        assert!(!output.path().join("broken_base.csv").exists());
    }

    #[test]
    fn test_missing_capture_folder() {
        let output = tempfile::tempdir().unwrap();
        let result = run_extract(
            &output.path().join("PCAP"),
            output.path(),
            &ExtractConfig::default(),
        );
        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    }
}
