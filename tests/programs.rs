mod common;

#[cfg(test)]
mod program_tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use walkdir::WalkDir;

    use crate::common::run_source;

    fn programs_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("programs")
    }

    /// Every `*.lox` file under `tests/programs` is run and its combined output
    /// compared with the sibling `*.lox.out` file. Program output comes first,
    /// then diagnostics, then an `exit: N` line when the code is non-zero.
    #[test]
    fn sample_programs_match_expected_output() {
        let mut checked: usize = 0;

        for entry in WalkDir::new(programs_dir()).sort_by_file_name() {
            let entry = entry.expect("walk tests/programs");
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("lox") {
                continue;
            }

            let source = fs::read_to_string(path).expect("read program");
            let expected_path = path.with_extension("lox.out");
            let expected = fs::read_to_string(&expected_path)
                .unwrap_or_else(|_| panic!("missing expected output {:?}", expected_path));

            let (out, err, code) = run_source(&source);

            let mut actual = out + &err;
            if code != 0 {
                actual.push_str(&format!("exit: {}\n", code));
            }

            assert_eq!(actual, expected, "output mismatch for {:?}", path);
            checked += 1;
        }

        assert!(checked > 0, "no programs found in {:?}", programs_dir());
    }
}
