use anyhow::Context;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

// Fails if non-test source contains literal-range slices like `text[..50]`
// or `id.to_string()[..8]`, which panic on UTF-8 boundaries. Truncation goes
// through `utils::string::preview` instead. Only numeric literal ranges are
// flagged, so `&buf[..n]` passes. Unit-test modules are skipped because they
// slice `Vec`s with literal ranges freely.

fn visit_rs_files(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read_dir failed: {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            visit_rs_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(())
}

#[test]
fn no_literal_byte_index_string_slices() -> anyhow::Result<()> {
    let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");

    let re_literal_range = Regex::new(r"\[\s*\.\.\s*\d+\s*\]")?;
    let re_leading_range = Regex::new(r"\[\s*\d+\s*\.\.\s*\]")?;
    let re_to_string_slice = Regex::new(r"to_string\(\)\s*\[\s*\.\.\s*\d+\s*\]")?;
    let mut failures: Vec<String> = Vec::new();

    let mut files: Vec<PathBuf> = Vec::new();
    visit_rs_files(&src_dir, &mut files)?;
    assert!(!files.is_empty(), "no sources found under {}", src_dir.display());

    for path in files {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        for (i, line) in text.lines().enumerate() {
            if line.trim_start().starts_with("#[cfg(test)]") {
                break;
            }
            if re_literal_range.is_match(line)
                || re_leading_range.is_match(line)
                || re_to_string_slice.is_match(line)
            {
                failures.push(format!("{}:{}: {}", path.display(), i + 1, line.trim()));
            }
        }
    }

    if !failures.is_empty() {
        anyhow::bail!(
            "Found unsafe literal-range slices in source files:\n{}",
            failures.join("\n")
        );
    }

    Ok(())
}
