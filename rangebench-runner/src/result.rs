/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::path::Path;

use serde::Serialize;

/// Check that a result can later be saved at `path` without overwriting anything.
///
/// Call this before running any benchmark so a run whose result cannot be saved fails
/// before it produces output.
pub fn check_output_path(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        return Err(anyhow::Error::msg(format!(
            "Output file {} already exists. Aborting!",
            path.display()
        )));
    }

    let temp = temp_path(path);
    if Path::new(&temp).exists() {
        return Err(anyhow::Error::msg(format!(
            "Temporary file {} already exists. Aborting!",
            temp
        )));
    }
    Ok(())
}

/// Save `object` as pretty-printed JSON at `path`.
///
/// The object is first serialized to `format!("{}.temp", path)` and then renamed into
/// place so an interrupted run never leaves a half-written result behind.
///
/// This fails if:
///
/// 1. `path` already exists. Results are never overwritten.
/// 2. The temporary file already exists.
/// 3. Serialization, writing or renaming fails.
pub fn save_json<T>(path: &Path, object: &T) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
{
    check_output_path(path)?;

    let temp = temp_path(path);
    let buffer = std::fs::File::create(&temp)?;
    serde_json::to_writer_pretty(buffer, object)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> String {
    format!("{}.temp", path.display())
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Entry {
        ef_search: usize,
        recall: f64,
    }

    #[test]
    fn saves_and_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let entries = [Entry {
            ef_search: 16,
            recall: 0.5,
        }];
        save_json(&path, &entries[..]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["ef_search"], 16);
        assert_eq!(value[0]["recall"], 0.5);
        assert!(!dir.path().join("report.json.temp").exists());

        let err = save_json(&path, &entries[..]).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{err}");
    }

    #[test]
    fn refuses_stale_temporary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(dir.path().join("report.json.temp"), b"").unwrap();

        let err = save_json(&path, &1u32).unwrap_err();
        assert!(err.to_string().starts_with("Temporary file"), "{err}");
        assert!(!path.exists());
    }

    #[test]
    fn output_path_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        check_output_path(&path).unwrap();

        std::fs::write(&path, b"{}").unwrap();
        let err = check_output_path(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Output file {} already exists. Aborting!", path.display())
        );
    }
}
