use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use miette::{Context, IntoDiagnostic};
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::result::{bail, Result};

/// Read the list of entries of a JSON document.
///
/// The document can either be the list itself or an object holding it
/// in its `entries` field. An object without `entries` holds no entry.
pub fn read_entries(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not read input file {}", path.display()))?;

    let json: Value = serde_json::from_str(&raw)
        .into_diagnostic()
        .wrap_err_with(|| format!("Input file {} is not valid JSON", path.display()))?;

    match json {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut obj) => match obj.remove("entries") {
            Some(Value::Array(entries)) => Ok(entries),
            Some(Value::Null) | None => Ok(vec![]),
            Some(_) => bail(format!(
                "The 'entries' field of {} is not a list",
                path.display()
            )),
        },
        _ => bail(format!(
            "Input file {} must contain a list or an object with an 'entries' list",
            path.display()
        )),
    }
}

/// Write the value as indented JSON.
///
/// The data is first written to a temporary file next to the destination,
/// which then replaces it. The destination is never left half-written.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not create a temporary file in {}", dir.display()))?;

    {
        let mut writer = BufWriter::new(file.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)
            .into_diagnostic()
            .wrap_err("Could not serialize output")?;
        writer
            .flush()
            .into_diagnostic()
            .wrap_err("Could not write output")?;
    }

    file.persist(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not write output file {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn write_input(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join("input.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_bare_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), r#"[{"id": "a"}, null]"#);

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries, vec![json!({"id": "a"}), Value::Null]);
    }

    #[test]
    fn reads_entries_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), r#"{"title": "channel", "entries": [{"id": "a"}]}"#);

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries, vec![json!({"id": "a"})]);
    }

    #[test]
    fn object_without_entries_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(dir.path(), r#"{"title": "channel"}"#);

        assert!(read_entries(&path).unwrap().is_empty());
    }

    #[test]
    fn rejects_other_documents() {
        let dir = tempfile::tempdir().unwrap();

        let scalar = write_input(dir.path(), "42");
        assert!(read_entries(&scalar).is_err());

        let bad_entries = write_input(dir.path(), r#"{"entries": "nope"}"#);
        assert!(read_entries(&bad_entries).is_err());

        let not_json = write_input(dir.path(), "[{");
        assert!(read_entries(&not_json).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(read_entries(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn writes_pretty_unicode_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_json_pretty(&path, &json!([{"name": "Café Müller"}])).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[\n  {\n    \"name\": \"Café Müller\"\n  }\n]");
    }

    #[test]
    fn overwrites_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "old content").unwrap();

        write_json_pretty(&path, &json!([])).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        // Only the output remains, the temporary file was renamed
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
