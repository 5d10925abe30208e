use std::path::Path;

use anyhow::{bail, Context, Result};

/// Read one document per row from the named column of a CSV file. The rest
/// of the pipeline only ever sees the resulting strings.
pub fn load_documents(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from {}", path.display()))?
        .clone();

    let Some(col) = headers.iter().position(|h| h == column) else {
        bail!(
            "column '{}' not found in {}; available columns: {}",
            column,
            path.display(),
            headers.iter().collect::<Vec<_>>().join(", ")
        );
    };

    let mut docs = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("failed to read row {} of {}", i + 1, path.display()))?;
        docs.push(record.get(col).unwrap_or("").to_string());
    }

    if docs.is_empty() {
        bail!("{} contained no documents", path.display());
    }

    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_the_named_column_in_row_order() {
        let file = write_csv("title,plot_synopsis\nA,first plot\nB,second plot\n");
        let docs = load_documents(file.path(), "plot_synopsis").unwrap();
        assert_eq!(docs, vec!["first plot", "second plot"]);
    }

    #[test]
    fn missing_column_lists_the_available_headers() {
        let file = write_csv("title,summary\nA,first\n");
        let err = load_documents(file.path(), "plot_synopsis").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("plot_synopsis"));
        assert!(message.contains("summary"));
    }

    #[test]
    fn empty_file_is_an_error() {
        let file = write_csv("title,plot_synopsis\n");
        assert!(load_documents(file.path(), "plot_synopsis").is_err());
    }
}
