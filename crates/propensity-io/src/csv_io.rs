use crate::IoResult;
use propensity_core::{Column, Frame};
use std::path::Path;

/// Cell spellings treated as missing, following the usual CSV conventions.
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan"];

/// Read a CSV file into a raw [`Frame`]; the header row names the columns.
pub fn read_frame(path: impl AsRef<Path>) -> IoResult<Frame> {
    let mut rdr = csv::Reader::from_path(path.as_ref())?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record?;
        for (j, field) in record.iter().enumerate() {
            let trimmed = field.trim();
            let cell = if NULL_MARKERS.contains(&trimmed) {
                None
            } else {
                Some(trimmed.to_string())
            };
            columns[j].push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Frame::new(columns)?)
}

/// Write predicted labels for the unlabeled table, one row per input row.
pub fn write_predictions(
    path: impl AsRef<Path>,
    target: &str,
    labels: &[String],
) -> IoResult<()> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    wtr.write_record(["index", target])?;
    for (i, label) in labels.iter().enumerate() {
        wtr.write_record([i.to_string().as_str(), label.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("propensity-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_read_frame_with_nulls() {
        let path = temp_path("read.csv");
        fs::write(&path, "age,job\n30,admin\nNA,services\n45,\n").unwrap();

        let frame = read_frame(&path).unwrap();
        assert_eq!(frame.names(), vec!["age", "job"]);
        assert_eq!(frame.n_rows(), 3);

        let age = frame.column("age").unwrap();
        assert_eq!(age.null_count(), 1);
        assert!(age.is_numeric());

        let job = frame.column("job").unwrap();
        assert_eq!(job.values()[2], None);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_predictions() {
        let path = temp_path("pred.csv");
        let labels = vec!["no".to_string(), "yes".to_string()];
        write_predictions(&path, "responded", &labels).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "index,responded\n0,no\n1,yes\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        assert!(read_frame(temp_path("does-not-exist.csv")).is_err());
    }
}
