use crate::IoResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Persist any serializable artifact (fitted pipeline, model weights) as
/// pretty-printed JSON.
pub fn save_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> IoResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path.as_ref(), json)?;
    Ok(())
}

/// Load an artifact previously written with [`save_json`].
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> IoResult<T> {
    let json = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use propensity_core::Matrix;
    use std::fs;

    #[test]
    fn test_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "propensity-{}-weights.json",
            std::process::id()
        ));

        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        save_json(&m, &path).unwrap();
        let loaded: Matrix = load_json(&path).unwrap();
        assert_eq!(loaded, m);

        fs::remove_file(&path).unwrap();
    }
}
