use propensity_core::Frame;

/// Drop every column whose null ratio on the training table exceeds
/// `max_null_ratio`, removing the same columns from the test table so the
/// two stay aligned. Returns the dropped column names.
pub fn drop_sparse_columns(
    train: &mut Frame,
    test: &mut Frame,
    max_null_ratio: f64,
) -> Vec<String> {
    let dropped: Vec<String> = train
        .columns()
        .iter()
        .filter(|c| c.null_ratio() > max_null_ratio)
        .map(|c| c.name().to_string())
        .collect();

    train.drop_columns(&dropped);
    test.drop_columns(&dropped);
    dropped
}
