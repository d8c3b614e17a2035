use crate::error::SinkError;
use model::records::frame::Frame;

/// Destination for the flattened frames of one query execution.
///
/// Frames arrive in page order. Implementations append; nothing written by an
/// earlier frame is rewritten by a later one.
pub trait FrameSink {
    /// Persists one frame and returns the number of rows it added.
    fn write_frame(&mut self, frame: &Frame) -> Result<usize, SinkError>;

    /// Rows written so far across every frame.
    fn rows_written(&self) -> usize;

    /// Flushes buffered output and returns the cumulative row count.
    fn finish(&mut self) -> Result<usize, SinkError>;
}

pub(crate) fn check_columns(expected: &[String], frame: &Frame) -> Result<(), SinkError> {
    if expected == frame.columns.as_slice() {
        Ok(())
    } else {
        Err(SinkError::ColumnMismatch {
            expected: expected.to_vec(),
            actual: frame.columns.clone(),
        })
    }
}
