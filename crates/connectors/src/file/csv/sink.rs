use crate::{
    error::SinkError,
    sink::{FrameSink, check_columns},
};
use csv::{Writer, WriterBuilder};
use model::records::frame::Frame;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Writes frames to a delimited text file, replacing any previous content.
///
/// The header is written with the first frame of the execution only, even when
/// that frame has no rows.
pub struct DelimitedSink {
    path: PathBuf,
    writer: Option<Writer<File>>,
    columns: Option<Vec<String>>,
    rows: usize,
}

impl DelimitedSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Self::with_delimiter(path, b',')
    }

    pub fn with_delimiter(path: impl AsRef<Path>, delimiter: u8) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let writer = WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(file);

        Ok(DelimitedSink {
            path,
            writer: Some(writer),
            columns: None,
            rows: 0,
        })
    }

    /// Opens a sink over a fresh `*.csv` file in the system temp directory.
    ///
    /// The file outlives the sink.
    pub fn temporary() -> Result<Self, SinkError> {
        let file = tempfile::Builder::new()
            .prefix("soql-export-")
            .suffix(".csv")
            .tempfile()?;
        let (_, path) = file.keep().map_err(|e| SinkError::Io(e.error))?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for DelimitedSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<usize, SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Finished)?;

        match &self.columns {
            Some(columns) => check_columns(columns, frame)?,
            None => {
                writer.write_record(&frame.columns)?;
                self.columns = Some(frame.columns.clone());
            }
        }

        for row in &frame.rows {
            writer.write_record(row.fields())?;
        }
        writer.flush()?;

        self.rows += frame.len();
        debug!(
            path = %self.path.display(),
            page = frame.page_index,
            rows = frame.len(),
            "Appended frame"
        );
        Ok(frame.len())
    }

    fn rows_written(&self) -> usize {
        self.rows
    }

    fn finish(&mut self) -> Result<usize, SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(self.rows)
    }
}
