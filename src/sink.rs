use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use log::{debug, info};

use crate::error::SinkError;
use crate::record::{TagFormat, WorkRecord, CSV_HEADER};

/// Durable destination for each page's records.
pub trait RecordSink {
    /// Append one page worth of records. The header goes out with the first call
    /// of a run, even when `records` is empty.
    fn append(&mut self, records: &[WorkRecord]) -> Result<(), SinkError>;

    /// Called once after the last page. Writes the header if no page was ever
    /// appended, so a run without records still leaves a readable file.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Keep existing rows; a non-empty file is assumed to carry its header.
    #[default]
    Append,
    /// Start from an empty file.
    Overwrite,
}

/// CSV file sink. Each append is flushed and synced before returning.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    tag_format: TagFormat,
    header_pending: bool,
}

impl CsvSink {
    pub fn open<P: AsRef<Path>>(
        path: P,
        mode: OutputMode,
        tag_format: TagFormat,
    ) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| SinkError::Open {
            path: path.display().to_string(),
            source,
        };

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OutputMode::Append => options.append(true),
            OutputMode::Overwrite => options.write(true).truncate(true),
        };
        let file = options.open(&path).map_err(open_err)?;
        let existing = file.metadata().map_err(open_err)?.len();

        let header_pending = mode == OutputMode::Overwrite || existing == 0;
        if !header_pending {
            info!("Appending to existing {} ({} bytes); header already present", path.display(), existing);
        }

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        Ok(CsvSink {
            path,
            writer,
            tag_format,
            header_pending,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_pending_header(&mut self) -> Result<(), SinkError> {
        if self.header_pending {
            self.writer.write_record(CSV_HEADER)?;
            self.header_pending = false;
            debug!("Wrote header to {}", self.path.display());
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }
}

impl RecordSink for CsvSink {
    fn append(&mut self, records: &[WorkRecord]) -> Result<(), SinkError> {
        self.write_pending_header()?;
        for record in records {
            self.writer.write_record(record.to_row(self.tag_format)?)?;
        }
        self.sync()
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if !self.header_pending {
            return Ok(());
        }
        self.write_pending_header()?;
        self.sync()
    }
}
