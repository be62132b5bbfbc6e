use chrono::{DateTime, Local};
use std::fs::File;
use std::io;
use std::path::PathBuf;

use crate::error::InvestError;
use crate::history::CandleExport;
use crate::types::HistoricCandle;
use crate::util::timestamp_to_api;

/// Writes candles as `;`-separated rows: `instrument;time;open;close;high;low;volume`.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File name used when the caller gives none, e.g. `candles 14:03:27`
    pub fn default_name(now: DateTime<Local>) -> String {
        format!("candles {}", now.format("%H:%M:%S"))
    }

    pub fn write<W: io::Write>(
        writer: W,
        candles: &[HistoricCandle],
        instrument_id: &str
    ) -> Result<(), InvestError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_writer(writer);

        for candle in candles {
            writer.write_record([
                instrument_id.to_string(),
                timestamp_to_api(candle.time),
                candle.open.to_f64().to_string(),
                candle.close.to_f64().to_string(),
                candle.high.to_f64().to_string(),
                candle.low.to_f64().to_string(),
                candle.volume.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl CandleExport for CsvExporter {
    fn export(
        &self,
        candles: &[HistoricCandle],
        instrument_id: &str,
        name: Option<&str>
    ) -> Result<PathBuf, InvestError> {
        let name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => Self::default_name(Local::now())
        };
        let path = self.dir.join(format!("{}.csv", name));
        let file = File::create(&path)?;
        Self::write(file, candles, instrument_id)?;
        Ok(path)
    }
}
