//! Typed parsing of raw records.

use chrono::{NaiveDate, NaiveDateTime};
use tankgauge_gauging::{
    CalibrationPoint, CalibrationUpsert, OperationType, TankUpsert, Trim, VesselUpsert,
};

use crate::error::RecordError;
use crate::model::{ImportRecord, MeasurementLine, ParsedRecord, RawRecord, RecordTag};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

pub fn parse_record(raw: &RawRecord) -> Result<ParsedRecord, RecordError> {
    let fields = Fields::split(raw)?;
    let record = match raw.tag {
        RecordTag::Balsa => ImportRecord::Vessel(parse_vessel(&fields)?),
        RecordTag::Tanque => ImportRecord::Tank(parse_tank(&fields)?),
        RecordTag::Calibracao => ImportRecord::Calibration(parse_calibration(&fields)?),
        RecordTag::Medicao => ImportRecord::Measurement(parse_measurement(&fields)?),
    };
    Ok(ParsedRecord { line: raw.line, record })
}

// `BALSA; externalId; name; executor; issueDate; expiryDate; certificate; notes...`
fn parse_vessel(f: &Fields) -> Result<VesselUpsert, RecordError> {
    let notes: Vec<&str> = f.values.iter().skip(6).map(String::as_str).filter(|s| !s.is_empty()).collect();
    Ok(VesselUpsert {
        external_id: f.required(0, "externalId")?.to_string(),
        name: f.required(1, "name")?.to_string(),
        executor: f.optional(2).map(str::to_string),
        issue_date: f.optional(3).map(|v| f.date(v, "issueDate")).transpose()?,
        expiry_date: f.optional(4).map(|v| f.date(v, "expiryDate")).transpose()?,
        certificate_number: f.optional(5).map(str::to_string),
        notes: if notes.is_empty() { None } else { Some(notes.join("; ")) },
    })
}

// `TANQUE; balsaExternalId; tankExternalId; tankName; maxCalibratedHeight; maxVolume`
fn parse_tank(f: &Fields) -> Result<TankUpsert, RecordError> {
    Ok(TankUpsert {
        vessel_external_id: f.required(0, "balsaExternalId")?.to_string(),
        tank_external_id: f.required(1, "tankExternalId")?.to_string(),
        tank_name: f.optional(2).map(str::to_string),
        max_calibrated_height: f.optional(3).map(|v| f.decimal(v, "maxCalibratedHeight")).transpose()?,
        max_volume: f.optional(4).map(|v| f.decimal(v, "maxVolume")).transpose()?,
    })
}

// `CALIBRACAO; tankExternalId; trim; height; volume`
fn parse_calibration(f: &Fields) -> Result<CalibrationUpsert, RecordError> {
    let tank_external_id = f.required(0, "tankExternalId")?.to_string();
    let trim = f.trim(f.required(1, "trim")?)?;
    let height = f.decimal(f.required(2, "height")?, "height")?;
    let volume = f.decimal(f.required(3, "volume")?, "volume")?;
    Ok(CalibrationUpsert {
        tank_external_id,
        point: CalibrationPoint { trim, height, volume },
    })
}

// `MEDICAO; balsa; tank; dateTime; opType; trim; height; volume; product; origin; destination; operator`
fn parse_measurement(f: &Fields) -> Result<MeasurementLine, RecordError> {
    Ok(MeasurementLine {
        vessel_external_id: f.required(0, "balsaExternalId")?.to_string(),
        tank_external_id: f.required(1, "tankExternalId")?.to_string(),
        timestamp: f.datetime(f.required(2, "dateTime")?)?,
        operation: OperationType::from_label(f.required(3, "opType")?),
        trim: f.trim(f.required(4, "trim")?)?,
        height: f.decimal(f.required(5, "height")?, "height")?,
        volume: f.optional(6).map(|v| f.decimal(v, "volume")).transpose()?,
        product: f.optional(7).unwrap_or_default().to_string(),
        origin: f.optional(8).unwrap_or_default().to_string(),
        destination: f.optional(9).unwrap_or_default().to_string(),
        operator: f.optional(10).unwrap_or_default().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

struct Fields {
    line: usize,
    tag: RecordTag,
    values: Vec<String>,
}

impl Fields {
    /// `;`-separated, trimmed; double quotes protect embedded separators.
    fn split(raw: &RawRecord) -> Result<Self, RecordError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(raw.body.as_bytes());

        let values = match reader.records().next() {
            Some(Ok(record)) => record.iter().map(str::to_string).collect(),
            Some(Err(e)) => {
                return Err(RecordError::validation(raw.line, raw.tag, format!("cannot split fields: {e}")));
            }
            None => Vec::new(),
        };

        Ok(Self { line: raw.line, tag: raw.tag, values })
    }

    fn optional(&self, idx: usize) -> Option<&str> {
        self.values
            .get(idx)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn required(&self, idx: usize, name: &str) -> Result<&str, RecordError> {
        self.optional(idx)
            .ok_or_else(|| self.invalid(format!("missing required field '{name}'")))
    }

    fn decimal(&self, value: &str, name: &str) -> Result<f64, RecordError> {
        parse_decimal(value).ok_or_else(|| self.invalid(format!("{name} '{value}' is not a number")))
    }

    fn trim(&self, value: &str) -> Result<Trim, RecordError> {
        value.parse::<Trim>().map_err(|e| self.invalid(e))
    }

    fn date(&self, value: &str, name: &str) -> Result<NaiveDate, RecordError> {
        parse_date(value).ok_or_else(|| self.invalid(format!("{name} '{value}' is not a date")))
    }

    fn datetime(&self, value: &str) -> Result<NaiveDateTime, RecordError> {
        parse_datetime(value).ok_or_else(|| self.invalid(format!("dateTime '{value}' is not a date/time")))
    }

    fn invalid(&self, message: impl Into<String>) -> RecordError {
        RecordError::validation(self.line, self.tag, message)
    }
}

/// Accepts `1234.5`, `1234,5` and `1.234,5`.
pub fn parse_decimal(value: &str) -> Option<f64> {
    let v = value.trim();
    let normalized = if v.contains(',') {
        v.replace('.', "").replace(',', ".")
    } else {
        v.to_string()
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
}

/// Date and time in ISO or `DD/MM/YYYY` order; a bare date means midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let v = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(v, fmt).ok())
        .or_else(|| parse_date(v).and_then(|d| d.and_hms_opt(0, 0, 0)))
}
