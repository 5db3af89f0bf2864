use hurdle_core::MetricField;
use serde::Serialize;
use std::io::Write;

use crate::errors::Result;
use crate::output::ProcessingOutput;

/// One line of the metric table export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub metric: String,
    pub value: f64,
    pub unit: &'static str,
    pub estimated: bool,
}

pub fn metric_rows(output: &ProcessingOutput) -> Vec<MetricRow> {
    let result = &output.result;
    let row = |field: MetricField, value: f64, unit: &'static str| MetricRow {
        metric: field.to_string(),
        value,
        unit,
        estimated: output.estimated_fields.contains(&field),
    };

    let mut rows = vec![
        row(MetricField::FlightTime, result.flight_time_sec, "s"),
        row(MetricField::TakeoffDistance, result.takeoff_distance_m, "m"),
        row(MetricField::LandingDistance, result.landing_distance_m, "m"),
        row(MetricField::TakeoffContact, result.takeoff_contact_sec, "s"),
        row(MetricField::LandingContact, result.landing_contact_sec, "s"),
        row(MetricField::Clearance, result.clearance_cm, "cm"),
        MetricRow {
            metric: "confidence".to_string(),
            value: result.confidence,
            unit: "",
            estimated: false,
        },
    ];
    if let Some(score) = result.technical_score {
        rows.push(MetricRow {
            metric: "technical_score".to_string(),
            value: score,
            unit: "points",
            estimated: output.origin != hurdle_core::ResultOrigin::Measured,
        });
    }
    rows
}

/// Write the metric table as CSV with a header row
pub fn write_metrics_csv<W: Write>(writer: W, output: &ProcessingOutput) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in metric_rows(output) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
