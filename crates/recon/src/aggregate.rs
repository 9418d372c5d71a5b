use std::collections::BTreeMap;

use crate::model::{MeasurementGroup, MeasurementKey, MeasurementLine, PendingReading};

/// Group `MEDICAO` lines by (vessel, timestamp, operation, operator), summing
/// the explicit volumes and keeping each tank reading in file order.
///
/// Product, origin and destination come from the first line of the group.
pub fn group_measurements(lines: &[(usize, MeasurementLine)]) -> Vec<MeasurementGroup> {
    let mut groups: BTreeMap<MeasurementKey, MeasurementGroup> = BTreeMap::new();

    for (line, m) in lines {
        let key = MeasurementKey {
            vessel_external_id: m.vessel_external_id.clone(),
            timestamp: m.timestamp,
            operation: m.operation.to_string(),
            operator: m.operator.clone(),
        };
        let group = groups.entry(key.clone()).or_insert_with(|| MeasurementGroup {
            key,
            first_line: *line,
            operation: m.operation.clone(),
            product: m.product.clone(),
            origin: m.origin.clone(),
            destination: m.destination.clone(),
            total_volume: 0.0,
            readings: Vec::new(),
        });
        group.total_volume += m.volume.unwrap_or(0.0);
        group.readings.push(PendingReading {
            line: *line,
            tank_external_id: m.tank_external_id.clone(),
            trim: m.trim,
            height: m.height,
            volume: m.volume,
        });
    }

    let mut out: Vec<MeasurementGroup> = groups.into_values().collect();
    out.sort_by_key(|g| g.first_line);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tankgauge_gauging::{OperationType, Trim};

    fn line(vessel: &str, tank: &str, ts: &str, op: &str, operator: &str, volume: Option<f64>) -> MeasurementLine {
        MeasurementLine {
            vessel_external_id: vessel.into(),
            tank_external_id: tank.into(),
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            operation: OperationType::from_label(op),
            trim: Trim(0),
            height: 50.0,
            volume,
            product: "EHC".into(),
            origin: "Santarém".into(),
            destination: "Belém".into(),
            operator: operator.into(),
        }
    }

    #[test]
    fn same_key_is_one_group() {
        let lines = vec![
            (1, line("B1", "T1", "2025-01-03 08:00", "carga", "Ana", Some(500.0))),
            (2, line("B1", "T2", "2025-01-03 08:00", "carga", "Ana", Some(700.0))),
        ];
        let groups = group_measurements(&lines);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_volume, 1200.0);
        assert_eq!(groups[0].readings.len(), 2);
        assert_eq!(groups[0].readings[1].tank_external_id, "T2");
    }

    #[test]
    fn any_key_difference_splits() {
        let lines = vec![
            (1, line("B1", "T1", "2025-01-03 08:00", "carga", "Ana", Some(1.0))),
            (2, line("B1", "T1", "2025-01-03 09:00", "carga", "Ana", Some(1.0))),
            (3, line("B1", "T1", "2025-01-03 08:00", "descarga", "Ana", Some(1.0))),
            (4, line("B1", "T1", "2025-01-03 08:00", "carga", "Rui", Some(1.0))),
            (5, line("B2", "T1", "2025-01-03 08:00", "carga", "Ana", Some(1.0))),
        ];
        assert_eq!(group_measurements(&lines).len(), 5);
    }

    #[test]
    fn groups_follow_file_order_and_blank_volume_counts_zero() {
        let lines = vec![
            (4, line("B2", "T9", "2025-01-01 08:00", "carga", "Ana", None)),
            (9, line("B1", "T1", "2025-01-05 08:00", "carga", "Ana", Some(10.0))),
        ];
        let groups = group_measurements(&lines);
        assert_eq!(groups[0].key.vessel_external_id, "B2");
        assert_eq!(groups[0].total_volume, 0.0);
        assert_eq!(groups[1].first_line, 9);
    }
}
