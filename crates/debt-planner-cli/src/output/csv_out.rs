use serde_json::{Map, Value};
use std::io;

type CsvWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Schedules become one row per debt-month (with a `debt_id` column when
/// several debts are present); a plan without schedules falls back to its
/// monthly projection, then to any array of records, then to field/value
/// pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => write_result(&mut wtr, map),
        Value::Array(arr) => write_records(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result(wtr: &mut CsvWriter<'_>, map: &Map<String, Value>) {
    if let Some(Value::Array(schedule)) = map.get("schedule") {
        write_records(wtr, schedule);
        return;
    }

    // Plans and batch schedules: flatten every debt's schedule
    for key in ["plans", "schedules"] {
        if let Some(Value::Array(items)) = map.get(key) {
            write_debt_schedules(wtr, items);
            return;
        }
    }

    if let Some(Value::Array(monthly)) = map
        .get("projection")
        .and_then(|p| p.get("monthly"))
    {
        write_records(wtr, monthly);
        return;
    }

    for key in ["results", "updates", "suggestions"] {
        if let Some(Value::Array(items)) = map.get(key) {
            if !items.is_empty() {
                write_records(wtr, items);
                return;
            }
        }
    }

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_debt_schedules(wtr: &mut CsvWriter<'_>, items: &[Value]) {
    let mut headers: Option<Vec<String>> = None;
    for item in items {
        let debt_id = item.get("debt_id").and_then(Value::as_str).unwrap_or_default();
        let Some(Value::Array(schedule)) = item.get("schedule") else {
            continue;
        };
        for row in schedule {
            let Value::Object(row) = row else { continue };
            let cols = headers.get_or_insert_with(|| {
                let cols = schedule_columns(row);
                let mut header = vec!["debt_id".to_string()];
                header.extend(cols.iter().cloned());
                let _ = wtr.write_record(&header);
                cols
            });
            let mut record = vec![debt_id.to_string()];
            record.extend(cols.iter().map(|c| row.get(c).map(format_csv_value).unwrap_or_default()));
            let _ = wtr.write_record(&record);
        }
    }
}

/// `extra_payment` is skipped in JSON when absent, so add the column.
fn schedule_columns(row: &Map<String, Value>) -> Vec<String> {
    let mut cols: Vec<String> = row.keys().cloned().collect();
    if !cols.iter().any(|c| c == "extra_payment") {
        cols.push("extra_payment".to_string());
    }
    cols
}

fn write_records(wtr: &mut CsvWriter<'_>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([format_csv_value(item)]);
        }
        return;
    };

    let headers = if first.contains_key("principal") {
        schedule_columns(first)
    } else {
        first.keys().cloned().collect()
    };
    let _ = wtr.write_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
