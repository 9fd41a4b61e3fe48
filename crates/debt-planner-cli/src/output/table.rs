use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables: scalar fields first, then one table per nested
/// array of records (schedules, monthly projection, comparison results).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_section(None, map);
            }
        }
        Value::Array(arr) => print_array_table(None, arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_section(None, res_map),
        Value::Array(arr) => print_array_table(None, arr),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalars of `map` as a Field/Value table, then nested objects and arrays.
fn print_section(title: Option<&str>, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    for (key, val) in map {
        if is_record_array(val) || val.is_object() {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
        scalars += 1;
    }
    if scalars > 0 {
        if let Some(title) = title {
            println!("\n{}:", title);
        }
        println!("{}", Table::from(builder));
    }

    for (key, val) in map {
        let path = join_path(title, key);
        match val {
            Value::Object(inner) => print_section(Some(&path), inner),
            Value::Array(arr) if is_record_array(val) => print_array_table(Some(&path), arr),
            _ => {}
        }
    }
}

fn print_array_table(title: Option<&str>, arr: &[Value]) {
    if let Some(title) = title {
        println!("\n{}:", title);
    }
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));

    // Nested record arrays, e.g. each plan's schedule
    for (i, item) in arr.iter().enumerate() {
        let Value::Object(map) = item else { continue };
        let label = row_label(map).unwrap_or_else(|| i.to_string());
        for (key, val) in map {
            if let Value::Array(inner) = val {
                if is_record_array(val) {
                    let path = format!("{}[{}].{}", title.unwrap_or("items"), label, key);
                    print_array_table(Some(&path), inner);
                }
            }
        }
    }
}

fn is_record_array(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.first().is_some_and(Value::is_object))
}

/// Identify a row by its debt or milestone id when it has one.
fn row_label(map: &Map<String, Value>) -> Option<String> {
    ["debt_id", "milestone_id", "id", "strategy"]
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn join_path(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    }
}

/// Cell text inside an array table; nested record arrays are summarised.
fn format_cell(value: &Value) -> String {
    match value {
        Value::Array(arr) if is_record_array(value) => format!("[{} rows]", arr.len()),
        other => format_value(other),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
