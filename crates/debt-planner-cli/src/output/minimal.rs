use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in priority order, first in the result
/// and then in its `projection`, falling back to the first result field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "months_to_payoff",
        "total_months",
        "months_to_last_payoff",
        "recommended",
        "net_savings",
        "ratio",
        "achieved_count",
    ];

    if let Value::Object(map) = result_obj {
        let scopes = [Some(result_obj), map.get("projection")];
        for key in &priority_keys {
            for scope in scopes.iter().flatten() {
                if let Some(val) = scope.get(*key) {
                    if !val.is_null() {
                        println!("{}", format_minimal(val));
                        return;
                    }
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
