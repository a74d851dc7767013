use serde_json::Value;

/// Print just the headline figure from the output.
///
/// Heuristic: well-known result fields in priority order, then the first
/// field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "annual_rate",
        "rate",
        "net_proceeds",
        "credit_added",
        "slack",
        "peak_balance",
        "guarantee_value",
        "suggested_installment",
    ];

    if let Value::Object(map) = result_obj {
        // Nested rate solution: surface its annual rate directly.
        if let Some(Value::Object(rate)) = map.get("rate") {
            if let Some(annual) = rate.get("annual_rate") {
                println!("{}", format_minimal(annual));
                return;
            }
        }

        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
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
