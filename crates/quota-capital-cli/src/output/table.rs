use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables.
///
/// Scalar fields of the result become a Field/Value table; array-of-object
/// fields (the schedule, cash flows with row objects) are printed as their
/// own table below it, and alerts last.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_alerts(map.get("warnings"));
                if let Some(Value::String(meth)) = map.get("methodology") {
                    println!("\nMethodology: {}", meth);
                }
            } else {
                print_result(value);
                print_alerts(map.get("alerts"));
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    let Value::Object(map) = result else {
        println!("{}", result);
        return;
    };

    // Scalars first, sub-tables after.
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sub_tables: Vec<(&str, &Vec<Value>)> = Vec::new();

    for (key, val) in map {
        if key == "alerts" {
            continue; // printed separately
        }
        match val {
            Value::Array(arr) if arr.first().is_some_and(|v| v.is_object()) => {
                sub_tables.push((key, arr));
            }
            Value::Object(inner) => {
                for (inner_key, inner_val) in inner {
                    builder.push_record([
                        format!("{key}.{inner_key}"),
                        format_value(inner_val),
                    ]);
                }
            }
            other => {
                builder.push_record([key.to_string(), format_value(other)]);
            }
        }
    }

    println!("{}", Table::from(builder));

    for (name, rows) in sub_tables {
        println!("\n{}:", name);
        print_rows(rows);
    }

    if let Some(alerts) = map.get("alerts") {
        print_alerts(Some(alerts));
    }
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn print_alerts(alerts: Option<&Value>) {
    if let Some(Value::Array(alerts)) = alerts {
        if !alerts.is_empty() {
            println!("\nAlerts:");
            for alert in alerts {
                if let Value::String(s) = alert {
                    println!("  - {}", s);
                }
            }
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
