use serde_json::{Map, Value};
use std::io;

/// Curve arrays emitted, in order, when the value is a curve result.
pub const CURVE_KEYS: [&str; 4] = [
    "expiration_curve",
    "theoretical_curve",
    "expired_expiration_curve",
    "expired_theoretical_curve",
];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) if is_curve_output(map) => {
            write_curves_csv(&mut wtr, map);
        }
        Value::Object(map) => {
            let fields = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in fields {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

pub fn is_curve_output(map: &Map<String, Value>) -> bool {
    map.contains_key("expiration_curve") && map.contains_key("theoretical_curve")
}

/// Long format: one row per point, tagged with the curve it belongs to.
fn write_curves_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["curve", "price", "pnl"]);
    for key in CURVE_KEYS {
        let Some(Value::Array(points)) = map.get(key) else {
            continue;
        };
        for point in points {
            let price = point.get("price").map(format_csv_value).unwrap_or_default();
            let pnl = point.get("pnl").map(format_csv_value).unwrap_or_default();
            let _ = wtr.write_record([key, price.as_str(), pnl.as_str()]);
        }
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
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
