//! Pure sufficiency predicates over JSON context payloads.
//!
//! These never touch the network or an LLM: they decide whether a context
//! payload already carries enough signal to skip resolution entirely.
//! Presence is strict — empty strings (after trimming), empty arrays, empty
//! objects, and nulls all count as absent.

use serde_json::{Map, Value};

/// Coerce arbitrary context into an object.
///
/// Strings are given one chance to parse as JSON; everything that is not an
/// object after that is treated as empty.
#[must_use]
pub fn ensure_object(context: &Value) -> Map<String, Value> {
    match context {
        Value::Object(map) => map.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => true,
    }
}

/// Company context is sufficient when it names the company, carries a
/// non-empty overview, and lists at least one use case or capability.
#[must_use]
pub fn is_company_context_sufficient(context: &Value) -> bool {
    let ctx = ensure_object(context);

    let name_ok = is_present(ctx.get("company_name")) || is_present(ctx.get("target_company_name"));
    let overview_ok = is_present(ctx.get("company_overview"));
    let signals_ok = is_present(ctx.get("use_cases")) || is_present(ctx.get("capabilities"));

    name_ok && overview_ok && signals_ok
}

/// Target account context is sufficient when any firmographic signal is
/// present: industry (string or non-empty list), employees, or revenue, with
/// the latter two also looked up under a nested `company_size` object.
///
/// An array context (a firmographics list) is merged into one object,
/// last write wins, before the check.
#[must_use]
pub fn is_target_account_context_sufficient(context: &Value) -> bool {
    let ctx = match context {
        Value::Array(items) => {
            let mut merged = Map::new();
            for item in items {
                if let Value::Object(map) = item {
                    for (k, v) in map {
                        merged.insert(k.clone(), v.clone());
                    }
                }
            }
            merged
        }
        other => ensure_object(other),
    };

    let industry_ok = is_present(ctx.get("industry"));

    let company_size = ctx.get("company_size").and_then(Value::as_object);
    let employees_ok = is_present(ctx.get("employees"))
        || company_size.is_some_and(|cs| is_present(cs.get("employees")));
    let revenue_ok = is_present(ctx.get("revenue"))
        || company_size.is_some_and(|cs| is_present(cs.get("revenue")));

    industry_ok || employees_ok || revenue_ok
}

/// Persona context needs both company and target-account sufficiency against
/// the same payload.
#[must_use]
pub fn is_target_persona_context_sufficient(context: &Value) -> bool {
    is_company_context_sufficient(context) && is_target_account_context_sufficient(context)
}
