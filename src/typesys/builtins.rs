//! Built-in logical types, their default relationships, and the default
//! inference functions.
//!
//! The predicates here are plain functions over the sample capability
//! interface; threshold- and pattern-driven ones read [`Config`] at call
//! time, never at registration time.

use std::sync::Arc;

use crate::config::Config;
use crate::sample::ValueSample;
use crate::value::{parse_datetime, Value};

use super::logical_type::{LogicalType, StorageKind};
use super::registry::{InferenceFn, TypeSystem};

/// Name of the fallback type inferred when nothing matches.
pub const UNKNOWN: &str = "Unknown";

/// Standard tag carried by numeric built-ins.
pub const NUMERIC_TAG: &str = "numeric";

/// Standard tag carried by categorical built-ins.
pub const CATEGORY_TAG: &str = "category";

/// Strings with a mean length above this are natural language rather than
/// categories.
const NATURAL_LANGUAGE_MEAN_LENGTH: f64 = 10.0;

fn predicate(f: fn(&dyn ValueSample, &Config) -> bool) -> InferenceFn {
    Arc::new(f)
}

fn register(
    ts: &mut TypeSystem,
    ltype: LogicalType,
    inference: Option<InferenceFn>,
    parent: Option<&str>,
) {
    if let Err(err) = ts.add_type(ltype, inference, parent) {
        unreachable!("built-in type registration failed: {err}");
    }
}

/// Build the built-in baseline registry.
///
/// Registration order doubles as the inference tie-break order, so the
/// ordering below is part of the contract: datetimes beat categoricals beat
/// natural language for samples matching more than one root.
pub(crate) fn default_type_system() -> TypeSystem {
    let mut ts = TypeSystem::empty();

    register(&mut ts, LogicalType::new(UNKNOWN, StorageKind::Utf8), None, None);
    register(
        &mut ts,
        LogicalType::new("Boolean", StorageKind::Bool).with_backup(StorageKind::Object),
        Some(predicate(boolean_inference)),
        None,
    );
    register(
        &mut ts,
        LogicalType::new("Double", StorageKind::Float64).with_standard_tags([NUMERIC_TAG]),
        Some(predicate(double_inference)),
        None,
    );
    register(
        &mut ts,
        LogicalType::new("Integer", StorageKind::Int64).with_standard_tags([NUMERIC_TAG]),
        Some(predicate(integer_inference)),
        Some("Double"),
    );
    register(
        &mut ts,
        LogicalType::new("Datetime", StorageKind::Datetime),
        Some(predicate(datetime_inference)),
        None,
    );
    register(
        &mut ts,
        LogicalType::new("Timedelta", StorageKind::Timedelta),
        Some(predicate(timedelta_inference)),
        None,
    );
    register(
        &mut ts,
        LogicalType::new("Categorical", StorageKind::Categorical)
            .with_standard_tags([CATEGORY_TAG]),
        Some(predicate(categorical_inference)),
        None,
    );
    register(
        &mut ts,
        LogicalType::new("Ordinal", StorageKind::Categorical).with_standard_tags([CATEGORY_TAG]),
        None,
        Some("Categorical"),
    );
    register(
        &mut ts,
        LogicalType::new("CountryCode", StorageKind::Categorical)
            .with_standard_tags([CATEGORY_TAG]),
        None,
        Some("Categorical"),
    );
    register(
        &mut ts,
        LogicalType::new("PostalCode", StorageKind::Categorical)
            .with_standard_tags([CATEGORY_TAG]),
        None,
        Some("Categorical"),
    );
    register(
        &mut ts,
        LogicalType::new("NaturalLanguage", StorageKind::Utf8),
        Some(predicate(natural_language_inference)),
        None,
    );
    register(
        &mut ts,
        LogicalType::new("EmailAddress", StorageKind::Utf8),
        Some(predicate(email_inference)),
        Some("NaturalLanguage"),
    );
    register(
        &mut ts,
        LogicalType::new("Url", StorageKind::Utf8),
        Some(predicate(url_inference)),
        Some("NaturalLanguage"),
    );
    register(
        &mut ts,
        LogicalType::new("IpAddress", StorageKind::Utf8),
        Some(predicate(ip_inference)),
        Some("NaturalLanguage"),
    );

    ts
}

fn is_string_storage(storage: StorageKind) -> bool {
    matches!(
        storage,
        StorageKind::Utf8 | StorageKind::Categorical | StorageKind::Object
    )
}

fn all_values(sample: &dyn ValueSample, pred: impl Fn(&Value) -> bool) -> bool {
    sample.non_null().all(|v| pred(v))
}

fn boolean_inference(sample: &dyn ValueSample, _config: &Config) -> bool {
    sample.storage() == StorageKind::Bool || all_values(sample, |v| matches!(v, Value::Bool(_)))
}

fn integer_inference(sample: &dyn ValueSample, _config: &Config) -> bool {
    match sample.storage() {
        StorageKind::Int64 => true,
        StorageKind::Object => all_values(sample, |v| matches!(v, Value::Int(_))),
        _ => false,
    }
}

fn double_inference(sample: &dyn ValueSample, _config: &Config) -> bool {
    match sample.storage() {
        StorageKind::Int64 | StorageKind::Float64 => true,
        StorageKind::Object => {
            all_values(sample, |v| matches!(v, Value::Int(_) | Value::Float(_)))
        }
        _ => false,
    }
}

fn datetime_inference(sample: &dyn ValueSample, _config: &Config) -> bool {
    if sample.storage() == StorageKind::Datetime
        || all_values(sample, |v| matches!(v, Value::Datetime(_)))
    {
        return true;
    }
    if !is_string_storage(sample.storage()) {
        return false;
    }
    // A column castable to numeric is not a datetime.
    let strings_only = all_values(sample, |v| v.as_str().is_some());
    if !strings_only
        || sample
            .non_null()
            .any(|v| v.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok()))
    {
        return false;
    }
    all_values(sample, |v| {
        v.as_str().is_some_and(|s| parse_datetime(s).is_some())
    })
}

fn timedelta_inference(sample: &dyn ValueSample, _config: &Config) -> bool {
    sample.storage() == StorageKind::Timedelta
        || all_values(sample, |v| matches!(v, Value::Timedelta(_)))
}

/// A column is categorical when a sufficiently small set of unique values
/// accounts for all of it. String columns compare against the categorical
/// threshold; numeric columns only qualify when the separate numeric
/// threshold is configured.
fn categorical_inference(sample: &dyn ValueSample, config: &Config) -> bool {
    let non_null = sample.non_null_count();
    if non_null == 0 {
        return false;
    }
    let ratio = sample.unique_count() as f64 / non_null as f64;
    match sample.storage() {
        StorageKind::Categorical => true,
        StorageKind::Utf8 | StorageKind::Object => {
            all_values(sample, |v| v.as_str().is_some())
                && ratio <= config.categorical_threshold()
        }
        StorageKind::Int64 | StorageKind::Float64 => config
            .numeric_categorical_threshold()
            .is_some_and(|threshold| ratio <= threshold),
        _ => false,
    }
}

fn natural_language_inference(sample: &dyn ValueSample, _config: &Config) -> bool {
    if !matches!(sample.storage(), StorageKind::Utf8 | StorageKind::Object) {
        return false;
    }
    let mut total = 0usize;
    let mut count = 0usize;
    for value in sample.non_null() {
        match value.as_str() {
            Some(s) => {
                total += s.chars().count();
                count += 1;
            }
            None => return false,
        }
    }
    count > 0 && total as f64 / count as f64 > NATURAL_LANGUAGE_MEAN_LENGTH
}

fn matches_pattern(sample: &dyn ValueSample, pattern: &regex::Regex) -> bool {
    is_string_storage(sample.storage())
        && !sample.is_empty()
        && all_values(sample, |v| {
            v.as_str().is_some_and(|s| pattern.is_match(s))
        })
}

fn email_inference(sample: &dyn ValueSample, config: &Config) -> bool {
    matches_pattern(sample, config.email_regex())
}

fn url_inference(sample: &dyn ValueSample, config: &Config) -> bool {
    matches_pattern(sample, config.url_regex())
}

fn ip_inference(sample: &dyn ValueSample, config: &Config) -> bool {
    matches_pattern(sample, config.ip_regex())
}
