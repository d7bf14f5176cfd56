//! Instants: a `DateTime` is identified by the point in time it denotes,
//! not by the offset it happens to be expressed in.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::canonical::{Canonical, ZeroValue};
use crate::errors::IdentityError;
use crate::filter::FieldFilter;
use crate::value::{Record, Value};

const RECORD: &str = "DateTime";

impl<Tz: TimeZone> Canonical for DateTime<Tz> {
    fn to_value(&self, _filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        Ok(Value::Record(Record {
            name: RECORD,
            fields: vec![
                ("secs", Value::Int(self.timestamp())),
                ("nanos", Value::Uint(u64::from(self.timestamp_subsec_nanos()))),
            ],
        }))
    }

    fn project(
        &self,
        method: &str,
        _filter: &dyn FieldFilter,
    ) -> Option<Result<Value, IdentityError>> {
        let utc = self.with_timezone(&Utc);
        let value = match method {
            "unix" => Value::Int(utc.timestamp()),
            "rfc3339" => Value::Str(utc.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            "date" => Value::Str(utc.date_naive().to_string()),
            _ => return None,
        };
        Some(Ok(value))
    }
}

impl<Tz: TimeZone> ZeroValue for DateTime<Tz> {
    fn zero_value() -> Value {
        Value::Record(Record::shape(RECORD))
    }
}
