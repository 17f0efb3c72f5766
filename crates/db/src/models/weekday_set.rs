//! Ordered set of ISO weekdays (1 = Monday .. 7 = Sunday).
//!
//! Used for a custom pact's `frequency_days` and a relay participant's
//! `relay_days`. Stored as a JSON array in a TEXT column.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Sqlite, Type, encode::IsNull, error::BoxDynError,
    sqlite::SqliteTypeInfo,
};
use tracing::warn;
use ts_rs::TS;
use utils::calendar::iso_weekday;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(Vec<u8>);

impl WeekdaySet {
    /// Build a set from ISO weekday numbers, sorted and de-duplicated.
    ///
    /// Numbers outside 1..=7 are kept but can never match a date.
    pub fn new(days: impl IntoIterator<Item = u8>) -> Self {
        let mut days: Vec<u8> = days.into_iter().collect();
        days.sort_unstable();
        days.dedup();
        Self(days)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn days(&self) -> &[u8] {
        &self.0
    }

    pub fn contains(&self, iso_day: u8) -> bool {
        self.0.binary_search(&iso_day).is_ok()
    }

    /// Whether the weekday of `date` is in the set.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(iso_weekday(date))
    }
}

impl From<Vec<u8>> for WeekdaySet {
    fn from(days: Vec<u8>) -> Self {
        Self::new(days)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.0
    }
}

impl FromIterator<u8> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Type<Sqlite> for WeekdaySet {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for WeekdaySet {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        let json = serde_json::to_string(&self.0)?;
        <String as Encode<'q, Sqlite>>::encode(json, buf)
    }
}

impl<'r> Decode<'r, Sqlite> for WeekdaySet {
    fn decode(value: <Sqlite as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
        // A malformed column degrades to "no weekdays" so one bad row cannot fail a whole scan.
        match serde_json::from_str::<Vec<u8>>(text) {
            Ok(days) => Ok(Self::new(days)),
            Err(e) => {
                warn!(value = %text, error = %e, "Ignoring malformed weekday set");
                Ok(Self::default())
            }
        }
    }
}
